use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::Value;

/// Pull the best-effort plain text body out of a Gmail `payload` object.
///
/// Gmail messages are often multipart; parts nest arbitrarily and a
/// `multipart/alternative` carries both a plain and an HTML rendition.
/// The walk is depth-first, preferring `text/plain` at each leaf and
/// falling back to stripped `text/html`. A message with no decodable
/// body yields an empty string.
pub fn extract_body(payload: &Value) -> String {
    let text = walk_part(payload);
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn walk_part(part: &Value) -> String {
    // If the part has its own parts, search them
    if let Some(parts) = part.get("parts").and_then(|p| p.as_array()) {
        for subpart in parts {
            let text = walk_part(subpart);
            if !text.is_empty() {
                return text;
            }
        }
        return String::new();
    }

    let mime_type = part.get("mimeType").and_then(|m| m.as_str()).unwrap_or("");
    let data = part
        .get("body")
        .and_then(|b| b.get("data"))
        .and_then(|d| d.as_str());

    match (mime_type, data) {
        ("text/plain", Some(data)) => decode_body_data(data).unwrap_or_default(),
        ("text/html", Some(data)) => decode_body_data(data)
            .map(|html| strip_html(&html))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Decode the URL-safe base64 Gmail uses for body data; padding is
/// inconsistent across messages, so both variants are tried
fn decode_body_data(data: &str) -> Option<String> {
    let bytes = URL_SAFE
        .decode(data)
        .or_else(|_| URL_SAFE_NO_PAD.decode(data))
        .ok()?;
    String::from_utf8(bytes).ok()
}

/// Strip HTML tags from a string, returning only the text content.
///
/// A small state machine rather than a full parser: block-level tags
/// (`br`, `p`, `div`, `li`, `tr`) become newlines, everything else is
/// dropped, and common entities are decoded.
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut tag_name = String::new();
    let mut in_entity = false;
    let mut entity_buf = String::new();

    for ch in html.chars() {
        if in_entity {
            if ch == ';' {
                out.push_str(&decode_entity(&entity_buf));
                entity_buf.clear();
                in_entity = false;
            } else if entity_buf.len() < 10 {
                entity_buf.push(ch);
            } else {
                // Too long to be a real entity, emit raw
                out.push('&');
                out.push_str(&entity_buf);
                out.push(ch);
                entity_buf.clear();
                in_entity = false;
            }
            continue;
        }

        if in_tag {
            if ch == '>' {
                let name = tag_name
                    .trim_end()
                    .trim_start_matches('/')
                    .trim_end_matches('/')
                    .to_ascii_lowercase();
                if matches!(name.as_str(), "br" | "p" | "div" | "li" | "tr") {
                    out.push('\n');
                }
                tag_name.clear();
                in_tag = false;
            } else if !ch.is_whitespace() && !tag_name.contains(' ') && tag_name.len() < 16 {
                tag_name.push(ch);
            } else if ch.is_whitespace() && !tag_name.is_empty() {
                // Tag name ends at the first attribute
                tag_name.push(' ');
            }
            continue;
        }

        match ch {
            '<' => {
                in_tag = true;
                tag_name.clear();
            }
            '&' => {
                in_entity = true;
                entity_buf.clear();
            }
            _ => out.push(ch),
        }
    }

    if in_entity {
        out.push('&');
        out.push_str(&entity_buf);
    }

    out
}

fn decode_entity(entity: &str) -> String {
    match entity {
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "quot" => "\"".to_string(),
        "apos" => "'".to_string(),
        "nbsp" => " ".to_string(),
        s if s.starts_with('#') => {
            let num = &s[1..];
            let codepoint = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X'))
            {
                u32::from_str_radix(hex, 16).ok()
            } else {
                num.parse::<u32>().ok()
            };
            codepoint
                .and_then(char::from_u32)
                .map(|c| c.to_string())
                .unwrap_or_else(|| format!("&{};", entity))
        }
        _ => format!("&{};", entity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "\nHello world\n");
        assert_eq!(strip_html("a &amp; b &lt; c"), "a & b < c");
        assert_eq!(strip_html("line<br>break"), "line\nbreak");
        assert_eq!(strip_html("&#65;&#x42;"), "AB");
        assert_eq!(strip_html("no markup at all"), "no markup at all");
        // Attributes are skipped with the tag
        assert_eq!(strip_html(r#"<a href="x">link</a>"#), "link");
        // Unknown entities pass through untouched
        assert_eq!(strip_html("a &bogus; b"), "a &bogus; b");
    }

    #[test]
    fn test_plain_text_part() {
        let data = URL_SAFE.encode("Fitters needed at Roy Hill");
        let payload = json!({
            "mimeType": "text/plain",
            "body": { "data": data }
        });
        assert_eq!(extract_body(&payload), "Fitters needed at Roy Hill");
    }

    #[test]
    fn test_prefers_plain_over_html() {
        let plain = URL_SAFE.encode("plain text");
        let html = URL_SAFE.encode("<p>html text</p>");
        let payload = json!({
            "mimeType": "multipart/alternative",
            "parts": [
                { "mimeType": "text/plain", "body": { "data": plain } },
                { "mimeType": "text/html", "body": { "data": html } }
            ]
        });
        assert_eq!(extract_body(&payload), "plain text");
    }

    #[test]
    fn test_nested_html_fallback() {
        let html = URL_SAFE.encode("<div>Shutdown crew<br>wanted</div>");
        let payload = json!({
            "mimeType": "multipart/mixed",
            "parts": [
                { "mimeType": "application/pdf", "body": {} },
                {
                    "mimeType": "multipart/alternative",
                    "parts": [
                        { "mimeType": "text/html", "body": { "data": html } }
                    ]
                }
            ]
        });
        assert_eq!(extract_body(&payload), "\nShutdown crew\nwanted\n");
    }

    #[test]
    fn test_missing_body_is_empty() {
        let payload = json!({ "mimeType": "text/plain", "body": {} });
        assert_eq!(extract_body(&payload), "");
    }

    #[test]
    fn test_unpadded_base64_decodes() {
        // 4-byte content encodes without padding either way
        let payload = json!({
            "mimeType": "text/plain",
            "body": { "data": "Zml0cw" }
        });
        assert_eq!(extract_body(&payload), "fits");
    }

    #[test]
    fn test_crlf_normalized() {
        let data = URL_SAFE.encode("one\r\ntwo\rthree");
        let payload = json!({
            "mimeType": "text/plain",
            "body": { "data": data }
        });
        assert_eq!(extract_body(&payload), "one\ntwo\nthree");
    }
}
