use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::Config;
use crate::error::{auth_error, ScoutResult};

/// Google OAuth2 token endpoint
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the recorded expiry to avoid using a token
/// that dies mid-request
const EXPIRY_SLACK_SECONDS: i64 = 60;

/// Google "authorized user" token blob, as written by the OAuth bootstrap
/// flow and consumed here on every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    /// Short-lived access token
    #[serde(alias = "access_token")]
    pub token: String,
    /// Long-lived refresh token
    pub refresh_token: String,
    /// OAuth client ID the token was issued to
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Access token expiry, if recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// Whether the access token needs a refresh before use.
    /// A blob without a recorded expiry is treated as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= now + Duration::seconds(EXPIRY_SLACK_SECONDS),
            None => true,
        }
    }
}

/// Where the token blob came from; refreshed file tokens are written back
enum TokenOrigin {
    Environment,
    File(PathBuf),
}

/// Loads, refreshes and hands out the shared Google OAuth token
#[derive(Clone)]
pub struct TokenManager {
    client: Client,
    token: Arc<RwLock<StoredToken>>,
    origin: Arc<TokenOrigin>,
}

impl TokenManager {
    /// Load the token blob from the environment or the token file
    pub fn load(config: &Config) -> ScoutResult<Self> {
        let (token, origin) = if let Some(encoded) = &config.gmail_token_base64 {
            info!("Loading OAuth token from environment");
            let raw = BASE64
                .decode(encoded.trim())
                .map_err(|e| auth_error(&format!("Failed to decode token blob: {}", e)))?;
            let token: StoredToken = serde_json::from_slice(&raw)
                .map_err(|e| auth_error(&format!("Failed to parse token blob: {}", e)))?;
            (token, TokenOrigin::Environment)
        } else if Path::new(&config.token_file).exists() {
            info!("Loading OAuth token from {}", config.token_file);
            let raw = std::fs::read_to_string(&config.token_file)?;
            let token: StoredToken = serde_json::from_str(&raw)
                .map_err(|e| auth_error(&format!("Failed to parse token file: {}", e)))?;
            (token, TokenOrigin::File(PathBuf::from(&config.token_file)))
        } else {
            return Err(auth_error(
                "No OAuth token available: set GMAIL_API_TOKEN_BASE64 or provide the token file",
            ));
        };

        Ok(Self {
            client: Client::new(),
            token: Arc::new(RwLock::new(token)),
            origin: Arc::new(origin),
        })
    }

    /// Build a manager around an already-parsed token, bypassing the
    /// environment and filesystem
    pub fn from_token(token: StoredToken) -> Self {
        Self {
            client: Client::new(),
            token: Arc::new(RwLock::new(token)),
            origin: Arc::new(TokenOrigin::Environment),
        }
    }

    /// Make sure the access token is usable, refreshing it if expired.
    /// Called once up front so an unrefreshable credential aborts the run
    /// before any inbox read.
    pub async fn ensure_valid(&self) -> ScoutResult<()> {
        let expired = {
            let token = self.token.read().await;
            token.is_expired(Utc::now())
        };
        if expired {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Get a valid access token for a Bearer header
    pub async fn bearer_token(&self) -> ScoutResult<String> {
        self.ensure_valid().await?;
        let token = self.token.read().await;
        Ok(token.token.clone())
    }

    /// Exchange the refresh token for a new access token
    async fn refresh(&self) -> ScoutResult<()> {
        let (refresh_token, client_id, client_secret) = {
            let token = self.token.read().await;
            (
                token.refresh_token.clone(),
                token.client_id.clone(),
                token.client_secret.clone(),
            )
        };

        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token.clone()),
            ("grant_type", "refresh_token".to_string()),
        ];

        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

        let access_token = body
            .get("access_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| auth_error("Token response missing 'access_token' field"))?
            .to_string();

        let expires_in = body.get("expires_in").and_then(|v| v.as_i64()).unwrap_or(3600);

        // Google may rotate the refresh token; fall back to the existing one
        let new_refresh_token = body
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or(refresh_token);

        let snapshot = {
            let mut token = self.token.write().await;
            token.token = access_token;
            token.refresh_token = new_refresh_token;
            token.expiry = Some(Utc::now() + Duration::seconds(expires_in));
            token.clone()
        };

        info!("OAuth token refreshed");

        // Persist so the next scheduled run starts with a warm token
        if let TokenOrigin::File(path) = self.origin.as_ref() {
            let json = serde_json::to_string_pretty(&snapshot)?;
            std::fs::write(path, json)?;
        }

        Ok(())
    }
}
