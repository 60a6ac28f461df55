// Export components
pub mod auth;
pub mod extractor;
pub mod gmail;
pub mod google_calendar;

// Re-export the collaborator seams
pub use auth::TokenManager;
pub use extractor::{Completions, JobExtractor, JobRecord};
pub use gmail::{EmailMessage, GmailMailbox, MailSource};
pub use google_calendar::{Calendar, EventScheduler, GoogleCalendar, ScheduleOutcome};
