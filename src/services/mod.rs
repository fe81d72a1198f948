//! Services for Campus Hub.

mod auth;
mod llm;

pub use auth::{AuthService, Claims};
pub use llm::{ImageAttachment, LlmService};
