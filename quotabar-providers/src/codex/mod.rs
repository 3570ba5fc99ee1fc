//! OpenAI Codex provider implementation.
//!
//! Codex CLI logs in against ChatGPT and keeps the OAuth tokens in
//! `~/.codex/auth.json`. With a token and account id the ChatGPT backend
//! reports the subscription rate-limit windows. Without them, an API key is
//! checked for validity only.
//!
//! # Auth.json Format
//!
//! ```json
//! {
//!   "OPENAI_API_KEY": "sk-...",
//!   "tokens": {
//!     "access_token": "eyJ...",
//!     "account_id": "..."
//!   }
//! }
//! ```

mod auth;
mod descriptor;
mod fetcher;
pub(crate) mod parser;

pub use auth::codex_resolver;
pub use descriptor::codex_descriptor;
pub use fetcher::{MODELS_URL, USAGE_URL, fetch_usage};
pub use parser::{RateWindow, normalize, window_label};
