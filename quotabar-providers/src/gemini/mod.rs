//! Gemini (Google) provider implementation.
//!
//! The Gemini CLI stores a Google OAuth token in `~/.gemini/oauth_creds.json`.
//! With that token the Cloud Code Assist API reports the account tier and a
//! per-model quota bucket. Expired tokens are refreshed with the CLI's own
//! OAuth client, which is discovered from the installed npm package.
//!
//! ## oauth_creds.json Format
//!
//! ```json
//! {
//!   "access_token": "ya29...",
//!   "refresh_token": "1//...",
//!   "expiry_date": 1735898400000
//! }
//! ```
//!
//! ## API Endpoints
//!
//! - `POST v1internal:loadCodeAssist` - tier and project
//! - `POST v1internal:retrieveUserQuota` - per-model buckets
//! - `GET oauth2/v1/userinfo` - token check when the quota API refuses

mod credentials;
mod descriptor;
mod error;
mod fetcher;
pub mod gcloud;
pub(crate) mod parser;
mod registration;

pub use credentials::gemini_resolver;
pub use descriptor::gemini_descriptor;
pub use error::GeminiError;
pub use fetcher::{LOAD_CODE_ASSIST_URL, RETRIEVE_QUOTA_URL, TOKEN_URL, USERINFO_URL, fetch_usage};
pub use parser::{MODEL_TIERS, model_tier, normalize, tier_windows};
pub use registration::GeminiCliRegistration;
