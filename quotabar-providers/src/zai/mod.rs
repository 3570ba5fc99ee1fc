//! Z.AI (Zhipu) provider implementation.
//!
//! The GLM coding plan shares one 5-hour token quota across models. The
//! monitor API reports it together with a request quota and 7-day totals.
//! Monitor endpoints take the raw API key in `Authorization`; the chat API
//! used as a liveness check expects a Bearer token.

mod credentials;
mod descriptor;
mod fetcher;
pub(crate) mod parser;

pub use credentials::zai_resolver;
pub use descriptor::zai_descriptor;
pub use fetcher::{LIVENESS_URL, MODEL_USAGE_URL, QUOTA_URL, fetch_usage, history_url};
pub use parser::{DASHBOARD_HINT, normalize};
