//! OpenRouter provider implementation.
//!
//! OpenRouter is prepaid: the credits endpoint reports what was bought and
//! what was spent, and the balance is the difference.

mod credentials;
mod descriptor;
mod fetcher;
pub(crate) mod parser;

pub use credentials::openrouter_resolver;
pub use descriptor::openrouter_descriptor;
pub use fetcher::{CREDITS_URL, fetch_usage};
pub use parser::normalize;
