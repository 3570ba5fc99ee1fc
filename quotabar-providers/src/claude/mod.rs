//! Claude (Anthropic) provider implementation.
//!
//! Reads the OAuth token that Claude Code stores after `claude` login and
//! queries the subscription usage endpoint.
//!
//! ## OAuth Credentials
//!
//! Credentials are read from, in order:
//! - macOS Keychain: service="Claude Code-credentials"
//! - `~/.claude/.credentials.json`
//! - `~/.claude/credentials.json`
//! - `~/.config/claude/credentials.json`
//! - `CLAUDE_ACCESS_TOKEN`
//!
//! Format:
//! ```json
//! {
//!   "claudeAiOauth": {
//!     "accessToken": "...",
//!     "subscriptionType": "max"
//!   }
//! }
//! ```
//!
//! ## Windows
//!
//! | Field | Window |
//! |-------|--------|
//! | `five_hour` | `5h` |
//! | `seven_day` | `7d` |
//! | `seven_day_opus` | `opus` |

mod credentials;
mod descriptor;
mod fetcher;
pub(crate) mod parser;

pub use credentials::{KEYCHAIN_SERVICE, claude_resolver};
pub use descriptor::claude_descriptor;
pub use fetcher::{USAGE_URL, fetch_usage};
pub use parser::{ClaudeWindow, normalize};
