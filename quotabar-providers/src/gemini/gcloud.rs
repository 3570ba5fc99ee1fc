//! gcloud project lookup.

use std::time::Duration;

use quotabar_fetch::FetchContext;
use tracing::{debug, instrument};

use super::error::GeminiError;

/// Timeout for `gcloud config get-value project`.
pub const GCLOUD_TIMEOUT: Duration = Duration::from_secs(5);

/// Returns the active gcloud project.
///
/// # Errors
///
/// Returns an error if probing is disabled, gcloud is missing or fails, or no
/// project is set.
#[instrument(skip(ctx))]
pub async fn active_project(ctx: &FetchContext) -> Result<String, GeminiError> {
    if !ctx.env.probe_system() {
        return Err(GeminiError::ProbeDisabled);
    }

    let output = ctx
        .process
        .run_with_timeout("gcloud", &["config", "get-value", "project"], GCLOUD_TIMEOUT)
        .await?;
    let project = output
        .trimmed_stdout()?
        .ok_or(GeminiError::EmptyOutput("gcloud"))?
        .to_string();

    debug!(project = %project, "Found gcloud project");
    Ok(project)
}
