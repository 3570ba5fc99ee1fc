//! Compact one-line output, e.g. for status bars.

use clap::ValueEnum;
use quotabar_core::{ProviderMetadata, UsageSnapshot, UsageReport, UsageWindow};
use quotabar_providers::gemini::tier_windows;
use quotabar_store::Thresholds;

use super::style::{Style, percent, usd};

const SESSION_LABEL: &str = "5h";
const WEEKLY_LABEL: &str = "7d";

/// Which rolling window the one-line output shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OnelineWindow {
    /// The short session window.
    #[default]
    #[value(name = "5h")]
    Session,
    /// The weekly window.
    #[value(name = "7d")]
    Weekly,
    /// Both, as `session/weekly`.
    Both,
}

/// Renders a report as a single `" | "`-joined line.
pub struct OnelineFormatter<'a> {
    thresholds: &'a Thresholds,
    window: OnelineWindow,
    style: Style,
}

impl<'a> OnelineFormatter<'a> {
    /// Creates a formatter.
    pub fn new(thresholds: &'a Thresholds, window: OnelineWindow, style: Style) -> Self {
        Self {
            thresholds,
            window,
            style,
        }
    }

    /// Formats the report. Providers with nothing to show are skipped.
    pub fn format(&self, report: &UsageReport) -> String {
        report
            .iter()
            .filter_map(|snapshot| {
                let name = ProviderMetadata::for_provider(snapshot.provider).short_name;
                self.format_snapshot(snapshot)
                    .map(|body| format!("{name}: {body}"))
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn format_snapshot(&self, snapshot: &UsageSnapshot) -> Option<String> {
        if snapshot.is_error() {
            return Some(self.style.error_marker());
        }

        if let Some(balance) = &snapshot.balance {
            let level = self.thresholds.level_for_balance(balance.balance_usd);
            return Some(self.style.mark(&usd(balance.balance_usd), "", level));
        }

        let tiers = tier_windows(snapshot);
        if !tiers.is_empty() {
            let parts: Vec<String> = tiers
                .iter()
                .map(|(tier, window)| format!("{tier} {}", self.percent_mark(window.used_percent, "")))
                .collect();
            return Some(format!("( {} )", parts.join(" | ")));
        }

        if let Some(quota) = &snapshot.token_quota {
            let used = quota
                .percentage
                .or_else(|| snapshot.window("tokens").map(|w| w.used_percent))
                .unwrap_or(0.0);
            return Some(self.percent_mark(used, " (5h)"));
        }

        self.format_windows(snapshot)
    }

    fn format_windows(&self, snapshot: &UsageSnapshot) -> Option<String> {
        let session = session_window(snapshot);
        let weekly = weekly_window(snapshot);

        match (self.window, session, weekly) {
            (OnelineWindow::Both, Some(s), Some(w)) => {
                let figure = format!("{}/{}", percent(s.used_percent), percent(w.used_percent));
                let level = self
                    .thresholds
                    .level_for_percent(s.used_percent.max(w.used_percent));
                Some(self.style.mark(&figure, "", level))
            }
            (OnelineWindow::Session, Some(s), _) => Some(self.percent_mark(s.used_percent, " (5h)")),
            (OnelineWindow::Weekly, _, Some(w)) => Some(self.percent_mark(w.used_percent, " (7d)")),
            _ => None,
        }
    }

    fn percent_mark(&self, used: f64, suffix: &str) -> String {
        let level = self.thresholds.level_for_percent(used);
        self.style.mark(&percent(used), suffix, level)
    }
}

/// The `5h` window, or else the shortest timed window.
fn session_window(snapshot: &UsageSnapshot) -> Option<&UsageWindow> {
    snapshot.window(SESSION_LABEL).or_else(|| {
        snapshot
            .windows
            .values()
            .filter(|w| w.window_minutes.is_some())
            .min_by_key(|w| w.window_minutes)
    })
}

/// The `7d` window, or else the longest timed window when there are several.
fn weekly_window(snapshot: &UsageSnapshot) -> Option<&UsageWindow> {
    snapshot.window(WEEKLY_LABEL).or_else(|| {
        let mut timed: Vec<_> = snapshot
            .windows
            .values()
            .filter(|w| w.window_minutes.is_some())
            .collect();
        if timed.len() < 2 {
            return None;
        }
        timed.sort_by_key(|w| w.window_minutes);
        timed.last().copied()
    })
}
