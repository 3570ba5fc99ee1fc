//! Detailed text output, one section per provider.

use chrono::{DateTime, Local, Utc};
use quotabar_core::{
    ProviderMetadata, ResetEta, SnapshotStatus, UsageReport, UsageSnapshot, UsageWindow,
};
use quotabar_providers::gemini::{model_tier, tier_windows};

use super::style::{Style, grouped, percent, usd};

const RULE_WIDTH: usize = 50;

/// Text formatter.
pub struct TextFormatter {
    style: Style,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(style: Style) -> Self {
        Self { style }
    }

    /// Formats the whole report with a timestamped header.
    pub fn format_report(&self, report: &UsageReport, at: DateTime<Utc>) -> String {
        let mut out = vec![
            String::new(),
            self.style.prefixed("🔍", "AI CLI Usage"),
            format!("   {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")),
        ];
        for snapshot in report {
            out.push(self.format_snapshot(snapshot));
        }
        out.push(String::new());
        out.push("=".repeat(RULE_WIDTH));
        out.join("\n")
    }

    /// Formats one provider section.
    pub fn format_snapshot(&self, snapshot: &UsageSnapshot) -> String {
        let meta = ProviderMetadata::for_provider(snapshot.provider);
        let s = self.style;
        let mut lines = vec![
            String::new(),
            "=".repeat(RULE_WIDTH),
            format!("  {}", s.bold(meta.section_title)),
            "=".repeat(RULE_WIDTH),
        ];

        if let Some(auth) = &snapshot.auth {
            lines.push(format!("  {}", s.prefixed("🔑", &format!("Auth: {auth}"))));
        }
        if let Some(account) = &snapshot.account {
            lines.push(format!("  {}", s.prefixed("👤", &format!("Account: {account}"))));
        }

        match snapshot.status {
            SnapshotStatus::Ok => lines.push(format!("  {}", s.prefixed("✅", "Connected"))),
            SnapshotStatus::Authenticated => {
                lines.push(format!("  {}", s.prefixed("✅", "Authenticated")));
            }
            SnapshotStatus::Error => {}
        }

        if let Some(plan) = &snapshot.plan {
            lines.push(format!("  {}", s.prefixed("📊", &format!("Plan: {plan}"))));
        }
        if let Some(tier) = &snapshot.tier {
            lines.push(format!("  {}", s.prefixed("📊", &format!("Tier: {tier}"))));
        }
        if snapshot.token_refreshed == Some(true) {
            lines.push(format!("  {}", s.prefixed("🔄", "Token auto-refreshed")));
        }
        if let Some(eta) = snapshot.token_expires_in {
            lines.push(format!("  {}", s.prefixed("⏱️ ", &format!("Token expires in: {eta}"))));
        }
        if let Some(project) = &snapshot.gcp_project {
            lines.push(format!("  {}", s.prefixed("📦", &format!("GCP Project: {project}"))));
        }

        push_windows(&mut lines, snapshot);

        if snapshot.limit_reached == Some(true) {
            lines.push(format!("  {}", s.prefixed("⚠️ ", "Rate limit reached!")));
        }

        if let Some(quota) = snapshot.request_quota.filter(|q| q.limit > 0) {
            lines.push(String::new());
            lines.push("  Request Quota:".to_string());
            lines.push(format!("    Used:      {} / {}", grouped(quota.used), grouped(quota.limit)));
            lines.push(format!("    Remaining: {}", grouped(quota.remaining)));
        }

        if let Some(activity) = snapshot.weekly_activity {
            lines.push(String::new());
            lines.push("  7-Day Historical:".to_string());
            lines.push(format!("    API Calls: {}", grouped(activity.calls)));
            lines.push(format!("    Tokens:    {}", grouped(activity.tokens)));
        }

        if let Some(balance) = snapshot.balance {
            lines.push(String::new());
            lines.push("  Balance:".to_string());
            lines.push(format!("    Current:   {}", usd(balance.balance_usd)));
            lines.push(format!("    Purchased: {}", usd(balance.total_credits_usd)));
            lines.push(format!("    Used:      {}", usd(balance.total_usage_usd)));
        }

        if let Some(url) = &snapshot.dashboard_url {
            lines.push(format!("  {}", s.prefixed("🔗", url)));
        }

        if let Some(failure) = &snapshot.failure {
            let icon = if snapshot.is_error() { "❌" } else { "⚠️ " };
            lines.push(format!("  {}", s.prefixed(icon, &failure.message)));
            if let Some(details) = &failure.details {
                lines.push(format!("     {details}"));
            }
        }
        for hint in &snapshot.hints {
            lines.push(format!("  {}", s.prefixed("💡", hint)));
        }
        if let Some(note) = &snapshot.note {
            lines.push(format!("  {}", s.prefixed("📝", note)));
        }

        lines.join("\n")
    }
}

fn push_windows(lines: &mut Vec<String>, snapshot: &UsageSnapshot) {
    let tiers = tier_windows(snapshot);
    if !tiers.is_empty() {
        lines.push(String::new());
        lines.push("  Quota by Tier:".to_string());
        for (tier, window) in tiers {
            let reset = match window.reset_eta {
                ResetEta::NotAvailable => String::new(),
                eta => format!(" (resets: {eta})"),
            };
            lines.push(format!(
                "    {tier}: {} used, {} remaining{reset}",
                percent(window.used_percent),
                percent(window.remaining_percent)
            ));
        }
    }

    for window in snapshot.windows.values() {
        if model_tier(&window.label).is_some() {
            continue;
        }
        match window.label.as_str() {
            "opus" => {
                lines.push(String::new());
                lines.push(format!("  Opus (7-day): {} used", percent(window.used_percent)));
            }
            "code_review" => {
                lines.push(String::new());
                lines.push(format!("  Code Review Quota: {} used", percent(window.used_percent)));
            }
            "tokens" => {
                push_window(lines, "Token Quota", window);
                if let Some(quota) = snapshot.token_quota.filter(|q| q.limit > 0) {
                    lines.push(format!("    ({} / {} tokens)", grouped(quota.used), grouped(quota.limit)));
                }
            }
            label => push_window(lines, &format!("{label} Window"), window),
        }
    }
}

fn push_window(lines: &mut Vec<String>, heading: &str, window: &UsageWindow) {
    lines.push(String::new());
    lines.push(format!("  {heading}:"));
    lines.push(format!("    Used:      {}", percent(window.used_percent)));
    lines.push(format!("    Remaining: {}", percent(window.remaining_percent)));
    if window.reset_eta != ResetEta::NotAvailable {
        lines.push(format!("    Resets in: {}", window.reset_eta));
    }
}
