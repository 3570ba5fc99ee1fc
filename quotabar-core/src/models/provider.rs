//! Provider-related types.
//!
//! This module contains types related to the supported providers:
//! - [`ProviderKind`] - Enum of supported providers
//! - [`ProviderMetadata`] - Display info, hints and dashboard links

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Provider Kind
// ============================================================================

/// Supported provider kinds.
///
/// The declaration order is the order providers appear in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Claude Code
    Claude,
    /// OpenAI Codex
    Codex,
    /// Google Gemini CLI
    Gemini,
    /// Z.AI (GLM coding plan)
    Zai,
    /// OpenRouter credits
    OpenRouter,
}

impl ProviderKind {
    /// Returns the display name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude Code",
            Self::Codex => "OpenAI Codex",
            Self::Gemini => "Gemini CLI",
            Self::Zai => "Z.AI",
            Self::OpenRouter => "OpenRouter",
        }
    }

    /// Returns all available provider kinds.
    pub fn all() -> &'static [ProviderKind] {
        &[
            Self::Claude,
            Self::Codex,
            Self::Gemini,
            Self::Zai,
            Self::OpenRouter,
        ]
    }

    /// Returns the CLI name for this provider (lowercase, no spaces).
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
            Self::Gemini => "gemini",
            Self::Zai => "zai",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Looks up a provider by its CLI name.
    pub fn from_cli_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.cli_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_cli_name(s.trim()).ok_or_else(|| CoreError::ProviderNotFound(s.to_string()))
    }
}

// ============================================================================
// Provider Metadata
// ============================================================================

/// Static, user-facing information about a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMetadata {
    /// Provider this metadata describes.
    pub kind: ProviderKind,
    /// Heading used in detailed output.
    pub section_title: &'static str,
    /// Short label used in one-line output.
    pub short_name: &'static str,
    /// How to set up credentials when none were found.
    pub credential_hint: &'static str,
    /// How to recover from an expired or rejected credential.
    pub reauth_hint: &'static str,
    /// Billing or usage dashboard.
    pub dashboard_url: Option<&'static str>,
}

impl ProviderMetadata {
    /// Returns the metadata for a provider.
    pub fn for_provider(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Claude => Self {
                kind,
                section_title: "Claude Code",
                short_name: "Claude",
                credential_hint: "Run 'claude' and authenticate first",
                reauth_hint: "Run 'claude' to re-authenticate",
                dashboard_url: None,
            },
            ProviderKind::Codex => Self {
                kind,
                section_title: "OpenAI Codex",
                short_name: "Codex",
                credential_hint: "Run 'codex login' or set OPENAI_API_KEY",
                reauth_hint: "Run 'codex login' to re-authenticate",
                dashboard_url: Some("https://platform.openai.com/usage"),
            },
            ProviderKind::Gemini => Self {
                kind,
                section_title: "Gemini CLI",
                short_name: "Gemini",
                credential_hint: "Set GEMINI_API_KEY or run 'gemini' to authenticate",
                reauth_hint: "Run 'gemini' to refresh token",
                dashboard_url: Some("https://aistudio.google.com"),
            },
            ProviderKind::Zai => Self {
                kind,
                section_title: "Z.AI (5h shared - GLM-4.x)",
                short_name: "Z.AI",
                credential_hint: "Set ZAI_API_KEY environment variable",
                reauth_hint: "Check ZAI_API_KEY or regenerate the key",
                dashboard_url: Some("https://z.ai/manage-apikey/billing"),
            },
            ProviderKind::OpenRouter => Self {
                kind,
                section_title: "OpenRouter",
                short_name: "OpenRouter",
                credential_hint: "Set OPENROUTER_API_KEY environment variable",
                reauth_hint: "Check OPENROUTER_API_KEY",
                dashboard_url: Some("https://openrouter.ai/credits"),
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
