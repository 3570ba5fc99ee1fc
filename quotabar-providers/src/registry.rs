//! Provider registry for managing all provider descriptors.
//!
//! The registry provides static access to all provider configurations
//! and is the central point for looking up providers.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use quotabar_core::ProviderKind;

use crate::claude::claude_descriptor;
use crate::codex::codex_descriptor;
use crate::descriptor::ProviderDescriptor;
use crate::gemini::gemini_descriptor;
use crate::openrouter::openrouter_descriptor;
use crate::zai::zai_descriptor;

// ============================================================================
// Static Registry
// ============================================================================

/// Static storage for all provider descriptors.
static DESCRIPTORS: OnceLock<Vec<ProviderDescriptor>> = OnceLock::new();

/// Initializes all provider descriptors, in report order.
fn init_descriptors() -> Vec<ProviderDescriptor> {
    vec![
        claude_descriptor(),
        codex_descriptor(),
        gemini_descriptor(),
        zai_descriptor(),
        openrouter_descriptor(),
    ]
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Global registry of all provider descriptors.
///
/// The registry is initialized lazily on first access and is immutable
/// afterwards.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Returns all provider descriptors.
    pub fn all() -> &'static [ProviderDescriptor] {
        DESCRIPTORS.get_or_init(init_descriptors)
    }

    /// Gets a provider descriptor by kind.
    pub fn get(kind: ProviderKind) -> Option<&'static ProviderDescriptor> {
        Self::all().iter().find(|d| d.kind == kind)
    }

    /// Looks up a provider by CLI name.
    pub fn get_by_cli_name(name: &str) -> Option<&'static ProviderDescriptor> {
        ProviderKind::from_cli_name(name).and_then(Self::get)
    }

    /// Returns the descriptors for `selection`, or all of them when it is empty.
    pub fn select(selection: &BTreeSet<ProviderKind>) -> Vec<&'static ProviderDescriptor> {
        Self::all()
            .iter()
            .filter(|d| selection.is_empty() || selection.contains(&d.kind))
            .collect()
    }

    /// Returns the number of registered providers.
    pub fn count() -> usize {
        Self::all().len()
    }

    /// Returns all provider kinds.
    pub fn kinds() -> Vec<ProviderKind> {
        Self::all().iter().map(|d| d.kind).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
