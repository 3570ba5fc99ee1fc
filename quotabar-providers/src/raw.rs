//! Raw endpoint payloads collected by a fetcher.
//!
//! A fetcher stores each successful JSON payload under the endpoint name it
//! came from. The provider's `normalize` function turns the collection into a
//! [`UsageSnapshot`](quotabar_core::UsageSnapshot) without doing any I/O.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use tracing::warn;

use crate::error::ProviderError;

/// Endpoint name → JSON payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawUsage {
    endpoints: BTreeMap<String, Value>,
}

impl RawUsage {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a payload, builder style.
    #[must_use]
    pub fn with(mut self, endpoint: &str, payload: Value) -> Self {
        self.insert(endpoint, payload);
        self
    }

    /// Adds a payload.
    pub fn insert(&mut self, endpoint: &str, payload: Value) {
        self.endpoints.insert(endpoint.to_string(), payload);
    }

    /// Returns the payload for an endpoint.
    pub fn get(&self, endpoint: &str) -> Option<&Value> {
        self.endpoints.get(endpoint)
    }

    /// Returns true if no payload was collected.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Deserializes an endpoint payload.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::UnexpectedShape` if the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>, ProviderError> {
        self.decode_at(endpoint, "")
    }

    /// Deserializes the value at a JSON pointer inside an endpoint payload.
    ///
    /// A missing or `null` value is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::UnexpectedShape` if the value does not match `T`.
    pub fn decode_at<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        pointer: &str,
    ) -> Result<Option<T>, ProviderError> {
        let Some(value) = self.get(endpoint).and_then(|payload| payload.pointer(pointer)) else {
            return Ok(None);
        };
        if value.is_null() {
            return Ok(None);
        }
        T::deserialize(value)
            .map(Some)
            .map_err(|source| ProviderError::UnexpectedShape {
                endpoint: endpoint.to_string(),
                pointer: pointer.to_string(),
                source,
            })
    }

    /// Like [`decode_at`](Self::decode_at), but a malformed value is logged
    /// and skipped so the rest of the payload can still be used.
    pub fn field<T: DeserializeOwned>(&self, endpoint: &str, pointer: &str) -> Option<T> {
        self.decode_at(endpoint, pointer).unwrap_or_else(|e| {
            warn!(error = %e, "Skipping malformed field");
            None
        })
    }

    /// Deserializes each element of the array at `pointer`, skipping
    /// malformed elements.
    pub fn items<T: DeserializeOwned>(&self, endpoint: &str, pointer: &str) -> Vec<T> {
        let Some(Value::Array(elements)) =
            self.get(endpoint).and_then(|payload| payload.pointer(pointer))
        else {
            return Vec::new();
        };
        elements
            .iter()
            .filter_map(|element| match T::deserialize(element) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(endpoint, pointer, error = %e, "Skipping malformed element");
                    None
                }
            })
            .collect()
    }
}
