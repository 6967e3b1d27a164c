//! Record upcaster infrastructure for schema evolution.
//!
//! Persisted records carry a `schema_version` field. Records written by an
//! older build are transformed, one version step at a time, into the current
//! shape before they are deserialized into domain types.
//!
//! # Architecture
//!
//! - `Upcaster` trait - Transforms a single version step (v1 → v2)
//! - `UpcasterRegistry` - Chains multiple upcasters to reach current version
//! - `UpcastError` - Error types for failed transformations
//!
//! # Example
//!
//! ```ignore
//! struct RenameTurnsV1ToV2;
//!
//! impl Upcaster for RenameTurnsV1ToV2 {
//!     fn source_version(&self) -> u32 { 1 }
//!
//!     fn upcast(&self, mut record: serde_json::Value) -> Result<serde_json::Value, UpcastError> {
//!         let turns = record["turns"].take();
//!         record["turn_count"] = turns;
//!         Ok(record)
//!     }
//! }
//! ```

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Name of the version field every persisted record carries.
pub const SCHEMA_VERSION_FIELD: &str = "schema_version";

// ============================================
// Error Types
// ============================================

/// Errors that can occur during record upcasting.
#[derive(Debug, Error)]
pub enum UpcastError {
    /// Required field is missing from the source record.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Field value is invalid or cannot be converted.
    #[error("invalid field value: {0}")]
    InvalidValue(String),

    /// No upcaster path exists from source to target version.
    #[error("incompatible version transition: v{from} → v{to}")]
    IncompatibleVersions { from: u32, to: u32 },

    /// Record was written by a newer build than this one.
    #[error("record version v{found} is newer than supported v{supported}")]
    UnsupportedFutureVersion { found: u32, supported: u32 },

    /// JSON serialization/deserialization error during transformation.
    #[error("JSON transformation error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// ============================================
// Upcaster Trait
// ============================================

/// Transforms a persisted record from one schema version to the next.
///
/// # Implementation Notes
///
/// - Upcasters MUST NOT write back to storage; the read path owns the result
/// - Transformations MUST be deterministic (same input → same output)
/// - If transformation fails, return UpcastError (don't panic)
pub trait Upcaster: Send + Sync {
    /// Version this upcaster reads. It produces `source_version() + 1`.
    fn source_version(&self) -> u32;

    /// Transform the record from source to target schema.
    fn upcast(&self, record: JsonValue) -> Result<JsonValue, UpcastError>;
}

// ============================================
// Upcaster Registry
// ============================================

/// Registry that chains record upcasters up to the current version.
///
/// Records without a version field are treated as version 1.
pub struct UpcasterRegistry {
    /// Map from source version to upcaster.
    upcasters: HashMap<u32, Arc<dyn Upcaster>>,

    /// Version the domain types currently deserialize.
    current_version: u32,
}

impl UpcasterRegistry {
    /// Creates a new empty registry targeting `current_version`.
    pub fn new(current_version: u32) -> Self {
        Self {
            upcasters: HashMap::new(),
            current_version,
        }
    }

    /// Registers an upcaster for a specific version step.
    pub fn register(&mut self, upcaster: Arc<dyn Upcaster>) {
        self.upcasters.insert(upcaster.source_version(), upcaster);
    }

    /// Returns the version records are upcast to.
    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    /// Reads the version of a raw record.
    pub fn record_version(record: &JsonValue) -> u32 {
        record
            .get(SCHEMA_VERSION_FIELD)
            .and_then(JsonValue::as_u64)
            .map(|v| v as u32)
            .unwrap_or(1)
    }

    /// Upcasts a raw record to the current version.
    ///
    /// Automatically chains multiple upcasters if needed. The returned record
    /// always carries the current `schema_version`.
    pub fn upcast_to_current(&self, record: JsonValue) -> Result<JsonValue, UpcastError> {
        let mut version = Self::record_version(&record);

        if version > self.current_version {
            return Err(UpcastError::UnsupportedFutureVersion {
                found: version,
                supported: self.current_version,
            });
        }

        let mut current = record;

        while version < self.current_version {
            let upcaster = self.upcasters.get(&version).ok_or(
                UpcastError::IncompatibleVersions {
                    from: version,
                    to: self.current_version,
                },
            )?;

            current = upcaster.upcast(current)?;
            version += 1;
        }

        if let Some(obj) = current.as_object_mut() {
            obj.insert(SCHEMA_VERSION_FIELD.to_string(), JsonValue::from(version));
        }

        Ok(current)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Test upcaster: v1 → v2 (adds optional field)
    struct AddNoteV1ToV2;

    impl Upcaster for AddNoteV1ToV2 {
        fn source_version(&self) -> u32 {
            1
        }

        fn upcast(&self, mut record: JsonValue) -> Result<JsonValue, UpcastError> {
            record["note"] = JsonValue::Null;
            Ok(record)
        }
    }

    // Test upcaster: v2 → v3 (transforms field)
    struct NestOwnerV2ToV3;

    impl Upcaster for NestOwnerV2ToV3 {
        fn source_version(&self) -> u32 {
            2
        }

        fn upcast(&self, mut record: JsonValue) -> Result<JsonValue, UpcastError> {
            let user_id = record
                .get("user_id")
                .ok_or_else(|| UpcastError::MissingField("user_id".to_string()))?
                .clone();

            record["owner"] = json!({ "user_id": user_id });
            Ok(record)
        }
    }

    #[test]
    fn unversioned_record_is_version_one() {
        assert_eq!(UpcasterRegistry::record_version(&json!({"a": 1})), 1);
        assert_eq!(
            UpcasterRegistry::record_version(&json!({"schema_version": 4})),
            4
        );
    }

    #[test]
    fn registry_upcasts_single_version_step() {
        let mut registry = UpcasterRegistry::new(2);
        registry.register(Arc::new(AddNoteV1ToV2));

        let upgraded = registry.upcast_to_current(json!({"data": "x"})).unwrap();

        assert_eq!(upgraded["schema_version"], 2);
        assert!(upgraded["note"].is_null());
        assert_eq!(upgraded["data"], "x");
    }

    #[test]
    fn registry_chains_multiple_upcasters() {
        let mut registry = UpcasterRegistry::new(3);
        registry.register(Arc::new(AddNoteV1ToV2));
        registry.register(Arc::new(NestOwnerV2ToV3));

        let upgraded = registry
            .upcast_to_current(json!({"user_id": "u-1"}))
            .unwrap();

        assert_eq!(upgraded["schema_version"], 3);
        assert_eq!(upgraded["owner"]["user_id"], "u-1");
    }

    #[test]
    fn registry_returns_unchanged_if_already_current_version() {
        let registry = UpcasterRegistry::new(2);
        let record = json!({"schema_version": 2, "data": "x"});

        let result = registry.upcast_to_current(record.clone()).unwrap();

        assert_eq!(result, record);
    }

    #[test]
    fn registry_returns_error_for_missing_upcaster() {
        let registry = UpcasterRegistry::new(3);

        let result = registry.upcast_to_current(json!({"data": "x"}));

        assert!(matches!(
            result,
            Err(UpcastError::IncompatibleVersions { from: 1, to: 3 })
        ));
    }

    #[test]
    fn registry_rejects_records_from_newer_builds() {
        let registry = UpcasterRegistry::new(2);

        let result = registry.upcast_to_current(json!({"schema_version": 9}));

        assert!(matches!(
            result,
            Err(UpcastError::UnsupportedFutureVersion { found: 9, supported: 2 })
        ));
    }

    #[test]
    fn upcaster_failure_propagates() {
        let mut registry = UpcasterRegistry::new(3);
        registry.register(Arc::new(AddNoteV1ToV2));
        registry.register(Arc::new(NestOwnerV2ToV3));

        let result = registry.upcast_to_current(json!({"data": "no owner"}));

        assert!(matches!(result, Err(UpcastError::MissingField(_))));
    }
}
