//! Schema version handling when reopening a persisted store.

use glaze_core::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// What to do when the stored schema version is older than the configured one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationPolicy {
    /// Refuse to open.
    #[default]
    Fail,
    /// Discard the stored data.
    Reset,
    /// Adapt stored data to the current model.
    Lightweight,
}

/// Outcome of comparing stored and configured schema versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MigrationAction {
    Load,
    Migrate,
    Reset,
}

/// Decides how to open data written under schema version `stored`.
///
/// Data from a newer schema is never opened.
pub fn plan(stored: u64, expected: u64, policy: MigrationPolicy) -> Result<MigrationAction> {
    if stored == expected {
        return Ok(MigrationAction::Load);
    }
    if stored > expected {
        return Err(EngineError::SchemaMismatch { stored, expected }.into());
    }
    match policy {
        MigrationPolicy::Fail => Err(EngineError::SchemaMismatch { stored, expected }.into()),
        MigrationPolicy::Reset => Ok(MigrationAction::Reset),
        MigrationPolicy::Lightweight => Ok(MigrationAction::Migrate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glaze_core::Error;

    #[test]
    fn test_same_version_loads() {
        for policy in [
            MigrationPolicy::Fail,
            MigrationPolicy::Reset,
            MigrationPolicy::Lightweight,
        ] {
            assert_eq!(plan(3, 3, policy).unwrap(), MigrationAction::Load);
        }
    }

    #[test]
    fn test_older_version_follows_policy() {
        assert!(matches!(
            plan(1, 2, MigrationPolicy::Fail),
            Err(Error::Engine(EngineError::SchemaMismatch {
                stored: 1,
                expected: 2
            }))
        ));
        assert_eq!(plan(1, 2, MigrationPolicy::Reset).unwrap(), MigrationAction::Reset);
        assert_eq!(
            plan(1, 2, MigrationPolicy::Lightweight).unwrap(),
            MigrationAction::Migrate
        );
    }

    #[test]
    fn test_newer_version_always_fails() {
        assert!(plan(5, 2, MigrationPolicy::Lightweight).is_err());
        assert!(plan(5, 2, MigrationPolicy::Reset).is_err());
    }

    #[test]
    fn test_policy_serde() {
        let policy: MigrationPolicy = serde_json::from_str("\"lightweight\"").unwrap();
        assert_eq!(policy, MigrationPolicy::Lightweight);
    }
}
