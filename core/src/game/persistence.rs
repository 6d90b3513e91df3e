//! Versioned save files, as JSON or compact bincode.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::world::SimulationState;

/// Bump when [`SimulationState`] changes shape.
pub const SAVE_VERSION: u32 = 2;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save data is malformed: {0}")]
    Malformed(String),
    #[error("unsupported save version {found} (this build reads version {expected})")]
    UnsupportedVersion { expected: u32, found: u32 },
    #[error("failed to encode save data: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SaveData {
    pub(crate) version: u32,
    pub(crate) rng_seed: u64,
    pub(crate) state: SimulationState,
}

/// Only the leading version field, read before trusting the rest.
#[derive(Deserialize)]
struct SaveHeader {
    version: u32,
}

impl SaveData {
    pub(crate) fn new(rng_seed: u64, state: SimulationState) -> Self {
        Self {
            version: SAVE_VERSION,
            rng_seed,
            state,
        }
    }

    pub(crate) fn to_json(&self) -> Result<String, PersistenceError> {
        serde_json::to_string_pretty(self).map_err(|err| PersistenceError::Encode(err.to_string()))
    }

    pub(crate) fn from_json(text: &str) -> Result<Self, PersistenceError> {
        let header: SaveHeader =
            serde_json::from_str(text).map_err(|err| PersistenceError::Malformed(err.to_string()))?;
        check_version(header.version)?;
        serde_json::from_str(text).map_err(|err| PersistenceError::Malformed(err.to_string()))
    }

    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        bincode::serialize(self).map_err(|err| PersistenceError::Encode(err.to_string()))
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self, PersistenceError> {
        // `version` is the first field, so it decodes on its own.
        let version: u32 =
            bincode::deserialize(bytes).map_err(|err| PersistenceError::Malformed(err.to_string()))?;
        check_version(version)?;
        bincode::deserialize(bytes).map_err(|err| PersistenceError::Malformed(err.to_string()))
    }
}

fn check_version(found: u32) -> Result<(), PersistenceError> {
    if found != SAVE_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            expected: SAVE_VERSION,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::EngineConfig;

    fn sample() -> SaveData {
        SaveData::new(42, SimulationState::new(&EngineConfig::default()))
    }

    #[test]
    fn newer_versions_are_refused_before_decoding() {
        let mut data = sample();
        data.version = 7;
        let json = data.to_json().unwrap();
        match SaveData::from_json(&json) {
            Err(PersistenceError::UnsupportedVersion { expected, found }) => {
                assert_eq!(expected, SAVE_VERSION);
                assert_eq!(found, 7);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let bytes = data.to_bytes().unwrap();
        assert!(matches!(
            SaveData::from_bytes(&bytes),
            Err(PersistenceError::UnsupportedVersion { found: 7, .. })
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            SaveData::from_json("{\"version\": 1}"),
            Err(PersistenceError::Malformed(_))
        ));
        assert!(matches!(
            SaveData::from_bytes(&[1, 0]),
            Err(PersistenceError::Malformed(_))
        ));
    }

    #[test]
    fn bytes_keep_the_seed() {
        let bytes = sample().to_bytes().unwrap();
        let loaded = SaveData::from_bytes(&bytes).unwrap();
        assert_eq!(loaded.rng_seed, 42);
        assert_eq!(loaded.state.calendar.week(), 1);
    }
}
