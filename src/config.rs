use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Settings used to build a [`crate::MemorySpace`].
///
/// ```toml
/// [arena]
/// capacity = 100
///
/// [policy]
/// compact_on_failure = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceConfig {
    pub arena: ArenaConfig,

    #[serde(default)]
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Number of words in the arena.
    pub capacity: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Compact the free list and retry once when an allocation finds no room.
    #[serde(default)]
    pub compact_on_failure: bool,
}

impl SpaceConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: ArenaConfig { capacity },
            policy: PolicyConfig::default(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SpaceConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.arena.capacity == 0 {
            return Err(Error::InvalidArgument(
                "arena.capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySpace;
    use std::io::Write;

    #[test]
    fn parse_full_config() {
        let config = SpaceConfig::from_toml_str(
            r#"
            [arena]
            capacity = 64

            [policy]
            compact_on_failure = true
            "#,
        )
        .unwrap();

        assert_eq!(config.arena.capacity, 64);
        assert!(config.policy.compact_on_failure);
    }

    #[test]
    fn policy_defaults_to_plain_first_fit() {
        let config = SpaceConfig::from_toml_str("[arena]\ncapacity = 8\n").unwrap();

        assert_eq!(config, SpaceConfig::with_capacity(8));
    }

    #[test]
    fn missing_capacity_is_a_config_error() {
        assert!(matches!(
            SpaceConfig::from_toml_str("[policy]\ncompact_on_failure = true\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            SpaceConfig::from_toml_str("[arena]\ncapacity = 0\n"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn written_config_reads_back() {
        let mut config = SpaceConfig::with_capacity(48);
        config.policy.compact_on_failure = true;

        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("[arena]") && text.contains("capacity = 48"));
        assert_eq!(SpaceConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[arena]\ncapacity = 32").unwrap();

        let config = SpaceConfig::load(file.path()).unwrap();
        assert_eq!(config.arena.capacity, 32);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            SpaceConfig::load(dir.path().join("missing.toml")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn policy_drives_allocation_retry() {
        let mut config = SpaceConfig::with_capacity(10);
        config.policy.compact_on_failure = true;
        let mut space = MemorySpace::from_config(&config).unwrap();

        let a = space.allocate(5).unwrap().unwrap();
        let b = space.allocate(5).unwrap().unwrap();
        space.release(b).unwrap();
        space.release(a).unwrap();

        assert_eq!(space.allocate_with_policy(10).unwrap(), Some(0));
    }

    #[test]
    fn plain_policy_does_not_compact() {
        let mut space = MemorySpace::from_config(&SpaceConfig::with_capacity(10)).unwrap();

        let a = space.allocate(5).unwrap().unwrap();
        let b = space.allocate(5).unwrap().unwrap();
        space.release(b).unwrap();
        space.release(a).unwrap();

        assert_eq!(space.allocate_with_policy(10).unwrap(), None);
        assert_eq!(space.free_ranges().size(), 2);
    }
}
