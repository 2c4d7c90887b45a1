//! # Configuration
//!
//! Runtime options for the memory layer, read once at initialisation.
//!
//! ## Environment Variables
//!
//! - `NATIVEMEM_ACCESSOR`: preferred accessor strategy (`libc` or `portable`)
//! - `NATIVEMEM_CHECKED`: enable precondition checks (`1`/`true`/`on` or
//!   `0`/`false`/`off`). Defaults to on in debug builds and when the `checked`
//!   cargo feature is enabled.
//!
//! Invalid values are logged and ignored.

use std::env;

use tracing::warn;

use crate::platform::AccessorKind;

/// Environment variable naming the preferred accessor.
pub const ACCESSOR_ENV: &str = "NATIVEMEM_ACCESSOR";
/// Environment variable toggling checked mode.
pub const CHECKED_ENV: &str = "NATIVEMEM_CHECKED";

/// Whether checked mode is on when nothing else says otherwise.
pub const CHECKED_BY_DEFAULT: bool = cfg!(debug_assertions) || cfg!(feature = "checked");

/// Options for [`Memory::with_config`](crate::Memory::with_config).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryConfig
{
    /// Strategy to try before the default preference order
    pub preferred: Option<AccessorKind>,
    /// Validate addresses, capacities and rebinds before delegating
    ///
    /// With checks off, invalid arguments reach the accessor unchecked and may
    /// corrupt memory or crash the process.
    pub checked: bool,
}

impl Default for MemoryConfig
{
    fn default() -> Self
    {
        Self {
            preferred: None,
            checked: CHECKED_BY_DEFAULT,
        }
    }
}

impl MemoryConfig
{
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self
    {
        Self::from_values(env::var(ACCESSOR_ENV).ok().as_deref(), env::var(CHECKED_ENV).ok().as_deref())
    }

    /// Build a configuration from raw variable values.
    pub fn from_values(accessor: Option<&str>, checked: Option<&str>) -> Self
    {
        let mut config = Self::default();

        if let Some(value) = accessor {
            match value.parse::<AccessorKind>() {
                Ok(kind) => config.preferred = Some(kind),
                Err(err) => warn!("Ignoring {ACCESSOR_ENV}: {err}"),
            }
        }

        if let Some(value) = checked {
            match parse_flag(value) {
                Some(flag) => config.checked = flag,
                None => warn!("Ignoring {CHECKED_ENV}: expected a boolean, found '{value}'"),
            }
        }

        config
    }

    /// Prefer the given strategy.
    #[must_use]
    pub fn with_preferred(mut self, kind: AccessorKind) -> Self
    {
        self.preferred = Some(kind);
        self
    }

    /// Turn checked mode on or off.
    #[must_use]
    pub fn with_checked(mut self, checked: bool) -> Self
    {
        self.checked = checked;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool>
{
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_default_follows_build()
    {
        let config = MemoryConfig::default();
        assert_eq!(config.preferred, None);
        assert_eq!(config.checked, CHECKED_BY_DEFAULT);
    }

    #[test]
    fn test_from_values()
    {
        let config = MemoryConfig::from_values(Some("portable"), Some("off"));
        assert_eq!(config.preferred, Some(AccessorKind::Portable));
        assert!(!config.checked);

        let config = MemoryConfig::from_values(Some("LIBC"), Some("1"));
        assert_eq!(config.preferred, Some(AccessorKind::Libc));
        assert!(config.checked);
    }

    #[test]
    fn test_invalid_values_are_ignored()
    {
        let config = MemoryConfig::from_values(Some("jni"), Some("maybe"));
        assert_eq!(config, MemoryConfig::default());
    }

    #[test]
    fn test_builders()
    {
        let config = MemoryConfig::default().with_preferred(AccessorKind::Libc).with_checked(false);
        assert_eq!(config.preferred, Some(AccessorKind::Libc));
        assert!(!config.checked);
    }
}
