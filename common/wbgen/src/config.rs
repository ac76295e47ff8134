// Licensed under the Apache-2.0 license

//! Configuration for the register and bus solvers.
//!
//! [`SolverConfig`] decides how severe the lenient checks are. By default
//! every [`Warning`] stays a warning; each class can be promoted to a hard
//! error individually.

use crate::warning::Warning;
use serde::Deserialize;

/// Options shared by `RegisterSet` and `WbBus` construction.
///
/// # Example
///
/// ```
/// use wbgen_common::SolverConfig;
///
/// // Warning-only severity for everything
/// let config = SolverConfig::default();
/// assert!(!config.strict_masked_write);
///
/// // Reject masked writes that would touch bits of other fields
/// let config = SolverConfig::new().strict_masked_write(true);
/// assert!(config.strict_masked_write);
///
/// // The same options can be kept in TOML
/// let config = SolverConfig::from_toml_str("strict_address_size = true").unwrap();
/// assert!(config.strict_address_size);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Fail when the narrowest master cannot reach every slave address.
    pub strict_address_size: bool,

    /// Fail when a masked write shares a byte lane with another field.
    pub strict_masked_write: bool,

    /// Fail when an overwrite accessor is requested on a multi-field register.
    pub strict_overwrite: bool,
}

impl SolverConfig {
    /// Create a config with warning-only severity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that promotes every warning to an error.
    pub fn strict() -> Self {
        Self {
            strict_address_size: true,
            strict_masked_write: true,
            strict_overwrite: true,
        }
    }

    pub fn strict_address_size(mut self, strict: bool) -> Self {
        self.strict_address_size = strict;
        self
    }

    pub fn strict_masked_write(mut self, strict: bool) -> Self {
        self.strict_masked_write = strict;
        self
    }

    pub fn strict_overwrite(mut self, strict: bool) -> Self {
        self.strict_overwrite = strict;
        self
    }

    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> crate::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Returns true if `warning` must abort construction.
    pub fn is_fatal(&self, warning: &Warning) -> bool {
        match warning {
            Warning::OverwriteMultiField { .. } => self.strict_overwrite,
            Warning::MaskedWriteLaneShared { .. } => self.strict_masked_write,
            Warning::AddressSizeMismatch { .. } => self.strict_address_size,
        }
    }
}
