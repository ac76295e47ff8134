// Licensed under the Apache-2.0 license

//! Non-fatal diagnostics.
//!
//! Warnings never abort construction; they travel next to the resolved model
//! in [`Resolved`]. A [`SolverConfig`] may promote individual warning classes
//! to errors.

use crate::config::SolverConfig;
use crate::error::{Result, StructuralError};
use crate::path::EntityPath;
use log::warn;
use std::ops::Deref;
use thiserror::Error;

/// A condition that is legal but likely unintended.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Overwriting the field writes the whole register and clobbers its
    /// sibling fields.
    #[error(
        "field {path} uses overwrite, but the register contains {field_count} fields; writing will potentially cause side-effects"
    )]
    OverwriteMultiField { path: EntityPath, field_count: usize },
    /// A byte lane touched by the field's write mask also holds bits of
    /// other fields.
    #[error(
        "write mask 0x{lane_mask:X} of {path} overlaps with fields {shared_with:?}; writing will potentially cause side-effects"
    )]
    MaskedWriteLaneShared {
        path: EntityPath,
        lane_mask: u64,
        shared_with: Vec<String>,
    },
    /// Some slave addresses are not reachable from the narrowest master.
    #[error(
        "the smallest master address size ({smallest_master}) of {path} is less than the largest slave address size ({largest_slave}); not all slave addresses can be accessed"
    )]
    AddressSizeMismatch {
        path: EntityPath,
        smallest_master: u32,
        largest_slave: u32,
    },
}

impl Warning {
    pub fn path(&self) -> &EntityPath {
        match self {
            Warning::OverwriteMultiField { path, .. }
            | Warning::MaskedWriteLaneShared { path, .. }
            | Warning::AddressSizeMismatch { path, .. } => path,
        }
    }
}

/// Warning accumulator used while a model is being solved.
#[derive(Clone, Debug, Default)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `warning`, or fails if `config` promotes its class to an error.
    pub fn record(&mut self, warning: Warning, config: &SolverConfig) -> Result<()> {
        if config.is_fatal(&warning) {
            return Err(StructuralError::WarningPromoted(warning).into());
        }
        warn!("{}", warning);
        self.items.push(warning);
        Ok(())
    }

    pub fn extend(&mut self, other: Warnings) {
        self.items.extend(other.items);
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.items
    }
}

/// A successfully resolved model together with the warnings raised while
/// resolving it.
#[derive(Clone, Debug)]
pub struct Resolved<T> {
    pub model: T,
    pub warnings: Vec<Warning>,
}

impl<T> Resolved<T> {
    pub fn new(model: T, warnings: Warnings) -> Self {
        Self {
            model,
            warnings: warnings.into_vec(),
        }
    }

    /// Drops the warnings and returns the model.
    pub fn into_model(self) -> T {
        self.model
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

impl<T> Deref for Resolved<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.model
    }
}
