// Licensed under the Apache-2.0 license

//! Error taxonomy shared by the register and bus solvers.
//!
//! All errors are raised synchronously while a model is constructed and abort
//! that construction. There is nothing to retry: the solvers are pure, so the
//! only recovery is fixing the description.

use crate::address::AddressRange;
use crate::path::EntityPath;
use crate::warning::Warning;
use std::fmt;
use thiserror::Error;

/// Discriminant of [`Error`], for callers that only need to branch on the
/// failure class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Structural,
    Access,
    AddressConflict,
    Description,
}

/// Top-level error returned by every model constructor.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    AddressConflict(#[from] AddressConflictError),
    /// A TOML description could not be deserialized.
    #[error("invalid description: {0}")]
    Description(#[from] toml::de::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Structural(_) => ErrorKind::Structural,
            Error::Access(_) => ErrorKind::Access,
            Error::AddressConflict(_) => ErrorKind::AddressConflict,
            Error::Description(_) => ErrorKind::Description,
        }
    }

    /// Fully qualified name of the offending entity, if there is one.
    pub fn path(&self) -> Option<&EntityPath> {
        match self {
            Error::Structural(e) => e.path(),
            Error::Access(e) => Some(&e.path),
            Error::AddressConflict(e) => Some(e.path()),
            Error::Description(_) => None,
        }
    }
}

/// Result type for model construction.
pub type Result<T> = std::result::Result<T, Error>;

//=============================================================================
// StructuralError
//=============================================================================

/// Illegal shape of a description: names, bit ranges, port geometry, defaults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("{kind} names in {path} are not unique: \"{name}\" is used more than once")]
    DuplicateName {
        path: EntityPath,
        kind: &'static str,
        name: String,
    },
    #[error(
        "{kind} names \"{first}\" and \"{second}\" in {path} both map to the identifier \"{identifier}\""
    )]
    NameCollision {
        path: EntityPath,
        kind: &'static str,
        first: String,
        second: String,
        identifier: String,
    },
    #[error("invalid name for {path}: {reason}")]
    InvalidName {
        path: EntityPath,
        reason: &'static str,
    },
    #[error("{path} has invalid port size {port_size} (must be 8, 16, 32 or 64)")]
    InvalidPortSize { path: EntityPath, port_size: u32 },
    #[error("{path} has invalid granularity {granularity} (must be 8, 16, 32 or 64)")]
    InvalidGranularity { path: EntityPath, granularity: u32 },
    #[error(
        "{path} has invalid address size {address_size} (must be at least 1, with byte addresses below 64 bits)"
    )]
    InvalidAddressSize { path: EntityPath, address_size: u32 },
    #[error("{path} has granularity {granularity} larger than its port size {port_size}")]
    GranularityExceedsPortSize {
        path: EntityPath,
        granularity: u32,
        port_size: u32,
    },
    #[error("bus {path} needs at least one master and one slave ({masters} masters, {slaves} slaves)")]
    EmptyBus {
        path: EntityPath,
        masters: usize,
        slaves: usize,
    },
    #[error("field {path} has an inverted bit range [{hi}:{lo}]")]
    InvertedBitRange { path: EntityPath, hi: u32, lo: u32 },
    #[error("field {path} uses bit {hi}, but the register is only {port_size} bits wide")]
    BitRangeOutOfBounds {
        path: EntityPath,
        hi: u32,
        port_size: u32,
    },
    #[error("fields {first} and {second} of {path} overlap (bits 0x{overlap:X})")]
    FieldOverlap {
        path: EntityPath,
        first: String,
        second: String,
        overlap: u64,
    },
    #[error("field {path} of type {datatype} must be exactly 1 bit wide, not {width}")]
    InvalidFlagWidth {
        path: EntityPath,
        datatype: String,
        width: u32,
    },
    #[error("field {path} is {width} bits wide, which does not fit its {datatype_bits}-bit datatype")]
    FieldWiderThanDatatype {
        path: EntityPath,
        width: u32,
        datatype_bits: u32,
    },
    #[error("default value {default} of field {path} is out of range [{min}, {max}]")]
    DefaultOutOfRange {
        path: EntityPath,
        default: i128,
        min: i128,
        max: i128,
    },
    /// A warning the caller asked to treat as fatal through
    /// [`SolverConfig`](crate::SolverConfig).
    #[error("{0} (promoted to an error)")]
    WarningPromoted(Warning),
}

impl StructuralError {
    pub fn path(&self) -> Option<&EntityPath> {
        match self {
            StructuralError::DuplicateName { path, .. }
            | StructuralError::NameCollision { path, .. }
            | StructuralError::InvalidName { path, .. }
            | StructuralError::InvalidPortSize { path, .. }
            | StructuralError::InvalidGranularity { path, .. }
            | StructuralError::InvalidAddressSize { path, .. }
            | StructuralError::GranularityExceedsPortSize { path, .. }
            | StructuralError::EmptyBus { path, .. }
            | StructuralError::InvertedBitRange { path, .. }
            | StructuralError::BitRangeOutOfBounds { path, .. }
            | StructuralError::FieldOverlap { path, .. }
            | StructuralError::InvalidFlagWidth { path, .. }
            | StructuralError::FieldWiderThanDatatype { path, .. }
            | StructuralError::DefaultOutOfRange { path, .. } => Some(path),
            StructuralError::WarningPromoted(warning) => Some(warning.path()),
        }
    }
}

//=============================================================================
// AccessError
//=============================================================================

/// Register capability an accessor function depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Register must be readable (Read, WriteRead) or of event type.
    Read,
    /// Register must be writable (Write, WriteRead).
    Write,
    /// Register must be writable and must not be strobed.
    UnstrobedWrite,
    /// Register must be both readable and writable.
    ReadWrite,
    /// Register must not be of event type.
    NonEvent,
    /// Register must be strobed (Strobe, Handshake).
    Strobe,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::Read => "read access",
            Capability::Write => "write access",
            Capability::UnstrobedWrite => "non-strobed write access",
            Capability::ReadWrite => "write+read access",
            Capability::NonEvent => "a non-event register type",
            Capability::Strobe => "strobe access",
        };
        f.write_str(s)
    }
}

/// A field requests an accessor its register type cannot support.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field {path} cannot use {function} (register needs {required})")]
pub struct AccessError {
    pub path: EntityPath,
    pub function: String,
    pub required: Capability,
}

//=============================================================================
// AddressConflictError
//=============================================================================

/// Misaligned or overlapping register/slave addresses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressConflictError {
    #[error("address 0x{address:08X} of {path} is not aligned to {alignment} bytes")]
    Misaligned {
        path: EntityPath,
        address: u64,
        alignment: u64,
    },
    #[error("address range {range} of {path} overlaps with range {other_range} of {other}")]
    Overlap {
        path: EntityPath,
        range: AddressRange,
        other: EntityPath,
        other_range: AddressRange,
    },
    #[error("{path} does not fit in the address space (base 0x{address:X}, size 0x{size:X})")]
    Overflow {
        path: EntityPath,
        address: u64,
        size: u64,
    },
}

impl AddressConflictError {
    pub fn path(&self) -> &EntityPath {
        match self {
            AddressConflictError::Misaligned { path, .. }
            | AddressConflictError::Overlap { path, .. }
            | AddressConflictError::Overflow { path, .. } => path,
        }
    }
}
