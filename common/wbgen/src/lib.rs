// Licensed under the Apache-2.0 license

//! Shared building blocks for the Wishbone register and bus model compiler.
//!
//! Both the register-set solver (`wbgen-registers`) and the bus solver
//! (`wbgen-bus`) resolve descriptions into frozen models. The pieces they have
//! in common live here:
//!
//! - [`error`]: the error taxonomy ([`Error`], [`StructuralError`],
//!   [`AccessError`], [`AddressConflictError`])
//! - [`warning`]: the non-fatal [`Warning`] channel and [`Resolved`] wrapper
//! - [`path`]: fully qualified entity names ([`EntityPath`])
//! - [`address`]: the [`Address`] sentinel and the two-pass [`AddressAllocator`]
//! - [`naming`]: identifier rules and source-code name conversion
//! - [`config`]: solver options ([`SolverConfig`])

pub mod address;
pub mod config;
pub mod error;
pub mod naming;
pub mod path;
pub mod warning;

pub use address::{
    clog2, solve_addresses, Address, AddressAllocator, AddressRange, AddressRequest, Placement,
};
pub use config::SolverConfig;
pub use error::{
    AccessError, AddressConflictError, Capability, Error, ErrorKind, Result, StructuralError,
};
pub use path::EntityPath;
pub use warning::{Resolved, Warning, Warnings};

/// Port sizes and granularities (in bits) a Wishbone node may use.
pub const VALID_PORT_SIZES: [u32; 4] = [8, 16, 32, 64];

/// Returns true if `bits` is one of [`VALID_PORT_SIZES`].
pub fn is_valid_port_size(bits: u32) -> bool {
    VALID_PORT_SIZES.contains(&bits)
}
