// Licensed under the Apache-2.0 license

//! Register sets for Wishbone slaves.
//!
//! A [`RegisterSetDesc`] describes equally sized registers and the fields
//! inside them. [`RegisterSet::new`] turns it into a resolved model:
//!
//! 1. the description is validated (names, bit ranges, defaults);
//! 2. registers without an explicit address are placed after the explicit
//!    ones;
//! 3. every field's requested functions are checked against its register
//!    type and turned into [`Accessor`]s.
//!
//! Code generators consume the result through [`RegisterSet::walk`] and a
//! [`RegisterScripter`] implementation.

mod access;
mod desc;
mod model;
mod scripter;
mod solver;
pub mod types;
mod validate;

pub use access::{Accessor, MergeKind, ACCESSOR_ORDER};
pub use desc::{FieldDesc, RegisterDesc, RegisterSetDesc};
pub use model::{Field, Register, RegisterSet};
pub use scripter::{FieldInfo, RegisterInfo, RegisterScripter, RegisterSetInfo, WalkOptions};

/// Register sets always use byte granularity.
pub const REGISTER_GRANULARITY: u32 = 8;
