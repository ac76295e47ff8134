// Licensed under the Apache-2.0 license

//! Wishbone bus model.
//!
//! A [`WbBusDesc`] lists masters and slaves with their port geometry.
//! [`WbBus::new`] resolves it:
//!
//! 1. node names and geometry are validated;
//! 2. the bus format is derived (widest port, finest granularity, largest
//!    address size) and every master gets its address shift;
//! 3. slaves without an explicit base address are placed after the explicit
//!    ones;
//! 4. the interconnect is planned from the node counts and the topology.
//!
//! Slaves built with [`WbSlaveDesc::from_register_set`] keep a handle to
//! their register set, so a backend can walk it with
//! [`WbSlave::walk_options`].

mod bus;
mod format;
mod node;
mod scripter;
mod solver;
mod topology;
mod validate;

pub use bus::{WbBus, WbBusDesc};
pub use format::Adapter;
pub use node::{NodeShape, WbMaster, WbMasterDesc, WbNode, WbSlave, WbSlaveDesc};
pub use scripter::{BusInfo, BusScripter, NodeInfo};
pub use topology::{Interconnect, MasterPort, Route, Topology};
