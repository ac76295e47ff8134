// Licensed under the Apache-2.0 license

//! Wishbone masters and slaves.

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use wbgen_common::{clog2, Address, AddressRange, EntityPath};
use wbgen_registers::{RegisterSet, WalkOptions, REGISTER_GRANULARITY};

/// Data and address geometry of a Wishbone port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeShape {
    /// Data width in bits.
    pub port_size: u32,
    /// Smallest addressable unit in bits.
    pub granularity: u32,
    /// Number of word address bits.
    pub address_size: u32,
}

impl NodeShape {
    pub fn new(port_size: u32, granularity: u32, address_size: u32) -> Self {
        Self {
            port_size,
            granularity,
            address_size,
        }
    }

    /// Number of `sel` lines, one per granule.
    pub fn select_bit_count(&self) -> u32 {
        self.port_size / self.granularity
    }

    /// `(lo, hi)` indices of the address signal.
    ///
    /// A 32-bit port with 8-bit granularity drops two address LSBs, so with
    /// 16 addressable words its address bits are `[5:2]`:
    ///
    /// ```
    /// use wbgen_bus::NodeShape;
    /// assert_eq!(NodeShape::new(32, 8, 4).address_bit_range(), (2, 5));
    /// ```
    pub fn address_bit_range(&self) -> (u32, u32) {
        let lo = clog2(u64::from(self.select_bit_count()));
        (lo, lo.saturating_add(self.address_size.max(1) - 1))
    }

    /// Same data width and granularity; address size is not compared.
    pub fn same_format(&self, other: &NodeShape) -> bool {
        self.port_size == other.port_size && self.granularity == other.granularity
    }
}

impl fmt::Display for NodeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} bit, {} address bits",
            self.port_size, self.granularity, self.address_size
        )
    }
}

/// Common view of resolved masters and slaves.
pub trait WbNode {
    fn name(&self) -> &str;
    fn shape(&self) -> NodeShape;
}

//=============================================================================
// Descriptions
//=============================================================================

/// Unresolved bus master.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WbMasterDesc {
    pub name: String,
    pub port_size: u32,
    pub granularity: u32,
    pub address_size: u32,
}

impl WbMasterDesc {
    pub fn new(name: &str, port_size: u32, granularity: u32, address_size: u32) -> Self {
        Self {
            name: name.to_string(),
            port_size,
            granularity,
            address_size,
        }
    }

    pub fn shape(&self) -> NodeShape {
        NodeShape::new(self.port_size, self.granularity, self.address_size)
    }
}

/// Unresolved bus slave.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WbSlaveDesc {
    pub name: String,
    pub port_size: u32,
    pub granularity: u32,
    pub address_size: u32,
    /// Absolute base address on the bus, or `Auto`.
    #[serde(default)]
    pub base_address: Address,
    /// Register set implemented by this slave, if any.
    #[serde(skip)]
    pub register_set: Option<Arc<RegisterSet>>,
}

impl WbSlaveDesc {
    pub fn new(
        name: &str,
        port_size: u32,
        granularity: u32,
        address_size: u32,
        base_address: impl Into<Address>,
    ) -> Self {
        Self {
            name: name.to_string(),
            port_size,
            granularity,
            address_size,
            base_address: base_address.into(),
            register_set: None,
        }
    }

    /// A slave exposing `register_set`, sized to reach all of its registers.
    ///
    /// The slave takes the set's name, port size and base address; its
    /// granularity is always 8 bits.
    pub fn from_register_set(register_set: Arc<RegisterSet>) -> Self {
        let (lo, hi) = register_set.address_bit_range();
        Self {
            name: register_set.name().to_string(),
            port_size: register_set.port_size(),
            granularity: REGISTER_GRANULARITY,
            address_size: hi - lo + 1,
            base_address: register_set.base_address(),
            register_set: Some(register_set),
        }
    }

    pub fn shape(&self) -> NodeShape {
        NodeShape::new(self.port_size, self.granularity, self.address_size)
    }
}

//=============================================================================
// Resolved nodes
//=============================================================================

/// A master connected to a resolved bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WbMaster {
    pub(crate) path: EntityPath,
    pub(crate) shape: NodeShape,
    pub(crate) address_shift: u32,
}

impl WbMaster {
    pub fn path(&self) -> &EntityPath {
        &self.path
    }

    pub fn port_size(&self) -> u32 {
        self.shape.port_size
    }

    pub fn granularity(&self) -> u32 {
        self.shape.granularity
    }

    pub fn address_size(&self) -> u32 {
        self.shape.address_size
    }

    /// Address bits the master's narrower data port must be shifted by to
    /// form a bus address: `log2(bus port size / master port size)`.
    pub fn address_shift(&self) -> u32 {
        self.address_shift
    }
}

impl WbNode for WbMaster {
    fn name(&self) -> &str {
        self.path.name()
    }

    fn shape(&self) -> NodeShape {
        self.shape
    }
}

/// A slave with its resolved address window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WbSlave {
    pub(crate) path: EntityPath,
    pub(crate) shape: NodeShape,
    pub(crate) requested_address: Address,
    pub(crate) window: AddressRange,
    pub(crate) register_set: Option<Arc<RegisterSet>>,
}

impl WbSlave {
    pub fn path(&self) -> &EntityPath {
        &self.path
    }

    pub fn port_size(&self) -> u32 {
        self.shape.port_size
    }

    pub fn granularity(&self) -> u32 {
        self.shape.granularity
    }

    pub fn address_size(&self) -> u32 {
        self.shape.address_size
    }

    pub fn requested_address(&self) -> Address {
        self.requested_address
    }

    pub fn base_address(&self) -> u64 {
        self.window.start
    }

    /// Bus byte addresses decoded to this slave.
    pub fn window(&self) -> AddressRange {
        self.window
    }

    pub fn register_set(&self) -> Option<&Arc<RegisterSet>> {
        self.register_set.as_ref()
    }

    /// Options for walking this slave's register set as seen from `master`.
    pub fn walk_options(&self, master: &WbMaster) -> WalkOptions {
        WalkOptions::new()
            .base_address(self.window.start)
            .address_shift(master.address_shift as i32)
    }
}

impl WbNode for WbSlave {
    fn name(&self) -> &str {
        self.path.name()
    }

    fn shape(&self) -> NodeShape {
        self.shape
    }
}
