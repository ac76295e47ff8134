// Licensed under the Apache-2.0 license

//! Push-style interface to bus code generators.
//!
//! [`WbBus::walk`] calls `begin_bus`, then `master` for every master and
//! `slave` for every slave in declaration order, then `end_bus`.

use crate::bus::WbBus;
use crate::format::Adapter;
use crate::node::{NodeShape, WbMaster, WbSlave};
use crate::topology::{Interconnect, Topology};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusInfo<'a> {
    pub name: &'a str,
    pub topology: Topology,
    pub format: NodeShape,
    /// Byte-select bits below the bus word address.
    pub address_lo: u32,
    pub interconnect: &'a Interconnect,
}

/// A resolved node together with the adapter it needs, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeInfo<'a, T> {
    pub node: &'a T,
    pub adapter: Option<Adapter>,
}

/// Backend callbacks for [`WbBus::walk`].
pub trait BusScripter {
    fn begin_bus(&mut self, bus: &BusInfo<'_>);
    fn master(&mut self, master: &NodeInfo<'_, WbMaster>);
    fn slave(&mut self, slave: &NodeInfo<'_, WbSlave>);
    fn end_bus(&mut self) {}
}

impl WbBus {
    pub fn walk(&self, scripter: &mut impl BusScripter) {
        scripter.begin_bus(&BusInfo {
            name: self.name(),
            topology: self.topology(),
            format: self.bus_format(),
            address_lo: self.address_lo(),
            interconnect: self.interconnect(),
        });
        for master in self.masters() {
            scripter.master(&NodeInfo {
                node: master,
                adapter: self.adapter(master),
            });
        }
        for slave in self.slaves() {
            scripter.slave(&NodeInfo {
                node: slave,
                adapter: self.adapter(slave),
            });
        }
        scripter.end_bus();
    }
}
