// Licensed under the Apache-2.0 license

use crate::format::{address_shift, adapter_for, bus_format, check_address_sizes, Adapter};
use crate::node::{NodeShape, WbMaster, WbMasterDesc, WbNode, WbSlave, WbSlaveDesc};
use crate::solver::solve_slave_windows;
use crate::topology::{Interconnect, Topology};
use crate::validate::validate_bus;
use log::debug;
use serde::Deserialize;
use wbgen_common::{EntityPath, Resolved, Result, SolverConfig, Warnings};

/// Unresolved bus: its nodes in declaration order and a topology.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WbBusDesc {
    pub name: String,
    #[serde(default)]
    pub masters: Vec<WbMasterDesc>,
    #[serde(default)]
    pub slaves: Vec<WbSlaveDesc>,
    #[serde(default)]
    pub topology: Topology,
}

impl WbBusDesc {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            masters: vec![],
            slaves: vec![],
            topology: Topology::default(),
        }
    }

    pub fn master(mut self, master: WbMasterDesc) -> Self {
        self.masters.push(master);
        self
    }

    pub fn slave(mut self, slave: WbSlaveDesc) -> Self {
        self.slaves.push(slave);
        self
    }

    pub fn topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// Parse a description from TOML text.
    ///
    /// Slaves loaded this way carry no register set; attach one with
    /// [`WbSlaveDesc::from_register_set`] when building in code.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Shorthand for [`WbBus::with_config`].
    pub fn resolve(self, config: &SolverConfig) -> Result<Resolved<WbBus>> {
        WbBus::with_config(self, config)
    }
}

/// A resolved Wishbone bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WbBus {
    name: String,
    topology: Topology,
    bus_format: NodeShape,
    masters: Vec<WbMaster>,
    slaves: Vec<WbSlave>,
    interconnect: Interconnect,
}

impl WbBus {
    /// Resolves `desc` with the default (warning-only) configuration.
    pub fn new(desc: WbBusDesc) -> Result<Resolved<WbBus>> {
        Self::with_config(desc, &SolverConfig::default())
    }

    /// Validates `desc`, derives the bus format, places the slaves and plans
    /// the interconnect.
    pub fn with_config(desc: WbBusDesc, config: &SolverConfig) -> Result<Resolved<WbBus>> {
        validate_bus(&desc)?;

        let bus_path = EntityPath::new(desc.name.as_str());
        let mut warnings = Warnings::new();
        let format = bus_format(&desc.masters, &desc.slaves);
        check_address_sizes(&bus_path, &desc.masters, &desc.slaves, config, &mut warnings)?;
        let windows = solve_slave_windows(&bus_path, &format, &desc.slaves)?;

        let masters: Vec<WbMaster> = desc
            .masters
            .iter()
            .map(|m| WbMaster {
                path: bus_path.join(m.name.as_str()),
                shape: m.shape(),
                address_shift: address_shift(&format, &m.shape()),
            })
            .collect();
        let slaves: Vec<WbSlave> = desc
            .slaves
            .into_iter()
            .zip(windows)
            .map(|(s, window)| {
                debug!("slave {} placed at {}", s.name, window);
                WbSlave {
                    path: bus_path.join(s.name.as_str()),
                    shape: s.shape(),
                    requested_address: s.base_address,
                    window,
                    register_set: s.register_set,
                }
            })
            .collect();
        let interconnect = Interconnect::plan(desc.topology, &masters, &slaves);

        let bus = WbBus {
            name: desc.name,
            topology: desc.topology,
            bus_format: format,
            masters,
            slaves,
            interconnect,
        };
        debug!(
            "resolved bus {} ({}) with {} masters and {} slaves",
            bus.name,
            bus.topology,
            bus.masters.len(),
            bus.slaves.len()
        );
        Ok(Resolved::new(bus, warnings))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Shape every node is adapted to.
    pub fn bus_format(&self) -> NodeShape {
        self.bus_format
    }

    /// `clog2(port_size / granularity)` of the bus format.
    pub fn address_lo(&self) -> u32 {
        crate::solver::address_lo(&self.bus_format)
    }

    pub fn masters(&self) -> &[WbMaster] {
        &self.masters
    }

    pub fn slaves(&self) -> &[WbSlave] {
        &self.slaves
    }

    pub fn master(&self, name: &str) -> Option<&WbMaster> {
        self.masters.iter().find(|m| m.name() == name)
    }

    pub fn slave(&self, name: &str) -> Option<&WbSlave> {
        self.slaves.iter().find(|s| s.name() == name)
    }

    /// The width adapter `node` needs to join this bus, if any.
    pub fn adapter(&self, node: &impl WbNode) -> Option<Adapter> {
        adapter_for(node.shape(), self.bus_format)
    }

    pub fn interconnect(&self) -> &Interconnect {
        &self.interconnect
    }

    /// The slave whose window holds bus byte address `address`.
    pub fn slave_at(&self, address: u64) -> Option<&WbSlave> {
        self.slaves.iter().find(|s| s.window().contains(address))
    }
}
