// Licensed under the Apache-2.0 license

//! Common bus format and width adapters.

use crate::node::{NodeShape, WbMasterDesc, WbSlaveDesc};
use log::debug;
use wbgen_common::{clog2, EntityPath, Result, SolverConfig, Warning, Warnings};

/// Width/granularity converter between a node and the shared bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Adapter {
    /// Interface facing the node.
    pub node: NodeShape,
    /// Interface facing the bus.
    pub bus: NodeShape,
}

/// Widest port, finest granularity and largest address size of all nodes.
pub(crate) fn bus_format(masters: &[WbMasterDesc], slaves: &[WbSlaveDesc]) -> NodeShape {
    let shapes = || {
        masters
            .iter()
            .map(WbMasterDesc::shape)
            .chain(slaves.iter().map(WbSlaveDesc::shape))
    };
    let format = NodeShape::new(
        shapes().map(|s| s.port_size).max().unwrap_or(8),
        shapes().map(|s| s.granularity).min().unwrap_or(8),
        shapes().map(|s| s.address_size).max().unwrap_or(1),
    );
    debug!("bus format is {format}");
    format
}

/// Warns when the narrowest master address cannot reach every slave address.
pub(crate) fn check_address_sizes(
    path: &EntityPath,
    masters: &[WbMasterDesc],
    slaves: &[WbSlaveDesc],
    config: &SolverConfig,
    warnings: &mut Warnings,
) -> Result<()> {
    let smallest_master = masters.iter().map(|m| m.address_size).min();
    let largest_slave = slaves.iter().map(|s| s.address_size).max();
    if let (Some(smallest_master), Some(largest_slave)) = (smallest_master, largest_slave) {
        if smallest_master < largest_slave {
            warnings.record(
                Warning::AddressSizeMismatch {
                    path: path.clone(),
                    smallest_master,
                    largest_slave,
                },
                config,
            )?;
        }
    }
    Ok(())
}

/// The adapter `node` needs, if its data format differs from `bus`.
pub(crate) fn adapter_for(node: NodeShape, bus: NodeShape) -> Option<Adapter> {
    if node.same_format(&bus) {
        None
    } else {
        Some(Adapter { node, bus })
    }
}

/// `log2(bus port size / master port size)`.
pub(crate) fn address_shift(bus: &NodeShape, master: &NodeShape) -> u32 {
    clog2(u64::from(bus.port_size / master.port_size))
}
