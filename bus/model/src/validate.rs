// Licensed under the Apache-2.0 license

//! Structural checks of a bus description.

use crate::bus::WbBusDesc;
use crate::node::NodeShape;
use wbgen_common::naming::{check_name, check_unique_names};
use wbgen_common::{clog2, is_valid_port_size, EntityPath, Result, StructuralError};

pub(crate) fn validate_bus(desc: &WbBusDesc) -> Result<()> {
    let bus_path = EntityPath::new(desc.name.as_str());
    check_name(&bus_path)?;

    if desc.masters.is_empty() || desc.slaves.is_empty() {
        return Err(StructuralError::EmptyBus {
            path: bus_path,
            masters: desc.masters.len(),
            slaves: desc.slaves.len(),
        }
        .into());
    }

    check_unique_names(&bus_path, "Master", desc.masters.iter().map(|m| m.name.as_str()))?;
    check_unique_names(&bus_path, "Slave", desc.slaves.iter().map(|s| s.name.as_str()))?;

    let nodes = desc
        .masters
        .iter()
        .map(|m| (m.name.as_str(), m.shape()))
        .chain(desc.slaves.iter().map(|s| (s.name.as_str(), s.shape())));
    for (name, shape) in nodes {
        validate_shape(&bus_path.join(name), &shape)?;
    }
    Ok(())
}

fn validate_shape(path: &EntityPath, shape: &NodeShape) -> Result<()> {
    if !is_valid_port_size(shape.port_size) {
        return Err(StructuralError::InvalidPortSize {
            path: path.clone(),
            port_size: shape.port_size,
        }
        .into());
    }
    if !is_valid_port_size(shape.granularity) {
        return Err(StructuralError::InvalidGranularity {
            path: path.clone(),
            granularity: shape.granularity,
        }
        .into());
    }
    if shape.granularity > shape.port_size {
        return Err(StructuralError::GranularityExceedsPortSize {
            path: path.clone(),
            granularity: shape.granularity,
            port_size: shape.port_size,
        }
        .into());
    }
    // byte address bits must fit in 64
    let byte_address_bits = shape
        .address_size
        .checked_add(clog2(u64::from(shape.select_bit_count())));
    if shape.address_size == 0 || !matches!(byte_address_bits, Some(bits) if bits < 64) {
        return Err(StructuralError::InvalidAddressSize {
            path: path.clone(),
            address_size: shape.address_size,
        }
        .into());
    }
    Ok(())
}
