// Licensed under the Apache-2.0 license

//! Slave address placement.
//!
//! A slave with `address_size` word address bits occupies a window of
//! `2^(address_size + addr_lo)` bus bytes, where `addr_lo` is the number of
//! byte-select bits of the bus format. Base addresses must be aligned to
//! `2^addr_lo`.

use crate::node::{NodeShape, WbSlaveDesc};
use wbgen_common::{
    clog2, solve_addresses, AddressConflictError, AddressRange, AddressRequest, EntityPath, Result,
};

/// Lowest bus address bit, `clog2(port_size / granularity)`.
pub(crate) fn address_lo(format: &NodeShape) -> u32 {
    clog2(u64::from(format.select_bit_count()))
}

/// Resolves every slave's window, in declaration order.
pub(crate) fn solve_slave_windows(
    bus_path: &EntityPath,
    format: &NodeShape,
    slaves: &[WbSlaveDesc],
) -> Result<Vec<AddressRange>> {
    let addr_lo = address_lo(format);
    let requests = slaves
        .iter()
        .map(|slave| -> Result<AddressRequest> {
            let path = bus_path.join(slave.name.as_str());
            let size = slave
                .address_size
                .checked_add(addr_lo)
                .and_then(|bits| 1u64.checked_shl(bits))
                .ok_or_else(|| AddressConflictError::Overflow {
                    path: path.clone(),
                    address: slave.base_address.explicit().unwrap_or(0),
                    size: u64::MAX,
                })?;
            Ok(AddressRequest {
                path,
                address: slave.base_address,
                size,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    solve_addresses(1 << addr_lo, &requests)
}
