// Licensed under the Apache-2.0 license

//! Register address placement.
//!
//! Every register occupies one word of `stride = port_size / 8` bytes.
//! Addresses are relative to the register set's base address and must be
//! aligned to `2^clog2(stride)`.

use crate::desc::RegisterSetDesc;
use wbgen_common::{
    clog2, solve_addresses, AddressConflictError, AddressRequest, EntityPath, Result,
};

/// Relative and absolute address of one register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RegisterAddress {
    pub relative: u64,
    pub absolute: u64,
}

pub(crate) fn stride(port_size: u32) -> u64 {
    u64::from(port_size / 8)
}

pub(crate) fn alignment_bits(port_size: u32) -> u32 {
    clog2(stride(port_size))
}

/// Resolves the address of every register, in declaration order.
pub(crate) fn solve_register_addresses(desc: &RegisterSetDesc) -> Result<Vec<RegisterAddress>> {
    let set_path = EntityPath::new(desc.name.as_str());
    let stride = stride(desc.port_size);
    let requests: Vec<AddressRequest> = desc
        .registers
        .iter()
        .map(|reg| AddressRequest {
            path: set_path.join(reg.name.as_str()),
            address: reg.address,
            size: stride,
        })
        .collect();

    let ranges = solve_addresses(1 << alignment_bits(desc.port_size), &requests)?;

    // Until the set is placed on a bus its base counts as zero.
    let base = desc.base_address.explicit().unwrap_or(0);
    ranges
        .iter()
        .zip(&requests)
        .map(|(range, req)| {
            if base.checked_add(range.end).is_none() {
                return Err(AddressConflictError::Overflow {
                    path: req.path.clone(),
                    address: base,
                    size: range.end + 1,
                }
                .into());
            }
            Ok(RegisterAddress {
                relative: range.start,
                absolute: base + range.start,
            })
        })
        .collect()
}

/// Word address bits needed to reach the highest register; at least 1.
pub(crate) fn address_size(addresses: &[RegisterAddress], port_size: u32) -> u32 {
    let highest_word = addresses
        .iter()
        .map(|a| a.relative / stride(port_size))
        .max()
        .unwrap_or(0);
    clog2(highest_word + 1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desc::RegisterDesc;
    use crate::types::RegType;
    use wbgen_common::Error;

    fn relative(desc: &RegisterSetDesc) -> Vec<u64> {
        solve_register_addresses(desc)
            .unwrap()
            .iter()
            .map(|a| a.relative)
            .collect()
    }

    #[test]
    fn test_stride_and_alignment() {
        assert_eq!(stride(8), 1);
        assert_eq!(stride(64), 8);
        assert_eq!(alignment_bits(8), 0);
        assert_eq!(alignment_bits(16), 1);
        assert_eq!(alignment_bits(32), 2);
        assert_eq!(alignment_bits(64), 3);
    }

    #[test]
    fn test_auto_follows_explicit() {
        let desc = RegisterSetDesc::new("regs", 32)
            .register(RegisterDesc::new("a", RegType::Write))
            .register(RegisterDesc::new("b", RegType::Write).address(0x8))
            .register(RegisterDesc::new("c", RegType::Write));
        assert_eq!(relative(&desc), vec![0xC, 0x8, 0x10]);
    }

    #[test]
    fn test_absolute_adds_base() {
        let desc = RegisterSetDesc::new("regs", 16)
            .base_address(0x1000)
            .register(RegisterDesc::new("a", RegType::Write))
            .register(RegisterDesc::new("b", RegType::Write));
        let addrs = solve_register_addresses(&desc).unwrap();
        assert_eq!(addrs[1].relative, 0x2);
        assert_eq!(addrs[1].absolute, 0x1002);
    }

    #[test]
    fn test_misaligned_register() {
        let desc = RegisterSetDesc::new("regs", 32)
            .register(RegisterDesc::new("a", RegType::Write).address(0x6));
        let err = solve_register_addresses(&desc).unwrap_err();
        assert!(matches!(
            err,
            Error::AddressConflict(AddressConflictError::Misaligned { alignment: 4, .. })
        ));
        assert_eq!(err.path().unwrap().to_string(), "regs.a");
    }

    #[test]
    fn test_base_overflow() {
        let desc = RegisterSetDesc::new("regs", 32)
            .base_address(u64::MAX - 1)
            .register(RegisterDesc::new("a", RegType::Write));
        assert!(matches!(
            solve_register_addresses(&desc),
            Err(Error::AddressConflict(AddressConflictError::Overflow { .. }))
        ));
    }

    #[test]
    fn test_address_size() {
        let at = |relative| RegisterAddress {
            relative,
            absolute: relative,
        };
        assert_eq!(address_size(&[], 32), 1);
        assert_eq!(address_size(&[at(0)], 32), 1);
        assert_eq!(address_size(&[at(0), at(4)], 32), 1);
        assert_eq!(address_size(&[at(0), at(8)], 32), 2);
        assert_eq!(address_size(&[at(0x3C)], 32), 4);
        assert_eq!(address_size(&[at(0x40)], 32), 5);
    }
}
