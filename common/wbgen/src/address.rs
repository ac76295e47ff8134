// Licensed under the Apache-2.0 license

//! Addresses, address ranges and the two-pass address allocator.
//!
//! Registers inside a register set and slaves on a bus are placed with the
//! same algorithm:
//!
//! 1. every explicitly addressed entity is placed first, in declaration
//!    order; its address must be aligned and its range must not intersect
//!    any range placed before it;
//! 2. every `Auto` entity is then placed in declaration order at the next
//!    free address, i.e. past the highest range placed so far.
//!
//! Running the explicit pass first means an explicit placement is never
//! shifted by an auto one declared earlier in the list.

use crate::error::{AddressConflictError, Result};
use crate::path::EntityPath;
use log::debug;
use serde::Deserialize;
use std::fmt;

/// Ceiling of log2, with `clog2(0) == clog2(1) == 0`.
///
/// # Examples
/// ```
/// use wbgen_common::clog2;
/// assert_eq!(clog2(1), 0);
/// assert_eq!(clog2(4), 2);
/// assert_eq!(clog2(5), 3);
/// ```
pub fn clog2(x: u64) -> u32 {
    if x <= 1 {
        0
    } else {
        64 - (x - 1).leading_zeros()
    }
}

//=============================================================================
// Address
//=============================================================================

/// Requested address of a register or slave.
///
/// In TOML descriptions an address is either an integer or the string
/// `"auto"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "AddressRepr")]
pub enum Address {
    Explicit(u64),
    #[default]
    Auto,
}

impl Address {
    pub fn explicit(&self) -> Option<u64> {
        match self {
            Address::Explicit(addr) => Some(*addr),
            Address::Auto => None,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Address::Auto)
    }
}

impl From<u64> for Address {
    fn from(addr: u64) -> Self {
        Address::Explicit(addr)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Explicit(addr) => write!(f, "0x{addr:08X}"),
            Address::Auto => f.write_str("auto"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AddressRepr {
    Int(u64),
    Text(String),
}

impl TryFrom<AddressRepr> for Address {
    type Error = String;

    fn try_from(repr: AddressRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            AddressRepr::Int(addr) => Ok(Address::Explicit(addr)),
            AddressRepr::Text(text) => {
                let text = text.trim();
                if text.eq_ignore_ascii_case("auto") {
                    Ok(Address::Auto)
                } else if let Some(hex) = text
                    .strip_prefix("0x")
                    .or_else(|| text.strip_prefix("0X"))
                {
                    u64::from_str_radix(&hex.replace('_', ""), 16)
                        .map(Address::Explicit)
                        .map_err(|e| format!("invalid address \"{text}\": {e}"))
                } else {
                    Err(format!(
                        "invalid address \"{text}\": expected an integer or \"auto\""
                    ))
                }
            }
        }
    }
}

//=============================================================================
// AddressRange
//=============================================================================

/// A closed byte-address interval `[start, end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressRange {
    pub start: u64,
    pub end: u64,
}

impl AddressRange {
    /// Range of `size` bytes starting at `start`. `size` must be non-zero and
    /// the range must not wrap; see [`AddressRange::checked_new`].
    pub fn new(start: u64, size: u64) -> Self {
        Self {
            start,
            end: start + (size - 1),
        }
    }

    pub fn checked_new(start: u64, size: u64) -> Option<Self> {
        let last = size.checked_sub(1)?;
        Some(Self {
            start,
            end: start.checked_add(last)?,
        })
    }

    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn contains(&self, addr: u64) -> bool {
        self.start <= addr && addr <= self.end
    }

    /// Closed-interval intersection test.
    pub fn overlaps(&self, other: &AddressRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:08X}, 0x{:08X}]", self.start, self.end)
    }
}

//=============================================================================
// AddressAllocator
//=============================================================================

/// An entity that has been given an address range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub path: EntityPath,
    pub range: AddressRange,
}

/// State of the two-pass placement.
#[derive(Clone, Debug)]
pub struct AddressAllocator {
    alignment: u64,
    placed: Vec<Placement>,
    /// `None` once the top of the address space has been used.
    next_free: Option<u64>,
}

impl AddressAllocator {
    /// `alignment` must be a power of two.
    pub fn new(alignment: u64) -> Self {
        debug_assert!(alignment.is_power_of_two());
        Self {
            alignment,
            placed: vec![],
            next_free: Some(0),
        }
    }

    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    /// First address past every range placed so far.
    pub fn next_free(&self) -> Option<u64> {
        self.next_free
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placed
    }

    /// Place `size` bytes at the requested `address`.
    pub fn place_explicit(
        &mut self,
        path: &EntityPath,
        address: u64,
        size: u64,
    ) -> Result<AddressRange> {
        if address & (self.alignment - 1) != 0 {
            return Err(AddressConflictError::Misaligned {
                path: path.clone(),
                address,
                alignment: self.alignment,
            }
            .into());
        }
        let range = AddressRange::checked_new(address, size).ok_or_else(|| {
            AddressConflictError::Overflow {
                path: path.clone(),
                address,
                size,
            }
        })?;
        if let Some(other) = self.placed.iter().find(|p| p.range.overlaps(&range)) {
            return Err(AddressConflictError::Overlap {
                path: path.clone(),
                range,
                other: other.path.clone(),
                other_range: other.range,
            }
            .into());
        }
        self.commit(path, range);
        Ok(range)
    }

    /// Place `size` bytes at the next free aligned address.
    pub fn place_auto(&mut self, path: &EntityPath, size: u64) -> Result<AddressRange> {
        let overflow = || AddressConflictError::Overflow {
            path: path.clone(),
            address: self.next_free.unwrap_or(u64::MAX),
            size,
        };
        let start = self
            .next_free
            .and_then(|addr| addr.checked_next_multiple_of(self.alignment))
            .ok_or_else(overflow)?;
        let range = AddressRange::checked_new(start, size).ok_or_else(overflow)?;
        debug_assert!(self.placed.iter().all(|p| !p.range.overlaps(&range)));
        self.commit(path, range);
        Ok(range)
    }

    fn commit(&mut self, path: &EntityPath, range: AddressRange) {
        debug!("placed {} at {}", path, range);
        let after = range.end.checked_add(1);
        self.next_free = match (self.next_free, after) {
            (Some(current), Some(after)) => Some(current.max(after)),
            _ => None,
        };
        self.placed.push(Placement {
            path: path.clone(),
            range,
        });
    }
}

/// One entity to be placed by [`solve_addresses`].
#[derive(Clone, Debug)]
pub struct AddressRequest {
    pub path: EntityPath,
    pub address: Address,
    pub size: u64,
}

/// Runs both passes over `requests` and returns the ranges in declaration
/// order.
pub fn solve_addresses(alignment: u64, requests: &[AddressRequest]) -> Result<Vec<AddressRange>> {
    let mut allocator = AddressAllocator::new(alignment);
    let mut ranges = vec![None; requests.len()];

    for (i, req) in requests.iter().enumerate() {
        if let Address::Explicit(addr) = req.address {
            ranges[i] = Some(allocator.place_explicit(&req.path, addr, req.size)?);
        }
    }
    for (i, req) in requests.iter().enumerate() {
        if req.address.is_auto() {
            ranges[i] = Some(allocator.place_auto(&req.path, req.size)?);
        }
    }

    Ok(ranges.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn req(name: &str, address: Address, size: u64) -> AddressRequest {
        AddressRequest {
            path: EntityPath::new("set").join(name),
            address,
            size,
        }
    }

    #[test]
    fn test_clog2() {
        assert_eq!(clog2(0), 0);
        assert_eq!(clog2(1), 0);
        assert_eq!(clog2(2), 1);
        assert_eq!(clog2(3), 2);
        assert_eq!(clog2(8), 3);
        assert_eq!(clog2(u64::MAX), 64);
    }

    #[test]
    fn test_range_overlap_is_closed() {
        let a = AddressRange::new(0, 4);
        assert!(a.overlaps(&AddressRange::new(3, 4)));
        assert!(!a.overlaps(&AddressRange::new(4, 4)));
        assert!(a.contains(3));
        assert!(!a.contains(4));
        assert_eq!(a.size(), 4);
        assert!(AddressRange::checked_new(u64::MAX, 2).is_none());
        assert!(AddressRange::checked_new(0, 0).is_none());
    }

    #[test]
    fn test_explicit_first_then_auto() {
        let ranges = solve_addresses(
            4,
            &[
                req("a", Address::Auto, 4),
                req("b", Address::Explicit(0x0), 4),
                req("c", Address::Auto, 4),
                req("d", Address::Explicit(0x10), 4),
            ],
        )
        .unwrap();
        let starts: Vec<u64> = ranges.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![0x14, 0x0, 0x18, 0x10]);
    }

    #[test]
    fn test_misaligned() {
        let err = solve_addresses(4, &[req("a", Address::Explicit(0x2), 4)]).unwrap_err();
        assert!(matches!(
            err,
            Error::AddressConflict(AddressConflictError::Misaligned {
                address: 0x2,
                alignment: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_overlap_names_both() {
        let err = solve_addresses(
            4,
            &[
                req("a", Address::Explicit(0x0), 0x10),
                req("b", Address::Explicit(0x8), 0x10),
            ],
        )
        .unwrap_err();
        match err {
            Error::AddressConflict(AddressConflictError::Overlap { path, other, .. }) => {
                assert_eq!(path.name(), "b");
                assert_eq!(other.name(), "a");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_auto_after_top_of_space_overflows() {
        let err = solve_addresses(
            1,
            &[
                req("top", Address::Explicit(u64::MAX), 1),
                req("next", Address::Auto, 1),
            ],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::AddressConflict(AddressConflictError::Overflow { .. })
        ));
    }

    #[test]
    fn test_deserialize_address() {
        #[derive(Deserialize)]
        struct Holder {
            address: Address,
        }
        let h: Holder = toml::from_str("address = 0x40").unwrap();
        assert_eq!(h.address, Address::Explicit(0x40));
        let h: Holder = toml::from_str("address = \"auto\"").unwrap();
        assert_eq!(h.address, Address::Auto);
        let h: Holder = toml::from_str("address = \"0x1000_0000\"").unwrap();
        assert_eq!(h.address, Address::Explicit(0x1000_0000));
        assert!(toml::from_str::<Holder>("address = \"somewhere\"").is_err());
    }
}
