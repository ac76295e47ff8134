// Licensed under the Apache-2.0 license

//! Enumerations and small value types shared by descriptions and the
//! resolved model.
//!
//! ## Register types
//!
//! | [`RegType`]  | readable | writable | resettable | strobed | event |
//! |--------------|----------|----------|------------|---------|-------|
//! | `Write`      |          | x        | x          |         |       |
//! | `Read`       | x        |          |            |         |       |
//! | `WriteRead`  | x        | x        | x          |         |       |
//! | `Strobe`     |          |          |            | x       |       |
//! | `Handshake`  |          |          |            | x       |       |
//! | `ReadEvent`  |          |          |            |         | x     |

use serde::Deserialize;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

//=============================================================================
// FieldType - datatype of a field
//=============================================================================

/// Datatype a field is exposed as by software backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Display, EnumIter)]
pub enum FieldType {
    Unsigned8Bit,
    Unsigned16Bit,
    Unsigned32Bit,
    Unsigned64Bit,
    Signed8Bit,
    Signed16Bit,
    Signed32Bit,
    Signed64Bit,
    /// Single-bit flag.
    Boolean,
    /// Single bit that is asserted for one cycle (or until acknowledged).
    Strobe,
}

impl FieldType {
    /// Width of the datatype in bits.
    pub fn bits(&self) -> u32 {
        match self {
            FieldType::Unsigned8Bit | FieldType::Signed8Bit => 8,
            FieldType::Unsigned16Bit | FieldType::Signed16Bit => 16,
            FieldType::Unsigned32Bit | FieldType::Signed32Bit => 32,
            FieldType::Unsigned64Bit | FieldType::Signed64Bit => 64,
            FieldType::Boolean | FieldType::Strobe => 1,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            FieldType::Signed8Bit
                | FieldType::Signed16Bit
                | FieldType::Signed32Bit
                | FieldType::Signed64Bit
        )
    }

    /// Boolean and Strobe fields must be exactly one bit wide.
    pub fn is_flag(&self) -> bool {
        matches!(self, FieldType::Boolean | FieldType::Strobe)
    }

    /// Inclusive range of values a field of this type can hold when it is
    /// `width` bits wide.
    pub fn value_range(&self, width: u32) -> (i128, i128) {
        let width = width.clamp(1, 64);
        if self.is_signed() {
            let half = 1i128 << (width - 1);
            (-half, half - 1)
        } else {
            (0, (1i128 << width) - 1)
        }
    }
}

//=============================================================================
// FieldFunction / FieldFunctions - requested accessor capabilities
//=============================================================================

/// An accessor capability a field may request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Display, EnumIter)]
pub enum FieldFunction {
    /// Read the field from hardware.
    Read,
    /// Read the field from the local shadow register.
    ReadShadow,
    /// Write the field by overwriting the whole register.
    Overwrite,
    /// Write the field using the bus byte-select mask.
    WriteMasked,
    /// Write the field into the local shadow register, flushed on request.
    WriteShadow,
    /// Write the field by read-modify-write.
    ReadModifyWrite,
    /// Assert the field's bit.
    Strobe,
}

impl FieldFunction {
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of [`FieldFunction`]s, backed by a bitmask.
///
/// ```
/// use wbgen_registers::types::{FieldFunction, FieldFunctions};
///
/// let functions = FieldFunction::Read | FieldFunction::ReadModifyWrite;
/// assert!(functions.contains(FieldFunction::Read));
/// assert!(!functions.contains(FieldFunction::Strobe));
/// assert_eq!(functions.len(), 2);
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "Vec<FieldFunction>")]
pub struct FieldFunctions(u8);

impl FieldFunctions {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn contains(&self, function: FieldFunction) -> bool {
        self.0 & function.bit() != 0
    }

    pub fn insert(&mut self, function: FieldFunction) {
        self.0 |= function.bit();
    }

    pub fn with(mut self, function: FieldFunction) -> Self {
        self.insert(function);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in declaration order of [`FieldFunction`].
    pub fn iter(&self) -> impl Iterator<Item = FieldFunction> + '_ {
        FieldFunction::iter().filter(move |f| self.contains(*f))
    }
}

impl fmt::Debug for FieldFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl From<FieldFunction> for FieldFunctions {
    fn from(function: FieldFunction) -> Self {
        Self(function.bit())
    }
}

impl FromIterator<FieldFunction> for FieldFunctions {
    fn from_iter<I: IntoIterator<Item = FieldFunction>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl From<Vec<FieldFunction>> for FieldFunctions {
    fn from(functions: Vec<FieldFunction>) -> Self {
        functions.into_iter().collect()
    }
}

impl BitOr for FieldFunction {
    type Output = FieldFunctions;

    fn bitor(self, rhs: Self) -> FieldFunctions {
        FieldFunctions::from(self).with(rhs)
    }
}

impl BitOr<FieldFunction> for FieldFunctions {
    type Output = FieldFunctions;

    fn bitor(self, rhs: FieldFunction) -> FieldFunctions {
        self.with(rhs)
    }
}

impl BitOr for FieldFunctions {
    type Output = FieldFunctions;

    fn bitor(self, rhs: Self) -> FieldFunctions {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign<FieldFunction> for FieldFunctions {
    fn bitor_assign(&mut self, rhs: FieldFunction) {
        self.insert(rhs);
    }
}

//=============================================================================
// FieldChangeType / TriggerOn - event detection
//=============================================================================

/// Change of a field's hardware input that latches an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Display, EnumIter)]
pub enum FieldChangeType {
    Rising,
    Falling,
    High,
    Low,
    /// Rising or falling edge.
    AnyChange,
}

/// Set of change conditions; only meaningful on `ReadEvent` registers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "Vec<FieldChangeType>")]
pub struct TriggerOn(u8);

impl TriggerOn {
    pub const NONE: TriggerOn = TriggerOn(0);
    pub const RISING: TriggerOn = TriggerOn(1);
    pub const FALLING: TriggerOn = TriggerOn(2);
    pub const HIGH: TriggerOn = TriggerOn(4);
    pub const LOW: TriggerOn = TriggerOn(8);
    pub const ANY_CHANGE: TriggerOn = TriggerOn(3);

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: TriggerOn) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl From<FieldChangeType> for TriggerOn {
    fn from(change: FieldChangeType) -> Self {
        match change {
            FieldChangeType::Rising => TriggerOn::RISING,
            FieldChangeType::Falling => TriggerOn::FALLING,
            FieldChangeType::High => TriggerOn::HIGH,
            FieldChangeType::Low => TriggerOn::LOW,
            FieldChangeType::AnyChange => TriggerOn::ANY_CHANGE,
        }
    }
}

impl From<Vec<FieldChangeType>> for TriggerOn {
    fn from(changes: Vec<FieldChangeType>) -> Self {
        changes
            .into_iter()
            .fold(TriggerOn::NONE, |acc, c| acc | TriggerOn::from(c))
    }
}

impl BitOr for TriggerOn {
    type Output = TriggerOn;

    fn bitor(self, rhs: Self) -> TriggerOn {
        TriggerOn(self.0 | rhs.0)
    }
}

//=============================================================================
// RegType / WriteEventType
//=============================================================================

/// Hardware access type of a register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Display, EnumIter)]
pub enum RegType {
    /// Write-only.
    Write,
    /// Read-only.
    Read,
    /// Writable, and can be read back from hardware.
    WriteRead,
    /// Only strobed bits, asserted for a single clock cycle.
    Strobe,
    /// Only strobed bits, asserted until acknowledged.
    Handshake,
    /// Read-only, latches events; cleared on read.
    ReadEvent,
}

impl RegType {
    pub fn is_readable(&self) -> bool {
        matches!(self, RegType::Read | RegType::WriteRead)
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, RegType::Write | RegType::WriteRead)
    }

    pub fn is_resettable(&self) -> bool {
        matches!(self, RegType::Write | RegType::WriteRead)
    }

    pub fn is_strobed(&self) -> bool {
        matches!(self, RegType::Strobe | RegType::Handshake)
    }

    pub fn is_handshake(&self) -> bool {
        matches!(self, RegType::Handshake)
    }

    pub fn is_event(&self) -> bool {
        matches!(self, RegType::ReadEvent)
    }
}

/// Strobe raised by hardware when software writes a register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Display, EnumIter)]
pub enum WriteEventType {
    /// Strobed for one cycle when the register is written.
    StrobeOnWrite,
    /// Strobed for one cycle when `cyc` goes low after the write.
    StrobeAfterWriteOnCycleEnd,
}

//=============================================================================
// BitRange
//=============================================================================

/// Inclusive bit range `[hi:lo]` of a field.
///
/// In TOML descriptions it is written `bits = [hi, lo]`, or `bits = [n]` for
/// a single bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "Vec<u32>")]
pub struct BitRange {
    pub hi: u32,
    pub lo: u32,
}

impl BitRange {
    pub fn new(hi: u32, lo: u32) -> Self {
        Self { hi, lo }
    }

    pub fn bit(bit: u32) -> Self {
        Self { hi: bit, lo: bit }
    }

    /// Number of bits; the range must not be inverted.
    pub fn width(&self) -> u32 {
        self.hi - self.lo + 1
    }

    /// Mask of the covered bits, i.e. `((1 << width) - 1) << lo`. Requires
    /// `hi < 64`.
    pub fn mask(&self) -> u64 {
        (u64::MAX >> (64 - self.width())) << self.lo
    }

    /// One bit per byte lane the range touches.
    pub fn lane_mask(&self) -> u64 {
        (self.lo / 8..=self.hi / 8).fold(0, |mask, lane| mask | (1 << lane))
    }
}

impl TryFrom<Vec<u32>> for BitRange {
    type Error = String;

    fn try_from(bits: Vec<u32>) -> Result<Self, Self::Error> {
        match bits.as_slice() {
            [bit] => Ok(BitRange::bit(*bit)),
            [hi, lo] => Ok(BitRange::new(*hi, *lo)),
            _ => Err(format!(
                "bits must be [hi, lo] or [bit], got {} entries",
                bits.len()
            )),
        }
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.hi, self.lo)
    }
}
