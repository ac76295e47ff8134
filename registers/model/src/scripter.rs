// Licensed under the Apache-2.0 license

//! Push-style interface to code generators.
//!
//! [`RegisterSet::walk`] visits the resolved model in declaration order and
//! calls a [`RegisterScripter`] for every register, field and accessor:
//!
//! ```text
//! begin_register_set
//!   begin_register
//!     begin_field
//!       emit_read, emit_read_shadow, emit_overwrite, emit_write_masked,
//!       emit_read_modify_write, emit_write_shadow, emit_strobe
//!     end_field
//!   end_register
//! emit_reset_all, emit_flush_shadow_all, emit_load_shadow_all
//! end_register_set
//! ```
//!
//! Only the accessors and aggregates that are legal for the model are
//! emitted, so a backend never has to repeat the rule checks.

use crate::access::{Accessor, MergeKind};
use crate::model::{Field, Register, RegisterSet};
use crate::types::{FieldType, RegType, TriggerOn, WriteEventType};
use log::trace;
use wbgen_common::{AddressConflictError, Result};

/// Placement of a register set as seen by the generated code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Extra shift applied to word addresses; positive shifts right,
    /// negative shifts left. Usually the accessing master's address shift.
    pub address_shift: i32,
    /// Base address the set was placed at, overriding its own base address.
    pub base_address: Option<u64>,
}

impl WalkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address_shift(mut self, address_shift: i32) -> Self {
        self.address_shift = address_shift;
        self
    }

    pub fn base_address(mut self, base_address: u64) -> Self {
        self.base_address = Some(base_address);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterSetInfo<'a> {
    pub name: &'a str,
    pub port_size: u32,
    pub granularity: u32,
    /// Byte-address bits below the word address.
    pub address_alignment_bits: u32,
    pub address_size: u32,
    pub address_shift: i32,
    pub base_address: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterInfo<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub comment: Option<&'a str>,
    pub regtype: RegType,
    pub write_event: Option<WriteEventType>,
    pub absolute_address: u64,
    /// `absolute_address` without its alignment bits, then shifted by
    /// [`WalkOptions::address_shift`].
    pub word_address: u64,
    pub is_readable: bool,
    pub is_writable: bool,
    pub is_resettable: bool,
    pub is_strobed: bool,
    pub needs_shadow_read: bool,
    pub needs_shadow_write: bool,
    /// Either of the two above.
    pub needs_shadow: bool,
    pub reset_value: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub comment: Option<&'a str>,
    pub offset: u32,
    pub width: u32,
    pub bitmask: u64,
    /// Byte lanes holding the field. Strobed registers are written whole,
    /// so backends only use it for masked writes.
    pub lane_mask: u64,
    pub datatype: FieldType,
    pub default: i128,
    pub default_pattern: u64,
    pub trigger_on: TriggerOn,
}

/// Backend callbacks for [`RegisterSet::walk`].
///
/// The `begin_*` callbacks must be implemented; everything else defaults to
/// doing nothing.
pub trait RegisterScripter {
    fn begin_register_set(&mut self, set: &RegisterSetInfo<'_>);
    fn begin_register(&mut self, register: &RegisterInfo<'_>);
    fn begin_field(&mut self, field: &FieldInfo<'_>);

    fn emit_read(&mut self) {}
    /// The generated accessor may reload the shadow from hardware first.
    fn emit_read_shadow(&mut self) {}
    fn emit_overwrite(&mut self) {}
    fn emit_write_masked(&mut self, _lane_mask: u64) {}
    /// The generated accessor may skip the write-back when nothing changed.
    fn emit_read_modify_write(&mut self, _merge: MergeKind) {}
    /// The generated accessor may flush the shadow immediately.
    fn emit_write_shadow(&mut self) {}
    fn emit_strobe(&mut self, _handshake: bool) {}

    fn end_field(&mut self) {}
    fn end_register(&mut self) {}

    fn emit_reset_all(&mut self) {}
    fn emit_flush_shadow_all(&mut self) {}
    fn emit_load_shadow_all(&mut self) {}
    fn end_register_set(&mut self) {}
}

fn shift_word(word: u64, shift: i32) -> u64 {
    let amount = shift.unsigned_abs().min(63);
    if shift >= 0 {
        word >> amount
    } else {
        word << amount
    }
}

impl RegisterSet {
    /// Drives `scripter` over the model.
    ///
    /// Fails only if `options` places the set so high that a register
    /// address no longer fits in 64 bits.
    pub fn walk(&self, options: &WalkOptions, scripter: &mut impl RegisterScripter) -> Result<()> {
        let base_address = options
            .base_address
            .or(self.base_address().explicit())
            .unwrap_or(0);

        scripter.begin_register_set(&RegisterSetInfo {
            name: self.name(),
            port_size: self.port_size(),
            granularity: self.granularity(),
            address_alignment_bits: self.address_alignment_bits(),
            address_size: self.address_size(),
            address_shift: options.address_shift,
            base_address,
        });

        for reg in self.registers() {
            let absolute_address = base_address
                .checked_add(reg.relative_address())
                .ok_or_else(|| AddressConflictError::Overflow {
                    path: reg.path().clone(),
                    address: base_address,
                    size: reg.relative_address() + self.stride(),
                })?;
            let word_address = shift_word(
                absolute_address >> self.address_alignment_bits(),
                options.address_shift,
            );
            trace!("walking {} at 0x{absolute_address:X}", reg.path());

            scripter.begin_register(&register_info(reg, absolute_address, word_address));
            for field in reg.fields() {
                scripter.begin_field(&field_info(field));
                for accessor in field.accessors() {
                    match *accessor {
                        Accessor::Read => scripter.emit_read(),
                        Accessor::ReadShadow => scripter.emit_read_shadow(),
                        Accessor::Overwrite => scripter.emit_overwrite(),
                        Accessor::WriteMasked { lane_mask } => scripter.emit_write_masked(lane_mask),
                        Accessor::ReadModifyWrite { merge } => {
                            scripter.emit_read_modify_write(merge)
                        }
                        Accessor::WriteShadow => scripter.emit_write_shadow(),
                        Accessor::Strobe { handshake } => scripter.emit_strobe(handshake),
                    }
                }
                scripter.end_field();
            }
            scripter.end_register();
        }

        if self.can_reset_all() {
            scripter.emit_reset_all();
        }
        if self.can_flush_shadow_all() {
            scripter.emit_flush_shadow_all();
        }
        if self.can_load_shadow_all() {
            scripter.emit_load_shadow_all();
        }
        scripter.end_register_set();
        Ok(())
    }
}

fn register_info(reg: &Register, absolute_address: u64, word_address: u64) -> RegisterInfo<'_> {
    RegisterInfo {
        name: reg.name(),
        description: reg.description(),
        comment: reg.comment(),
        regtype: reg.regtype(),
        write_event: reg.write_event(),
        absolute_address,
        word_address,
        is_readable: reg.is_readable(),
        is_writable: reg.is_writable(),
        is_resettable: reg.is_resettable(),
        is_strobed: reg.is_strobed(),
        needs_shadow_read: reg.needs_shadow_read(),
        needs_shadow_write: reg.needs_shadow_write(),
        needs_shadow: reg.has_shadow(),
        reset_value: reg.reset_value(),
    }
}

fn field_info(field: &Field) -> FieldInfo<'_> {
    FieldInfo {
        name: field.name(),
        description: field.description(),
        comment: field.comment(),
        offset: field.offset(),
        width: field.width(),
        bitmask: field.bitmask(),
        lane_mask: field.lane_mask(),
        datatype: field.datatype(),
        default: field.default(),
        default_pattern: field.default_pattern(),
        trigger_on: field.trigger_on(),
    }
}
