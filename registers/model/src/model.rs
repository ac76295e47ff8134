// Licensed under the Apache-2.0 license

//! The resolved, immutable register model.

use crate::access::{plan_accessors, shadow_needs, Accessor};
use crate::desc::{FieldDesc, RegisterDesc, RegisterSetDesc};
use crate::solver::{address_size, alignment_bits, solve_register_addresses, stride};
use crate::types::{
    BitRange, FieldFunction, FieldFunctions, FieldType, RegType, TriggerOn, WriteEventType,
};
use crate::validate::validate_register_set;
use crate::REGISTER_GRANULARITY;
use log::debug;
use wbgen_common::{Address, EntityPath, Resolved, Result, SolverConfig, Warnings};

//=============================================================================
// Field
//=============================================================================

/// A validated field with its accessor plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    path: EntityPath,
    desc: FieldDesc,
    accessors: Vec<Accessor>,
}

impl Field {
    pub fn path(&self) -> &EntityPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn description(&self) -> &str {
        &self.desc.description
    }

    pub fn comment(&self) -> Option<&str> {
        self.desc.comment.as_deref()
    }

    pub fn bits(&self) -> BitRange {
        self.desc.bits
    }

    pub fn datatype(&self) -> FieldType {
        self.desc.datatype
    }

    pub fn functions(&self) -> FieldFunctions {
        self.desc.functions
    }

    pub fn default(&self) -> i128 {
        self.desc.default
    }

    pub fn trigger_on(&self) -> TriggerOn {
        self.desc.trigger_on
    }

    /// Bit position of the field's LSB.
    pub fn offset(&self) -> u32 {
        self.desc.bits.lo
    }

    pub fn width(&self) -> u32 {
        self.desc.bits.width()
    }

    /// Register bits covered by the field.
    pub fn bitmask(&self) -> u64 {
        self.desc.bits.mask()
    }

    /// One bit per byte lane the field touches.
    pub fn lane_mask(&self) -> u64 {
        self.desc.bits.lane_mask()
    }

    /// Unshifted mask of the field's value bits.
    fn value_mask(&self) -> u64 {
        u64::MAX >> (64 - self.width())
    }

    /// Reset value as an unshifted bit pattern; negative defaults are stored
    /// in two's complement, truncated to the field width.
    pub fn default_pattern(&self) -> u64 {
        (self.desc.default as u64) & self.value_mask()
    }

    /// Places `value` into the field's bits of a register word. Bits of
    /// `value` above the field width are dropped.
    ///
    /// ```
    /// use wbgen_registers::{FieldDesc, RegisterDesc, RegisterSet, RegisterSetDesc};
    /// use wbgen_registers::types::{BitRange, FieldType, RegType};
    ///
    /// let set = RegisterSet::new(RegisterSetDesc::new("regs", 32).register(
    ///     RegisterDesc::new("config", RegType::WriteRead).field(FieldDesc::new(
    ///         "offset",
    ///         BitRange::new(19, 10),
    ///         FieldType::Signed16Bit,
    ///     )),
    /// ))
    /// .unwrap();
    /// let field = &set.registers()[0].fields()[0];
    /// assert_eq!(field.encode(-1), 0x000F_FC00);
    /// assert_eq!(field.decode(0x000F_FC00), -1);
    /// ```
    pub fn encode(&self, value: i128) -> u64 {
        ((value as u64) & self.value_mask()) << self.offset()
    }

    /// Extracts the field from a register word, sign-extending signed types.
    pub fn decode(&self, word: u64) -> i128 {
        let raw = (word >> self.offset()) & self.value_mask();
        let width = self.width();
        if self.datatype().is_signed() && (raw >> (width - 1)) & 1 == 1 {
            i128::from(raw) - (1i128 << width)
        } else {
            i128::from(raw)
        }
    }

    /// Legal accessors, in emission order.
    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }

    pub fn accessor(&self, function: FieldFunction) -> Option<&Accessor> {
        self.accessors.iter().find(|a| a.function() == function)
    }
}

//=============================================================================
// Register
//=============================================================================

/// A placed register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Register {
    path: EntityPath,
    name: String,
    description: String,
    comment: Option<String>,
    regtype: RegType,
    write_event: Option<WriteEventType>,
    requested_address: Address,
    relative_address: u64,
    absolute_address: u64,
    needs_shadow_read: bool,
    needs_shadow_write: bool,
    fields: Vec<Field>,
}

impl Register {
    pub fn path(&self) -> &EntityPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn regtype(&self) -> RegType {
        self.regtype
    }

    pub fn write_event(&self) -> Option<WriteEventType> {
        self.write_event
    }

    /// Address as written in the description.
    pub fn requested_address(&self) -> Address {
        self.requested_address
    }

    /// Byte offset from the register set's base.
    pub fn relative_address(&self) -> u64 {
        self.relative_address
    }

    pub fn absolute_address(&self) -> u64 {
        self.absolute_address
    }

    pub fn is_readable(&self) -> bool {
        self.regtype.is_readable()
    }

    pub fn is_writable(&self) -> bool {
        self.regtype.is_writable()
    }

    pub fn is_resettable(&self) -> bool {
        self.regtype.is_resettable()
    }

    pub fn is_strobed(&self) -> bool {
        self.regtype.is_strobed()
    }

    pub fn is_event(&self) -> bool {
        self.regtype.is_event()
    }

    pub fn needs_shadow_read(&self) -> bool {
        self.needs_shadow_read
    }

    pub fn needs_shadow_write(&self) -> bool {
        self.needs_shadow_write
    }

    /// Whether software keeps a shadow copy and dirty flag of this register.
    pub fn has_shadow(&self) -> bool {
        self.needs_shadow_read || self.needs_shadow_write
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Register word with every field at its default.
    pub fn reset_value(&self) -> u64 {
        self.fields
            .iter()
            .fold(0, |word, f| word | (f.default_pattern() << f.offset()))
    }
}

//=============================================================================
// RegisterSet
//=============================================================================

/// A validated register set with resolved addresses and accessor plans.
///
/// Constructed through [`RegisterSet::new`] or [`RegisterSet::with_config`];
/// a `RegisterSet` value is always internally consistent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterSet {
    name: String,
    base_address: Address,
    port_size: u32,
    address_size: u32,
    registers: Vec<Register>,
}

impl RegisterSet {
    /// Resolves `desc` with the default (warning-only) configuration.
    pub fn new(desc: RegisterSetDesc) -> Result<Resolved<RegisterSet>> {
        Self::with_config(desc, &SolverConfig::default())
    }

    /// Validates `desc`, places its registers and plans every field's
    /// accessors. Warnings promoted by `config` abort like any other error.
    pub fn with_config(
        desc: RegisterSetDesc,
        config: &SolverConfig,
    ) -> Result<Resolved<RegisterSet>> {
        validate_register_set(&desc)?;
        let addresses = solve_register_addresses(&desc)?;

        let set_path = EntityPath::new(desc.name.as_str());
        let mut warnings = Warnings::new();
        let mut registers = Vec::with_capacity(desc.registers.len());
        for (reg, address) in desc.registers.iter().zip(&addresses) {
            let path = set_path.join(reg.name.as_str());
            registers.push(resolve_register(
                path,
                reg,
                address.relative,
                address.absolute,
                config,
                &mut warnings,
            )?);
        }

        let set = RegisterSet {
            address_size: address_size(&addresses, desc.port_size),
            name: desc.name,
            base_address: desc.base_address,
            port_size: desc.port_size,
            registers,
        };
        debug!(
            "resolved register set {} with {} registers, address size {}",
            set.name,
            set.registers.len(),
            set.address_size
        );
        Ok(Resolved::new(set, warnings))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_address(&self) -> Address {
        self.base_address
    }

    /// Register width in bits.
    pub fn port_size(&self) -> u32 {
        self.port_size
    }

    pub fn granularity(&self) -> u32 {
        REGISTER_GRANULARITY
    }

    /// Bytes per register.
    pub fn stride(&self) -> u64 {
        stride(self.port_size)
    }

    /// Low byte-address bits that select a byte within a register word.
    pub fn address_alignment_bits(&self) -> u32 {
        alignment_bits(self.port_size)
    }

    /// Word address bits needed to reach every register.
    pub fn address_size(&self) -> u32 {
        self.address_size
    }

    /// `(lo, hi)` byte-address bits decoded by the register set.
    pub fn address_bit_range(&self) -> (u32, u32) {
        let lo = self.address_alignment_bits();
        (lo, lo + self.address_size - 1)
    }

    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    pub fn register(&self, name: &str) -> Option<&Register> {
        self.registers.iter().find(|r| r.name == name)
    }

    /// A set-wide reset writes the defaults of every resettable register.
    pub fn can_reset_all(&self) -> bool {
        self.registers
            .iter()
            .any(|r| r.is_resettable() && !r.fields.is_empty())
    }

    /// True if any register holds shadow state.
    pub fn can_flush_shadow_all(&self) -> bool {
        self.registers.iter().any(Register::has_shadow)
    }

    /// True if a register with shadow state can be read back, which
    /// includes event registers.
    pub fn can_load_shadow_all(&self) -> bool {
        self.registers
            .iter()
            .any(|r| r.has_shadow() && (r.is_readable() || r.is_event()))
    }
}

fn resolve_register(
    path: EntityPath,
    reg: &RegisterDesc,
    relative_address: u64,
    absolute_address: u64,
    config: &SolverConfig,
    warnings: &mut Warnings,
) -> Result<Register> {
    let fields = (0..reg.fields.len())
        .map(|index| {
            let desc = reg.fields[index].clone();
            Ok(Field {
                path: path.join(desc.name.as_str()),
                accessors: plan_accessors(&path, reg, index, config, warnings)?,
                desc,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let (needs_shadow_read, needs_shadow_write) = shadow_needs(reg);

    Ok(Register {
        path,
        name: reg.name.clone(),
        description: reg.description.clone(),
        comment: reg.comment.clone(),
        regtype: reg.regtype,
        write_event: reg.write_event,
        requested_address: reg.address,
        relative_address,
        absolute_address,
        needs_shadow_read,
        needs_shadow_write,
        fields,
    })
}
