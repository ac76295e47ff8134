// Licensed under the Apache-2.0 license

//! Structural checks of a register set description.
//!
//! Runs before any address is assigned. Every failure is a
//! [`StructuralError`] naming the offending register or field.

use crate::desc::{FieldDesc, RegisterDesc, RegisterSetDesc};
use wbgen_common::naming::{check_name, check_unique_names};
use wbgen_common::{is_valid_port_size, EntityPath, Result, StructuralError};

pub(crate) fn validate_register_set(desc: &RegisterSetDesc) -> Result<()> {
    let set_path = EntityPath::new(desc.name.as_str());
    check_name(&set_path)?;

    if !is_valid_port_size(desc.port_size) {
        return Err(StructuralError::InvalidPortSize {
            path: set_path,
            port_size: desc.port_size,
        }
        .into());
    }

    check_unique_names(
        &set_path,
        "Register",
        desc.registers.iter().map(|r| r.name.as_str()),
    )?;

    for reg in &desc.registers {
        validate_register(&set_path.join(reg.name.as_str()), reg, desc.port_size)?;
    }
    Ok(())
}

fn validate_register(path: &EntityPath, reg: &RegisterDesc, port_size: u32) -> Result<()> {
    check_unique_names(path, "Field", reg.fields.iter().map(|f| f.name.as_str()))?;

    for field in &reg.fields {
        validate_field(&path.join(field.name.as_str()), field, port_size)?;
    }

    for (i, a) in reg.fields.iter().enumerate() {
        for b in &reg.fields[i + 1..] {
            let overlap = a.bits.mask() & b.bits.mask();
            if overlap != 0 {
                return Err(StructuralError::FieldOverlap {
                    path: path.clone(),
                    first: a.name.clone(),
                    second: b.name.clone(),
                    overlap,
                }
                .into());
            }
        }
    }
    Ok(())
}

fn validate_field(path: &EntityPath, field: &FieldDesc, port_size: u32) -> Result<()> {
    let bits = field.bits;
    if bits.hi < bits.lo {
        return Err(StructuralError::InvertedBitRange {
            path: path.clone(),
            hi: bits.hi,
            lo: bits.lo,
        }
        .into());
    }
    if bits.hi >= port_size {
        return Err(StructuralError::BitRangeOutOfBounds {
            path: path.clone(),
            hi: bits.hi,
            port_size,
        }
        .into());
    }

    let width = bits.width();
    if field.datatype.is_flag() && width != 1 {
        return Err(StructuralError::InvalidFlagWidth {
            path: path.clone(),
            datatype: field.datatype.to_string(),
            width,
        }
        .into());
    }
    if width > field.datatype.bits() {
        return Err(StructuralError::FieldWiderThanDatatype {
            path: path.clone(),
            width,
            datatype_bits: field.datatype.bits(),
        }
        .into());
    }

    let (min, max) = field.datatype.value_range(width);
    if field.default < min || field.default > max {
        return Err(StructuralError::DefaultOutOfRange {
            path: path.clone(),
            default: field.default,
            min,
            max,
        }
        .into());
    }
    Ok(())
}
