// Licensed under the Apache-2.0 license

//! Field accessor rules.
//!
//! Every function a field requests is checked against the capabilities of
//! its register type. Legal requests become an [`Accessor`] a backend turns
//! into code; illegal ones abort with an [`AccessError`]. Two legal but
//! risky combinations produce a [`Warning`] instead.

use crate::desc::{FieldDesc, RegisterDesc};
use crate::types::{FieldFunction, FieldType, RegType};
use log::trace;
use std::fmt;
use wbgen_common::{
    AccessError, Capability, EntityPath, Result, SolverConfig, Warning, Warnings,
};

/// How a read-modify-write merges the new value into the register word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MergeKind {
    /// Set or clear the field's single bit.
    Or,
    /// Clear the field's bitmask, then OR in the shifted value.
    ShiftMask,
}

/// A legal accessor of a field, with the parameters a backend needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Accessor {
    /// Read the register from hardware and extract the field.
    Read,
    /// Return the field from the shadow copy, optionally reloading it first.
    ReadShadow,
    /// Write the field's value as the whole register word.
    Overwrite,
    /// Write using the bus byte-select signals.
    WriteMasked { lane_mask: u64 },
    /// Read, merge, and write back. Whether an unchanged word is still written
    /// ("lazy" mode) is an option of the generated accessor.
    ReadModifyWrite { merge: MergeKind },
    /// Merge into the shadow copy and mark it dirty; written on flush.
    WriteShadow,
    /// Assert the field's bit for one cycle, or until acknowledged.
    Strobe { handshake: bool },
}

impl Accessor {
    /// Function that requested this accessor.
    pub fn function(&self) -> FieldFunction {
        match self {
            Accessor::Read => FieldFunction::Read,
            Accessor::ReadShadow => FieldFunction::ReadShadow,
            Accessor::Overwrite => FieldFunction::Overwrite,
            Accessor::WriteMasked { .. } => FieldFunction::WriteMasked,
            Accessor::ReadModifyWrite { .. } => FieldFunction::ReadModifyWrite,
            Accessor::WriteShadow => FieldFunction::WriteShadow,
            Accessor::Strobe { .. } => FieldFunction::Strobe,
        }
    }
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::WriteMasked { lane_mask } => write!(f, "WriteMasked(0x{lane_mask:X})"),
            Accessor::ReadModifyWrite { merge } => write!(f, "ReadModifyWrite({merge:?})"),
            Accessor::Strobe { handshake: true } => f.write_str("Strobe(handshake)"),
            other => write!(f, "{}", other.function()),
        }
    }
}

/// Order in which requested functions are checked and accessors emitted.
pub const ACCESSOR_ORDER: [FieldFunction; 7] = [
    FieldFunction::Read,
    FieldFunction::ReadShadow,
    FieldFunction::Overwrite,
    FieldFunction::WriteMasked,
    FieldFunction::ReadModifyWrite,
    FieldFunction::WriteShadow,
    FieldFunction::Strobe,
];

fn can_read(regtype: RegType) -> bool {
    regtype.is_readable() || regtype.is_event()
}

/// Plans the accessors of `reg.fields[index]`.
pub(crate) fn plan_accessors(
    reg_path: &EntityPath,
    reg: &RegisterDesc,
    index: usize,
    config: &SolverConfig,
    warnings: &mut Warnings,
) -> Result<Vec<Accessor>> {
    let field = &reg.fields[index];
    let path = reg_path.join(field.name.as_str());
    let regtype = reg.regtype;
    let functions = field.functions;

    let deny = |function: FieldFunction, required: Capability| AccessError {
        path: path.clone(),
        function: function.to_string(),
        required,
    };

    let mut accessors = vec![];
    for function in ACCESSOR_ORDER {
        if !functions.contains(function) {
            continue;
        }
        let accessor = match function {
            FieldFunction::Read => {
                if !can_read(regtype) {
                    return Err(deny(function, Capability::Read).into());
                }
                Some(Accessor::Read)
            }
            FieldFunction::ReadShadow => {
                // Without a hardware read the shadow only mirrors writes.
                if functions.contains(FieldFunction::Read) {
                    if !can_read(regtype) {
                        return Err(deny(function, Capability::Read).into());
                    }
                    Some(Accessor::ReadShadow)
                } else {
                    None
                }
            }
            FieldFunction::Overwrite => {
                if !regtype.is_writable() {
                    return Err(deny(function, Capability::Write).into());
                }
                if reg.fields.len() > 1 {
                    warnings.record(
                        Warning::OverwriteMultiField {
                            path: path.clone(),
                            field_count: reg.fields.len(),
                        },
                        config,
                    )?;
                }
                Some(Accessor::Overwrite)
            }
            FieldFunction::WriteMasked => {
                if !regtype.is_writable() || regtype.is_strobed() {
                    return Err(deny(function, Capability::UnstrobedWrite).into());
                }
                let lane_mask = field.bits.lane_mask();
                let shared_with = lane_sharing_fields(reg, index);
                if !shared_with.is_empty() {
                    warnings.record(
                        Warning::MaskedWriteLaneShared {
                            path: path.clone(),
                            lane_mask,
                            shared_with,
                        },
                        config,
                    )?;
                }
                Some(Accessor::WriteMasked { lane_mask })
            }
            FieldFunction::ReadModifyWrite => {
                if regtype.is_event() {
                    return Err(deny(function, Capability::NonEvent).into());
                }
                if !(regtype.is_readable() && regtype.is_writable()) {
                    return Err(deny(function, Capability::ReadWrite).into());
                }
                Some(Accessor::ReadModifyWrite {
                    merge: merge_kind(field),
                })
            }
            FieldFunction::WriteShadow => {
                if !regtype.is_writable() {
                    return Err(deny(function, Capability::Write).into());
                }
                Some(Accessor::WriteShadow)
            }
            FieldFunction::Strobe => {
                if !regtype.is_strobed() {
                    return Err(deny(function, Capability::Strobe).into());
                }
                Some(Accessor::Strobe {
                    handshake: regtype.is_handshake(),
                })
            }
        };
        match accessor {
            Some(accessor) => {
                trace!("{path}: {accessor}");
                accessors.push(accessor);
            }
            None => trace!("{path}: {function} needs no accessor"),
        }
    }
    Ok(accessors)
}

fn merge_kind(field: &FieldDesc) -> MergeKind {
    if field.datatype == FieldType::Boolean {
        MergeKind::Or
    } else {
        MergeKind::ShiftMask
    }
}

/// Names of the other fields of `reg` that share a byte lane with
/// `reg.fields[index]`, in declaration order.
fn lane_sharing_fields(reg: &RegisterDesc, index: usize) -> Vec<String> {
    let lanes = reg.fields[index].bits.lane_mask();
    reg.fields
        .iter()
        .enumerate()
        .filter(|(i, other)| *i != index && other.bits.lane_mask() & lanes != 0)
        .map(|(_, other)| other.name.clone())
        .collect()
}

/// Shadow state a register needs: `(read, write)`.
pub(crate) fn shadow_needs(reg: &RegisterDesc) -> (bool, bool) {
    if reg.regtype.is_strobed() {
        return (false, false);
    }
    let any = |function| reg.fields.iter().any(|f| f.functions.contains(function));
    (
        any(FieldFunction::ReadShadow),
        any(FieldFunction::WriteShadow),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BitRange, FieldFunctions};
    use wbgen_common::{Error, StructuralError};

    fn register(regtype: RegType, functions: impl Into<FieldFunctions>) -> RegisterDesc {
        RegisterDesc::new("reg", regtype).field(
            FieldDesc::new("f", BitRange::bit(0), FieldType::Boolean).functions(functions),
        )
    }

    fn plan(reg: &RegisterDesc, index: usize) -> Result<(Vec<Accessor>, Vec<Warning>)> {
        let mut warnings = Warnings::new();
        let accessors = plan_accessors(
            &EntityPath::new("regs").join(reg.name.as_str()),
            reg,
            index,
            &SolverConfig::default(),
            &mut warnings,
        )?;
        Ok((accessors, warnings.into_vec()))
    }

    fn denied(reg: &RegisterDesc) -> AccessError {
        match plan(reg, 0) {
            Err(Error::Access(e)) => e,
            other => panic!("expected an access error, got {other:?}"),
        }
    }

    #[test]
    fn test_read_rules() {
        for regtype in [RegType::Read, RegType::WriteRead, RegType::ReadEvent] {
            let (accessors, _) = plan(&register(regtype, FieldFunction::Read), 0).unwrap();
            assert_eq!(accessors, vec![Accessor::Read]);
        }
        for regtype in [RegType::Write, RegType::Strobe, RegType::Handshake] {
            let err = denied(&register(regtype, FieldFunction::Read));
            assert_eq!(err.required, Capability::Read);
            assert_eq!(err.function, "Read");
        }
    }

    #[test]
    fn test_read_shadow() {
        let (accessors, _) = plan(
            &register(RegType::WriteRead, FieldFunction::Read | FieldFunction::ReadShadow),
            0,
        )
        .unwrap();
        assert_eq!(accessors, vec![Accessor::Read, Accessor::ReadShadow]);

        // shadow read-back of a write-only register
        let (accessors, _) = plan(
            &register(
                RegType::Write,
                FieldFunction::ReadShadow | FieldFunction::WriteShadow,
            ),
            0,
        )
        .unwrap();
        assert_eq!(accessors, vec![Accessor::WriteShadow]);
    }

    #[test]
    fn test_write_rules() {
        let (accessors, warnings) = plan(
            &register(
                RegType::Write,
                FieldFunction::Overwrite | FieldFunction::WriteMasked | FieldFunction::WriteShadow,
            ),
            0,
        )
        .unwrap();
        assert_eq!(
            accessors,
            vec![
                Accessor::Overwrite,
                Accessor::WriteMasked { lane_mask: 0x1 },
                Accessor::WriteShadow
            ]
        );
        assert!(warnings.is_empty());

        for function in [
            FieldFunction::Overwrite,
            FieldFunction::WriteShadow,
            FieldFunction::WriteMasked,
        ] {
            for regtype in [RegType::Read, RegType::ReadEvent, RegType::Strobe] {
                assert!(plan(&register(regtype, function), 0).is_err());
            }
        }
        assert_eq!(
            denied(&register(RegType::Strobe, FieldFunction::WriteMasked)).required,
            Capability::UnstrobedWrite
        );
    }

    #[test]
    fn test_read_modify_write() {
        let (accessors, _) =
            plan(&register(RegType::WriteRead, FieldFunction::ReadModifyWrite), 0).unwrap();
        assert_eq!(
            accessors,
            vec![Accessor::ReadModifyWrite {
                merge: MergeKind::Or
            }]
        );

        let reg = RegisterDesc::new("reg", RegType::WriteRead).field(
            FieldDesc::new("speed", BitRange::new(9, 0), FieldType::Unsigned16Bit)
                .functions(FieldFunction::ReadModifyWrite),
        );
        let (accessors, _) = plan(&reg, 0).unwrap();
        assert_eq!(
            accessors,
            vec![Accessor::ReadModifyWrite {
                merge: MergeKind::ShiftMask
            }]
        );

        assert_eq!(
            denied(&register(RegType::ReadEvent, FieldFunction::ReadModifyWrite)).required,
            Capability::NonEvent
        );
        assert_eq!(
            denied(&register(RegType::Write, FieldFunction::ReadModifyWrite)).required,
            Capability::ReadWrite
        );
    }

    #[test]
    fn test_strobe() {
        let (accessors, _) = plan(&register(RegType::Strobe, FieldFunction::Strobe), 0).unwrap();
        assert_eq!(accessors, vec![Accessor::Strobe { handshake: false }]);
        let (accessors, _) =
            plan(&register(RegType::Handshake, FieldFunction::Strobe), 0).unwrap();
        assert_eq!(accessors, vec![Accessor::Strobe { handshake: true }]);

        let err = denied(&register(RegType::Write, FieldFunction::Strobe));
        assert_eq!(err.required, Capability::Strobe);
        assert_eq!(
            err.to_string(),
            "field regs.reg.f cannot use Strobe (register needs strobe access)"
        );
    }

    fn two_field_register(functions: FieldFunctions) -> RegisterDesc {
        RegisterDesc::new("reg", RegType::Write)
            .field(
                FieldDesc::new("a", BitRange::new(3, 0), FieldType::Unsigned8Bit)
                    .functions(functions),
            )
            .field(FieldDesc::new("b", BitRange::new(11, 4), FieldType::Unsigned8Bit))
            .field(FieldDesc::new("c", BitRange::new(23, 16), FieldType::Unsigned8Bit))
    }

    #[test]
    fn test_overwrite_warning() {
        let (accessors, warnings) =
            plan(&two_field_register(FieldFunction::Overwrite.into()), 0).unwrap();
        assert_eq!(accessors, vec![Accessor::Overwrite]);
        assert_eq!(
            warnings,
            vec![Warning::OverwriteMultiField {
                path: EntityPath::new("regs").join("reg").join("a"),
                field_count: 3,
            }]
        );
    }

    #[test]
    fn test_masked_write_lane_warning() {
        let (accessors, warnings) =
            plan(&two_field_register(FieldFunction::WriteMasked.into()), 0).unwrap();
        assert_eq!(accessors, vec![Accessor::WriteMasked { lane_mask: 0x1 }]);
        match &warnings[..] {
            [Warning::MaskedWriteLaneShared { shared_with, .. }] => {
                assert_eq!(shared_with, &vec!["b".to_string()]);
            }
            other => panic!("unexpected warnings {other:?}"),
        }

        // field c owns lane 2 alone
        let mut reg = two_field_register(FieldFunctions::empty());
        reg.fields[2].functions = FieldFunction::WriteMasked.into();
        let (accessors, warnings) = plan(&reg, 2).unwrap();
        assert_eq!(accessors, vec![Accessor::WriteMasked { lane_mask: 0x4 }]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_strict_config_promotes_warning() {
        let reg = two_field_register(FieldFunction::Overwrite.into());
        let mut warnings = Warnings::new();
        let err = plan_accessors(
            &EntityPath::new("regs").join("reg"),
            &reg,
            0,
            &SolverConfig::new().strict_overwrite(true),
            &mut warnings,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Structural(StructuralError::WarningPromoted(_))
        ));
    }

    #[test]
    fn test_shadow_needs() {
        let reg = register(RegType::WriteRead, FieldFunction::ReadShadow);
        assert_eq!(shadow_needs(&reg), (true, false));
        let reg = register(RegType::Write, FieldFunction::WriteShadow);
        assert_eq!(shadow_needs(&reg), (false, true));
        let reg = register(RegType::Strobe, FieldFunction::WriteShadow);
        assert_eq!(shadow_needs(&reg), (false, false));
        let reg = register(RegType::Read, FieldFunction::Read);
        assert_eq!(shadow_needs(&reg), (false, false));
    }
}
