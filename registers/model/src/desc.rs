// Licensed under the Apache-2.0 license

//! Unresolved register descriptions.
//!
//! These are plain builder values. Nothing is checked until the description
//! is handed to [`RegisterSet::new`](crate::RegisterSet::new), which
//! validates and solves it into the frozen model.
//!
//! Descriptions can be built in code:
//!
//! ```
//! use wbgen_registers::{FieldDesc, RegisterDesc, RegisterSetDesc};
//! use wbgen_registers::types::{BitRange, FieldFunction, FieldType, RegType};
//!
//! let desc = RegisterSetDesc::new("regs", 32).register(
//!     RegisterDesc::new("config", RegType::WriteRead)
//!         .address(0x0)
//!         .field(
//!             FieldDesc::new("speed", BitRange::new(9, 0), FieldType::Unsigned16Bit)
//!                 .functions(FieldFunction::Read | FieldFunction::ReadModifyWrite),
//!         ),
//! );
//! assert_eq!(desc.registers.len(), 1);
//! ```
//!
//! or deserialized from TOML:
//!
//! ```
//! use wbgen_registers::RegisterSetDesc;
//!
//! let desc = RegisterSetDesc::from_toml_str(r#"
//! name = "regs"
//! port_size = 16
//!
//! [[registers]]
//! name = "status"
//! regtype = "Read"
//! fields = [
//!     { name = "ready", bits = [0], datatype = "Boolean", functions = ["Read"] },
//! ]
//! "#).unwrap();
//! assert!(desc.registers[0].address.is_auto());
//! ```

use crate::types::{BitRange, FieldFunctions, FieldType, RegType, TriggerOn, WriteEventType};
use serde::{Deserialize, Deserializer};
use wbgen_common::{Address, Result, SolverConfig};

/// Unresolved field.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDesc {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub bits: BitRange,
    pub datatype: FieldType,
    #[serde(default)]
    pub functions: FieldFunctions,
    /// Reset value; must fit the field's signed or unsigned range.
    #[serde(default, deserialize_with = "deserialize_default")]
    pub default: i128,
    #[serde(default)]
    pub comment: Option<String>,
    /// Only used by `ReadEvent` registers.
    #[serde(default)]
    pub trigger_on: TriggerOn,
}

impl FieldDesc {
    pub fn new(name: &str, bits: BitRange, datatype: FieldType) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            bits,
            datatype,
            functions: FieldFunctions::empty(),
            default: 0,
            comment: None,
            trigger_on: TriggerOn::NONE,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn functions(mut self, functions: impl Into<FieldFunctions>) -> Self {
        self.functions = functions.into();
        self
    }

    pub fn default(mut self, default: i128) -> Self {
        self.default = default;
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    pub fn trigger_on(mut self, trigger_on: TriggerOn) -> Self {
        self.trigger_on = trigger_on;
        self
    }
}

/// Unresolved register.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterDesc {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Offset from the register set's base address, or `Auto`.
    #[serde(default)]
    pub address: Address,
    pub regtype: RegType,
    #[serde(default)]
    pub fields: Vec<FieldDesc>,
    #[serde(default)]
    pub write_event: Option<WriteEventType>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl RegisterDesc {
    pub fn new(name: &str, regtype: RegType) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            address: Address::Auto,
            regtype,
            fields: vec![],
            write_event: None,
            comment: None,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn address(mut self, address: impl Into<Address>) -> Self {
        self.address = address.into();
        self
    }

    pub fn field(mut self, field: FieldDesc) -> Self {
        self.fields.push(field);
        self
    }

    pub fn write_event(mut self, write_event: WriteEventType) -> Self {
        self.write_event = Some(write_event);
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }
}

/// Unresolved register set.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterSetDesc {
    pub name: String,
    /// Absolute base address; only meaningful once placed on a bus.
    #[serde(default)]
    pub base_address: Address,
    /// Data width in bits. Granularity is always 8 bits.
    pub port_size: u32,
    #[serde(default)]
    pub registers: Vec<RegisterDesc>,
}

impl RegisterSetDesc {
    pub fn new(name: &str, port_size: u32) -> Self {
        Self {
            name: name.to_string(),
            base_address: Address::Auto,
            port_size,
            registers: vec![],
        }
    }

    pub fn base_address(mut self, base_address: impl Into<Address>) -> Self {
        self.base_address = base_address.into();
        self
    }

    pub fn register(mut self, register: RegisterDesc) -> Self {
        self.registers.push(register);
        self
    }

    /// Parse a description from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Shorthand for [`RegisterSet::with_config`](crate::RegisterSet::with_config).
    pub fn resolve(
        self,
        config: &SolverConfig,
    ) -> Result<wbgen_common::Resolved<crate::RegisterSet>> {
        crate::RegisterSet::with_config(self, config)
    }
}

/// TOML integers are 64-bit signed, so unsigned 64-bit defaults above
/// `i64::MAX` are written as hex strings.
fn deserialize_default<'de, D>(deserializer: D) -> std::result::Result<i128, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DefaultRepr {
        Int(i64),
        Text(String),
    }

    match DefaultRepr::deserialize(deserializer)? {
        DefaultRepr::Int(v) => Ok(v.into()),
        DefaultRepr::Text(text) => {
            let digits = text.trim().replace('_', "");
            let (negative, digits) = match digits.strip_prefix('-') {
                Some(rest) => (true, rest.to_string()),
                None => (false, digits),
            };
            let value = match digits
                .strip_prefix("0x")
                .or_else(|| digits.strip_prefix("0X"))
            {
                Some(hex) => i128::from_str_radix(hex, 16),
                None => digits.parse::<i128>(),
            }
            .map_err(|e| serde::de::Error::custom(format!("invalid default \"{text}\": {e}")))?;
            Ok(if negative { -value } else { value })
        }
    }
}
