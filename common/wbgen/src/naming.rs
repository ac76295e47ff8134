// Licensed under the Apache-2.0 license

//! Identifier rules and source-code name conversion.
//!
//! Names in a description are human readable ("Config 1", "I/O Expander").
//! Every backend turns them into identifiers with [`sourcecode_name`], which
//! drops punctuation, so the core checks names against the least permissive
//! grammar any backend accepts: the converted name must be a valid
//! identifier and must not be a reserved word in C, Python, SystemVerilog or
//! Rust.

use crate::error::{Result, StructuralError};
use crate::path::EntityPath;

/// Target spelling for [`sourcecode_name`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NamingConvention {
    /// `config_1`
    SnakeCase,
    /// `CONFIG_1`
    ConstantCase,
    /// `Config1`
    PascalCase,
}

/// Splits a name into lower-case words.
///
/// Mixed-case names without separators are split before each run of upper
/// case letters (`MyRegister` -> `my`, `register`); everything else is split
/// at spaces, underscores and dashes.
fn words(name: &str) -> Vec<String> {
    let has_lower = name.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = name.chars().any(|c| c.is_ascii_uppercase());
    let has_separator = name.chars().any(|c| matches!(c, ' ' | '_' | '-'));

    let mut parts: Vec<String> = vec![];
    if has_lower && has_upper && !has_separator {
        let mut current = String::new();
        let mut prev_upper = false;
        for c in name.chars() {
            let upper = c.is_ascii_uppercase();
            if upper && !prev_upper && !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
            prev_upper = upper;
            current.push(c);
        }
        parts.push(current);
    } else {
        parts = name
            .split([' ', '_', '-'])
            .map(str::to_string)
            .collect();
    }

    parts
        .into_iter()
        .map(|p| {
            p.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|p| !p.is_empty())
        .collect()
}

/// Converts a description name into an identifier.
///
/// # Examples
/// ```
/// use wbgen_common::naming::{sourcecode_name, NamingConvention};
/// assert_eq!(sourcecode_name("Config 1", NamingConvention::SnakeCase), "config_1");
/// assert_eq!(sourcecode_name("MyRegister", NamingConvention::ConstantCase), "MY_REGISTER");
/// assert_eq!(sourcecode_name("io-expander", NamingConvention::PascalCase), "IoExpander");
/// ```
pub fn sourcecode_name(name: &str, convention: NamingConvention) -> String {
    let parts = words(name);
    let mut code = match convention {
        NamingConvention::SnakeCase => parts.join("_"),
        NamingConvention::ConstantCase => parts.join("_").to_ascii_uppercase(),
        NamingConvention::PascalCase => parts
            .iter()
            .map(|p| {
                let mut chars = p.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect(),
    };
    if code.starts_with(|c: char| c.is_ascii_digit()) {
        code.insert(0, '_');
    }
    code
}

/// Reserved words of every language a backend may emit, lower case.
const RESERVED_WORDS: &[&str] = &[
    // C
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while",
    // Python
    "and", "as", "assert", "async", "await", "class", "def", "del", "elif", "except", "false",
    "finally", "from", "global", "import", "in", "is", "lambda", "none", "nonlocal", "not", "or",
    "pass", "raise", "true", "try", "with", "yield",
    // SystemVerilog
    "always", "always_comb", "always_ff", "assign", "begin", "bit", "byte", "end", "endmodule",
    "function", "initial", "input", "inout", "interface", "logic", "module", "output",
    "parameter", "reg", "task", "wire",
    // Rust
    "crate", "dyn", "fn", "impl", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "self", "super", "trait", "type", "unsafe", "use", "where",
];

/// Returns true if `identifier` is reserved in any target language.
pub fn is_reserved(identifier: &str) -> bool {
    let lower = identifier.to_ascii_lowercase();
    RESERVED_WORDS.contains(&lower.as_str())
}

/// Checks that the entity at `path` (whose own name is its last segment) is
/// usable as an identifier by every backend.
pub fn check_name(path: &EntityPath) -> Result<()> {
    let name = path.name();
    let invalid = |reason| StructuralError::InvalidName {
        path: path.clone(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty").into());
    }
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(invalid("name must start with a letter").into());
    }
    if !name.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
        return Err(invalid("name may only contain printable ASCII characters").into());
    }
    if is_reserved(&sourcecode_name(name, NamingConvention::SnakeCase)) {
        return Err(invalid("name is a reserved word in a target language").into());
    }
    Ok(())
}

/// Checks a list of sibling names: each must pass [`check_name`], no two may
/// be equal, and no two may map to the same identifier.
///
/// `parent` is the container's path and `kind` names the entity class in the
/// error message ("Register", "Field", "Slave", ...).
pub fn check_unique_names<'a>(
    parent: &EntityPath,
    kind: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let mut seen: Vec<(&str, String)> = vec![];
    for name in names {
        check_name(&parent.join(name))?;
        let identifier = sourcecode_name(name, NamingConvention::SnakeCase);
        if let Some((other, _)) = seen.iter().find(|(_, ident)| *ident == identifier) {
            if *other == name {
                return Err(StructuralError::DuplicateName {
                    path: parent.clone(),
                    kind,
                    name: name.to_string(),
                }
                .into());
            }
            return Err(StructuralError::NameCollision {
                path: parent.clone(),
                kind,
                first: other.to_string(),
                second: name.to_string(),
                identifier,
            }
            .into());
        }
        seen.push((name, identifier));
    }
    Ok(())
}
