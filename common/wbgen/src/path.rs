// Licensed under the Apache-2.0 license

use std::fmt;

/// Fully qualified name of a model entity, e.g. `regs.config.speed` or
/// `main_bus.uart`.
///
/// Every error and warning carries one, so callers can print a diagnostic
/// without walking the model again.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityPath(Vec<String>);

impl EntityPath {
    pub fn new(root: impl Into<String>) -> Self {
        Self(vec![root.into()])
    }

    /// Returns a new path with `segment` appended.
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last segment, i.e. the entity's own name.
    pub fn name(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_display() {
        let path = EntityPath::new("regs").join("config").join("speed");
        assert_eq!(path.to_string(), "regs.config.speed");
        assert_eq!(path.name(), "speed");
        assert_eq!(path.segments().len(), 3);
    }

    #[test]
    fn test_empty_path() {
        assert_eq!(EntityPath::default().name(), "");
        assert_eq!(EntityPath::default().to_string(), "");
    }
}
