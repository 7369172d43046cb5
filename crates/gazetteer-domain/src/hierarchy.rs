//! Hierarchy module: the two enumerated levels above harvested records

use std::fmt;

/// Top-level partition key of a harvest run (e.g. a continent)
///
/// Names are trimmed and must be non-empty. Uniqueness within a run is
/// enforced by the enumeration step, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Group(String);

impl Group {
    /// Create a new group
    ///
    /// # Errors
    /// Returns error if the name is empty after trimming
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err("Group name cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the group name
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Create a child unit of this group
    ///
    /// # Errors
    /// Returns error if the unit name is empty after trimming
    pub fn unit(&self, name: impl Into<String>) -> Result<Unit, String> {
        Unit::new(self.clone(), name)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Child partition of a [`Group`] (e.g. a country), the atomic item of work
///
/// Uniqueness is scoped to the parent group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Unit {
    group: Group,
    name: String,
}

impl Unit {
    /// Create a new unit under `group`
    ///
    /// # Errors
    /// Returns error if the name is empty after trimming
    pub fn new(group: Group, name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(format!("Unit name cannot be empty (group '{}')", group));
        }
        Ok(Self {
            group,
            name: trimmed.to_string(),
        })
    }

    /// Get the unit name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the parent group
    pub fn group(&self) -> &Group {
        &self.group
    }

    /// Hierarchy path as `group.unit`
    pub fn path(&self) -> String {
        format!("{}.{}", self.group.name(), self.name)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.group)
    }
}
