//! Purpose: In-memory shape of a materialized query result handed to the renderers.
//! Exports: `ColumnSpec`, `ResultFlag`, `ResultFlags`, `Row`, `ResultSet`, `KeyRole`, `SchemaRoles`.
//! Role: Plain data passed in by the storage/query layer; renderers only read it.
//! Invariants: Every row holds exactly one payload per column, aligned by index.
//! Invariants: Flags are explicit fields; nothing is read from collaborator internals.
use std::collections::HashMap;

use crate::core::value::ValueKind;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ValueKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResultFlag {
    GlobalTablesSpec,
    HasMorePages,
    /// Column types were not sent; payloads can only be shown as raw bytes.
    NoMetadata,
}

impl ResultFlag {
    fn bit(self) -> u8 {
        match self {
            ResultFlag::GlobalTablesSpec => 1 << 0,
            ResultFlag::HasMorePages => 1 << 1,
            ResultFlag::NoMetadata => 1 << 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ResultFlags(u8);

impl ResultFlags {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(mut self, flag: ResultFlag) -> Self {
        self.insert(flag);
        self
    }

    pub fn insert(&mut self, flag: ResultFlag) {
        self.0 |= flag.bit();
    }

    pub fn contains(self, flag: ResultFlag) -> bool {
        self.0 & flag.bit() != 0
    }
}

impl FromIterator<ResultFlag> for ResultFlags {
    fn from_iter<I: IntoIterator<Item = ResultFlag>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// One payload per column; `None` is an absent (null) cell.
pub type Row = Vec<Option<Vec<u8>>>;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<ColumnSpec>,
    pub flags: ResultFlags,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(columns: Vec<ColumnSpec>, flags: ResultFlags, rows: Vec<Row>) -> Self {
        Self {
            columns,
            flags,
            rows,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum KeyRole {
    PartitionKey,
    Clustering,
    #[default]
    Regular,
}

/// Resolves a column's key role, treating an unknown column as regular.
pub fn resolve_role<F>(role_of: &F, name: &str) -> KeyRole
where
    F: Fn(&str) -> Option<KeyRole> + ?Sized,
{
    role_of(name).unwrap_or_default()
}

/// Name-to-role table usable as the role lookup for the table renderer.
#[derive(Clone, Debug, Default)]
pub struct SchemaRoles {
    roles: HashMap<String, KeyRole>,
}

impl SchemaRoles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, name: impl Into<String>, role: KeyRole) -> Self {
        self.roles.insert(name.into(), role);
        self
    }

    pub fn role_of(&self, name: &str) -> Option<KeyRole> {
        self.roles.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyRole, ResultFlag, ResultFlags, SchemaRoles, resolve_role};

    #[test]
    fn flags_track_membership() {
        let flags = ResultFlags::empty().with(ResultFlag::NoMetadata);
        assert!(flags.contains(ResultFlag::NoMetadata));
        assert!(!flags.contains(ResultFlag::HasMorePages));

        let collected: ResultFlags = [ResultFlag::HasMorePages, ResultFlag::GlobalTablesSpec]
            .into_iter()
            .collect();
        assert!(collected.contains(ResultFlag::GlobalTablesSpec));
        assert!(!collected.contains(ResultFlag::NoMetadata));
        assert_eq!(ResultFlags::default(), ResultFlags::empty());
    }

    #[test]
    fn missing_role_defaults_to_regular() {
        let roles = SchemaRoles::new()
            .with_role("id", KeyRole::PartitionKey)
            .with_role("ts", KeyRole::Clustering);
        let lookup = |name: &str| roles.role_of(name);
        assert_eq!(resolve_role(&lookup, "id"), KeyRole::PartitionKey);
        assert_eq!(resolve_role(&lookup, "ts"), KeyRole::Clustering);
        assert_eq!(resolve_role(&lookup, "body"), KeyRole::Regular);
    }
}
