//! Table metadata types
//!
//! `MetaData` is the set of tables a module declares and therefore owns.
//! The same types describe tables reflected from the live database so the
//! two can be compared during autogenerate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column storage type, rendered with SQLite type names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    /// `VARCHAR` with an optional length
    String(Option<u32>),
    Text,
    Boolean,
    Float,
    DateTime,
    /// Any declared type this crate does not model
    Other(String),
}

impl ColumnType {
    /// Parse a declared SQLite column type as reported by `PRAGMA table_info`
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.trim().to_uppercase();
        let (base, length) = match upper.split_once('(') {
            Some((base, rest)) => (
                base.trim().to_string(),
                rest.trim_end_matches(')').trim().parse::<u32>().ok(),
            ),
            None => (upper.clone(), None),
        };

        match base.as_str() {
            "INTEGER" | "INT" | "BIGINT" | "SMALLINT" => ColumnType::Integer,
            "VARCHAR" | "CHARACTER VARYING" | "NVARCHAR" => ColumnType::String(length),
            "TEXT" | "CLOB" => ColumnType::Text,
            "BOOLEAN" | "BOOL" => ColumnType::Boolean,
            "FLOAT" | "REAL" | "DOUBLE" => ColumnType::Float,
            "DATETIME" | "TIMESTAMP" => ColumnType::DateTime,
            _ => ColumnType::Other(upper),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::String(Some(len)) => write!(f, "VARCHAR({})", len),
            ColumnType::String(None) => write!(f, "VARCHAR"),
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Boolean => write!(f, "BOOLEAN"),
            ColumnType::Float => write!(f, "FLOAT"),
            ColumnType::DateTime => write!(f, "DATETIME"),
            ColumnType::Other(declared) => write!(f, "{}", declared),
        }
    }
}

/// A single column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
}

impl Column {
    /// Nullable column of the given type
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            primary_key: false,
        }
    }

    /// Mark as (part of) the primary key; primary key columns are NOT NULL
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// SQLite can only `ADD COLUMN` a nullable, non-key column when no default is given
    pub fn can_add_in_place(&self) -> bool {
        self.nullable && !self.primary_key
    }

    /// Column definition as it appears inside `CREATE TABLE` / `ADD COLUMN`
    pub fn to_sql(&self) -> String {
        if self.nullable {
            format!("{} {}", self.name, self.column_type)
        } else {
            format!("{} {} NOT NULL", self.name, self.column_type)
        }
    }
}

/// A table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Builder-style column append
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// The collection of tables owned by one module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaData {
    tables: Vec<Table>,
}

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table; a table with the same name is replaced
    pub fn add_table(&mut self, table: Table) -> &mut Self {
        if let Some(existing) = self.tables.iter_mut().find(|t| t.name == table.name) {
            *existing = table;
        } else {
            self.tables.push(table);
        }
        self
    }

    /// Builder-style variant of [`MetaData::add_table`]
    pub fn with_table(mut self, table: Table) -> Self {
        self.add_table(table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// Tables in declaration order
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_parsing() {
        assert_eq!(ColumnType::from_declared("INTEGER"), ColumnType::Integer);
        assert_eq!(ColumnType::from_declared("varchar(30)"), ColumnType::String(Some(30)));
        assert_eq!(ColumnType::from_declared("VARCHAR"), ColumnType::String(None));
        assert_eq!(ColumnType::from_declared("REAL"), ColumnType::Float);
        assert_eq!(
            ColumnType::from_declared("blob"),
            ColumnType::Other("BLOB".to_string())
        );
    }

    #[test]
    fn test_column_sql() {
        let id = Column::new("id", ColumnType::Integer).primary_key();
        assert_eq!(id.to_sql(), "id INTEGER NOT NULL");

        let title = Column::new("title", ColumnType::String(Some(30)));
        assert_eq!(title.to_sql(), "title VARCHAR(30)");

        assert!(title.can_add_in_place());
        assert!(!id.can_add_in_place());
        assert!(!Column::new("isbn", ColumnType::Text).not_null().can_add_in_place());
    }

    #[test]
    fn test_metadata_replaces_same_name() {
        let mut metadata = MetaData::new();
        metadata.add_table(Table::new("books"));
        metadata.add_table(
            Table::new("books").column(Column::new("id", ColumnType::Integer).primary_key()),
        );

        assert_eq!(metadata.table_names(), vec!["books"]);
        assert_eq!(metadata.table("books").unwrap().primary_key_columns(), vec!["id"]);
        assert!(!metadata.contains("users"));
    }
}
