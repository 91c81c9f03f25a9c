//! Schema Builder - DSL for creating database schema changes
//!
//! Provides a fluent interface for building the SQLite DDL statements that
//! migrations and autogenerate emit.

use super::types::{Column, Table};

/// Basic schema operations for migrations
pub struct SchemaBuilder {
    statements: Vec<String>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    /// Create a table from a declared or reflected definition
    pub fn create_table_from(&mut self, table: &Table) -> &mut Self {
        let builder = TableBuilder::from_table(table);
        self.statements.push(builder.to_sql());
        self
    }

    /// Drop a table
    pub fn drop_table(&mut self, table_name: &str) -> &mut Self {
        self.statements.push(format!("DROP TABLE {};", table_name));
        self
    }

    /// Add a column to existing table
    pub fn add_column(&mut self, table_name: &str, column: &Column) -> &mut Self {
        self.statements.push(format!(
            "ALTER TABLE {} ADD COLUMN {};",
            table_name,
            column.to_sql()
        ));
        self
    }

    /// Drop a column from existing table
    pub fn drop_column(&mut self, table_name: &str, column_name: &str) -> &mut Self {
        self.statements.push(format!(
            "ALTER TABLE {} DROP COLUMN {};",
            table_name, column_name
        ));
        self
    }

    /// Get all SQL statements
    pub fn to_sql(&self) -> Vec<String> {
        self.statements.clone()
    }

    /// All statements as a single SQL string
    pub fn build(&self) -> String {
        self.statements.join("\n")
    }
}

/// Table builder for CREATE TABLE statements
pub struct TableBuilder {
    table_name: String,
    columns: Vec<String>,
    constraints: Vec<String>,
}

impl TableBuilder {
    fn new(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Builder pre-filled from a table definition
    pub fn from_table(table: &Table) -> Self {
        let mut builder = Self::new(&table.name);
        for column in &table.columns {
            builder.columns.push(column.to_sql());
        }
        let pk = table.primary_key_columns();
        if !pk.is_empty() {
            builder.primary_key(&pk);
        }
        builder
    }

    fn primary_key(&mut self, columns: &[&str]) -> &mut Self {
        self.constraints
            .push(format!("PRIMARY KEY ({})", columns.join(", ")));
        self
    }

    /// Build the CREATE TABLE SQL
    pub fn to_sql(&self) -> String {
        let mut parts = self.columns.clone();
        parts.extend(self.constraints.clone());

        format!(
            "CREATE TABLE {} (\n    {}\n);",
            self.table_name,
            parts.join(",\n    ")
        )
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    #[test]
    fn test_create_table_from_definition() {
        let table = Table::new("books")
            .column(Column::new("id", ColumnType::Integer).primary_key())
            .column(Column::new("title", ColumnType::String(Some(30))))
            .column(Column::new("author", ColumnType::String(None)));

        let mut builder = SchemaBuilder::new();
        builder.create_table_from(&table).drop_table("books");

        let statements = builder.to_sql();
        assert_eq!(
            statements[0],
            "CREATE TABLE books (\n    id INTEGER NOT NULL,\n    title VARCHAR(30),\n    author VARCHAR,\n    PRIMARY KEY (id)\n);"
        );
        assert_eq!(statements[1], "DROP TABLE books;");
    }

    #[test]
    fn test_column_statements() {
        let mut builder = SchemaBuilder::new();
        builder
            .add_column("books", &Column::new("isbn", ColumnType::String(Some(13))))
            .drop_column("books", "isbn");

        assert_eq!(
            builder.to_sql(),
            vec![
                "ALTER TABLE books ADD COLUMN isbn VARCHAR(13);".to_string(),
                "ALTER TABLE books DROP COLUMN isbn;".to_string(),
            ]
        );
    }
}
