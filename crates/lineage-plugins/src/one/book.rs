use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use lineage_orm::{Column, ColumnType, Model, ModelResult, Table};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Book {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub author: Option<String>,
}

impl Book {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: None,
            title: Some(title.into()),
            author: Some(author.into()),
        }
    }
}

impl Model for Book {
    type PrimaryKey = i64;

    fn table_name() -> &'static str {
        "books"
    }

    fn table() -> Table {
        Table::new(Self::table_name())
            .column(Column::new("id", ColumnType::Integer).primary_key())
            .column(Column::new("title", ColumnType::String(Some(30))))
            .column(Column::new("author", ColumnType::String(None)))
    }

    fn primary_key(&self) -> Option<i64> {
        self.id
    }

    fn set_primary_key(&mut self, key: i64) {
        self.id = Some(key);
    }

    fn from_row(row: &SqliteRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            author: row.try_get("author")?,
        })
    }

    fn to_fields(&self) -> HashMap<String, Value> {
        let mut fields = HashMap::new();
        if let Some(id) = self.id {
            fields.insert("id".to_string(), Value::from(id));
        }
        fields.insert("title".to_string(), self.title.clone().map_or(Value::Null, Value::from));
        fields.insert("author".to_string(), self.author.clone().map_or(Value::Null, Value::from));
        fields
    }
}
