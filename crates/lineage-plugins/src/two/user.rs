use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use lineage_orm::{Column, ColumnType, Model, ModelResult, Table};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub fullname: Option<String>,
}

impl User {
    pub fn new(name: impl Into<String>, fullname: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            fullname: Some(fullname.into()),
        }
    }
}

impl Model for User {
    type PrimaryKey = i64;

    fn table_name() -> &'static str {
        "users"
    }

    fn table() -> Table {
        Table::new(Self::table_name())
            .column(Column::new("id", ColumnType::Integer).primary_key())
            .column(Column::new("name", ColumnType::String(Some(50))))
            .column(Column::new("fullname", ColumnType::String(None)))
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
            name: row.try_get("name")?,
            fullname: row.try_get("fullname")?,
        })
    }

    fn to_fields(&self) -> HashMap<String, Value> {
        let mut fields = HashMap::new();
        if let Some(id) = self.id {
            fields.insert("id".to_string(), Value::from(id));
        }
        fields.insert("name".to_string(), self.name.clone().map_or(Value::Null, Value::from));
        fields.insert("fullname".to_string(), self.fullname.clone().map_or(Value::Null, Value::from));
        fields
    }
}
