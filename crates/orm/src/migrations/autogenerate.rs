//! Autogenerate - diff a module's declared metadata against the live schema
//!
//! Every candidate object is offered to the module's include-object filter
//! before it becomes an operation. The default filter, [`include_object`],
//! drops tables that exist in the database but are not declared by the
//! module, which keeps one module's revisions from dropping another module's
//! tables.

use std::sync::Arc;

use crate::schema::{Column, MetaData, SchemaBuilder, Table};

/// Kind of schema object offered to the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    Column,
}

/// Schema object offered to the filter
#[derive(Debug, Clone, Copy)]
pub enum SchemaObject<'a> {
    Table(&'a Table),
    Column { table: &'a str, column: &'a Column },
}

/// Filter deciding whether an object takes part in the comparison
///
/// Arguments: the object, its name, its kind, whether it was reflected from
/// the database, and the object it is being compared to (if any).
pub type IncludeObject = Arc<
    dyn Fn(&SchemaObject<'_>, &str, ObjectKind, bool, Option<&SchemaObject<'_>>) -> bool
        + Send
        + Sync,
>;

/// Skip tables found in the database that the module does not declare
pub fn include_object(
    _object: &SchemaObject<'_>,
    _name: &str,
    kind: ObjectKind,
    reflected: bool,
    compare_to: Option<&SchemaObject<'_>>,
) -> bool {
    !(kind == ObjectKind::Table && reflected && compare_to.is_none())
}

/// One schema change detected by the comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOp {
    AddTable(Table),
    RemoveTable(Table),
    AddColumn { table: String, column: Column },
    RemoveColumn { table: String, column: Column },
}

impl SchemaOp {
    /// Short description used in CLI output
    pub fn describe(&self) -> String {
        match self {
            SchemaOp::AddTable(table) => format!("Detected added table '{}'", table.name),
            SchemaOp::RemoveTable(table) => format!("Detected removed table '{}'", table.name),
            SchemaOp::AddColumn { table, column } => {
                format!("Detected added column '{}.{}'", table, column.name)
            }
            SchemaOp::RemoveColumn { table, column } => {
                format!("Detected removed column '{}.{}'", table, column.name)
            }
        }
    }

    fn apply(&self, builder: &mut SchemaBuilder) {
        match self {
            SchemaOp::AddTable(table) => {
                builder.create_table_from(table);
            }
            SchemaOp::RemoveTable(table) => {
                builder.drop_table(&table.name);
            }
            SchemaOp::AddColumn { table, column } => {
                builder.add_column(table, column);
            }
            SchemaOp::RemoveColumn { table, column } => {
                builder.drop_column(table, &column.name);
            }
        }
    }

    fn inverse(&self) -> SchemaOp {
        match self {
            SchemaOp::AddTable(table) => SchemaOp::RemoveTable(table.clone()),
            SchemaOp::RemoveTable(table) => SchemaOp::AddTable(table.clone()),
            SchemaOp::AddColumn { table, column } => SchemaOp::RemoveColumn {
                table: table.clone(),
                column: column.clone(),
            },
            SchemaOp::RemoveColumn { table, column } => SchemaOp::AddColumn {
                table: table.clone(),
                column: column.clone(),
            },
        }
    }
}

/// Compare reflected tables with declared metadata
///
/// The module's own version table is never part of the comparison.
pub fn compare_metadata<F>(
    reflected: &[Table],
    metadata: &MetaData,
    version_table: &str,
    include: F,
) -> Vec<SchemaOp>
where
    F: Fn(&SchemaObject<'_>, &str, ObjectKind, bool, Option<&SchemaObject<'_>>) -> bool,
{
    let live: Vec<&Table> = reflected
        .iter()
        .filter(|t| t.name != version_table)
        .collect();
    let find_live = |name: &str| live.iter().copied().find(|t| t.name == name);

    let mut ops = Vec::new();

    for table in metadata.tables() {
        if find_live(&table.name).is_none()
            && include(&SchemaObject::Table(table), &table.name, ObjectKind::Table, false, None)
        {
            ops.push(SchemaOp::AddTable(table.clone()));
        }
    }

    let mut removed: Vec<&Table> = live
        .iter()
        .copied()
        .filter(|t| !metadata.contains(&t.name))
        .collect();
    removed.sort_by(|a, b| a.name.cmp(&b.name));
    for table in removed {
        if include(&SchemaObject::Table(table), &table.name, ObjectKind::Table, true, None) {
            ops.push(SchemaOp::RemoveTable(table.clone()));
        } else {
            tracing::debug!(table = %table.name, "Skipping table not owned by this module");
        }
    }

    for table in metadata.tables() {
        let Some(live_table) = find_live(&table.name) else {
            continue;
        };
        let live_object = SchemaObject::Table(live_table);
        if !include(
            &SchemaObject::Table(table),
            &table.name,
            ObjectKind::Table,
            false,
            Some(&live_object),
        ) {
            continue;
        }
        ops.extend(compare_columns(table, live_table, &include));
    }

    ops
}

/// Column additions and removals that `ALTER TABLE` can apply and revert
///
/// NOT NULL and primary key columns are left out: SQLite refuses to add them
/// without a default, so neither direction of the revision could run.
fn compare_columns<F>(declared: &Table, live: &Table, include: &F) -> Vec<SchemaOp>
where
    F: Fn(&SchemaObject<'_>, &str, ObjectKind, bool, Option<&SchemaObject<'_>>) -> bool,
{
    let mut ops = Vec::new();

    for column in &declared.columns {
        if live.get_column(&column.name).is_some() {
            continue;
        }
        let object = SchemaObject::Column {
            table: &declared.name,
            column,
        };
        if !include(&object, &column.name, ObjectKind::Column, false, None) {
            continue;
        }
        if column.can_add_in_place() {
            ops.push(SchemaOp::AddColumn {
                table: declared.name.clone(),
                column: column.clone(),
            });
        } else {
            tracing::warn!(
                table = %declared.name,
                column = %column.name,
                "Skipping added NOT NULL column; SQLite needs the table recreated"
            );
        }
    }

    for column in &live.columns {
        if declared.get_column(&column.name).is_some() {
            continue;
        }
        let object = SchemaObject::Column {
            table: &live.name,
            column,
        };
        if !include(&object, &column.name, ObjectKind::Column, true, None) {
            continue;
        }
        if column.can_add_in_place() {
            ops.push(SchemaOp::RemoveColumn {
                table: live.name.clone(),
                column: column.clone(),
            });
        } else {
            tracing::warn!(
                table = %live.name,
                column = %column.name,
                "Skipping removed NOT NULL column; SQLite needs the table recreated"
            );
        }
    }

    ops
}

/// SQL applying the operations in order
pub fn render_upgrade(ops: &[SchemaOp]) -> String {
    let mut builder = SchemaBuilder::new();
    for op in ops {
        op.apply(&mut builder);
    }
    builder.build()
}

/// SQL reverting the operations, newest first
pub fn render_downgrade(ops: &[SchemaOp]) -> String {
    let mut builder = SchemaBuilder::new();
    for op in ops.iter().rev() {
        op.inverse().apply(&mut builder);
    }
    builder.build()
}
