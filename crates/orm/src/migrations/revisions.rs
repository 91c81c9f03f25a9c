//! Revision map - links a module's migrations into one lineage
//!
//! Each migration names its parent through `down_revision`. The map resolves
//! targets and computes the ordered path between two points of the lineage.

use std::collections::HashMap;

use super::definitions::{Migration, RevisionTarget};
use crate::error::{OrmError, OrmResult};

/// A module's migrations indexed by revision id, ordered base to head
#[derive(Debug, Clone, Default)]
pub struct RevisionMap {
    ordered: Vec<Migration>,
    index: HashMap<String, usize>,
}

impl RevisionMap {
    /// Link migrations; every parent must exist and the graph must be acyclic
    pub fn new(migrations: Vec<Migration>) -> OrmResult<Self> {
        let by_id: HashMap<&str, &Migration> = migrations
            .iter()
            .map(|m| (m.revision.as_str(), m))
            .collect();

        for migration in &migrations {
            if let Some(parent) = &migration.down_revision {
                if !by_id.contains_key(parent.as_str()) {
                    return Err(OrmError::Migration(format!(
                        "Revision {} revises unknown revision {}",
                        migration.revision, parent
                    )));
                }
            }
        }

        // Kahn's algorithm; ties broken by revision id for a stable order
        let mut children: HashMap<Option<&str>, Vec<&Migration>> = HashMap::new();
        for migration in &migrations {
            children
                .entry(migration.down_revision.as_deref())
                .or_default()
                .push(migration);
        }
        for list in children.values_mut() {
            list.sort_by(|a, b| a.revision.cmp(&b.revision));
        }

        let mut ordered = Vec::with_capacity(migrations.len());
        let mut queue: Vec<&Migration> = children.get(&None).cloned().unwrap_or_default();
        queue.reverse();
        while let Some(next) = queue.pop() {
            ordered.push(next.clone());
            if let Some(kids) = children.get(&Some(next.revision.as_str())) {
                for kid in kids.iter().rev() {
                    queue.push(kid);
                }
            }
        }

        if ordered.len() != migrations.len() {
            return Err(OrmError::Migration(
                "Revision graph contains a cycle".to_string(),
            ));
        }

        let index = ordered
            .iter()
            .enumerate()
            .map(|(i, m)| (m.revision.clone(), i))
            .collect();

        Ok(Self { ordered, index })
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Migrations ordered from base to head
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Migration> {
        self.ordered.iter()
    }

    pub fn get(&self, revision: &str) -> Option<&Migration> {
        self.index.get(revision).map(|&i| &self.ordered[i])
    }

    /// Revisions nothing else revises
    pub fn heads(&self) -> Vec<&Migration> {
        self.ordered
            .iter()
            .filter(|m| {
                !self
                    .ordered
                    .iter()
                    .any(|other| other.down_revision.as_deref() == Some(m.revision.as_str()))
            })
            .collect()
    }

    /// Revisions with no parent
    pub fn bases(&self) -> Vec<&Migration> {
        self.ordered
            .iter()
            .filter(|m| m.down_revision.is_none())
            .collect()
    }

    /// The single head, or `None` for an empty lineage
    pub fn head(&self) -> OrmResult<Option<&Migration>> {
        match self.heads().as_slice() {
            [] => Ok(None),
            [head] => Ok(Some(*head)),
            heads => Err(OrmError::Migration(format!(
                "Multiple heads present: {}",
                heads
                    .iter()
                    .map(|m| m.revision.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    /// Find a revision by full id or unique prefix
    pub fn lookup(&self, id: &str) -> OrmResult<&Migration> {
        if let Some(migration) = self.get(id) {
            return Ok(migration);
        }

        let matches: Vec<&Migration> = self
            .ordered
            .iter()
            .filter(|m| m.revision.starts_with(id))
            .collect();

        match matches.as_slice() {
            [single] => Ok(*single),
            [] => Err(OrmError::Migration(format!("Can't locate revision identified by '{}'", id))),
            _ => Err(OrmError::Migration(format!(
                "Revision prefix '{}' is ambiguous",
                id
            ))),
        }
    }

    /// Resolve a target to a revision id (`None` means base)
    pub fn resolve(
        &self,
        target: &RevisionTarget,
        current: Option<&str>,
    ) -> OrmResult<Option<String>> {
        match target {
            RevisionTarget::Head => Ok(self.head()?.map(|m| m.revision.clone())),
            RevisionTarget::Base => Ok(None),
            RevisionTarget::Revision(id) => Ok(Some(self.lookup(id)?.revision.clone())),
            RevisionTarget::Relative(steps) => self.relative(current, *steps),
        }
    }

    fn relative(&self, current: Option<&str>, steps: i64) -> OrmResult<Option<String>> {
        let mut position = current.map(str::to_string);

        if steps < 0 {
            for _ in 0..steps.unsigned_abs() {
                let rev = position.ok_or_else(|| {
                    OrmError::Migration(format!(
                        "Relative revision {} goes below base",
                        steps
                    ))
                })?;
                position = self.lookup(&rev)?.down_revision.clone();
            }
        } else {
            for _ in 0..steps {
                let next: Vec<&Migration> = self
                    .ordered
                    .iter()
                    .filter(|m| m.down_revision.as_deref() == position.as_deref())
                    .collect();
                position = match next.as_slice() {
                    [single] => Some(single.revision.clone()),
                    [] => {
                        return Err(OrmError::Migration(format!(
                            "Relative revision +{} goes beyond head",
                            steps
                        )))
                    }
                    _ => {
                        return Err(OrmError::Migration(
                            "Relative upgrade is ambiguous across multiple branches".to_string(),
                        ))
                    }
                };
            }
        }

        Ok(position)
    }

    /// Migrations to apply, oldest first, to move from `current` up to `target`
    pub fn upgrade_path(
        &self,
        current: Option<&str>,
        target: Option<&str>,
    ) -> OrmResult<Vec<&Migration>> {
        let mut path = Vec::new();
        let mut cursor = target;

        while cursor != current {
            let Some(rev) = cursor else {
                return Err(OrmError::Migration(format!(
                    "Revision {} is not reachable from current revision {}",
                    target.unwrap_or("base"),
                    current.unwrap_or("base")
                )));
            };
            let migration = self.lookup(rev)?;
            path.push(migration);
            if path.len() > self.ordered.len() {
                return Err(OrmError::Migration("Revision graph contains a cycle".to_string()));
            }
            cursor = migration.down_revision.as_deref();
        }

        path.reverse();
        Ok(path)
    }

    /// Migrations to revert, newest first, to move from `current` down to `target`
    pub fn downgrade_path(
        &self,
        current: Option<&str>,
        target: Option<&str>,
    ) -> OrmResult<Vec<&Migration>> {
        let mut path = Vec::new();
        let mut cursor = current;

        while cursor != target {
            let Some(rev) = cursor else {
                return Err(OrmError::Migration(format!(
                    "Revision {} is not an ancestor of current revision {}",
                    target.unwrap_or("base"),
                    current.unwrap_or("base")
                )));
            };
            let migration = self.lookup(rev)?;
            path.push(migration);
            if path.len() > self.ordered.len() {
                return Err(OrmError::Migration("Revision graph contains a cycle".to_string()));
            }
            cursor = migration.down_revision.as_deref();
        }

        Ok(path)
    }
}
