//! `--sql` mode: print the migration script instead of running it

use lineage_core::LineageError;
use lineage_orm::{MigrationContext, RevisionTarget};

use super::parse_target;

/// Split `from:to`; a bare target starts from `default_from`
fn parse_range(
    value: &str,
    default_from: Option<RevisionTarget>,
) -> Result<(RevisionTarget, RevisionTarget), LineageError> {
    match value.split_once(':') {
        Some((from, to)) => Ok((parse_target(from)?, parse_target(to)?)),
        None => match default_from {
            Some(from) => Ok((from, parse_target(value)?)),
            None => Err(LineageError::Migration(format!(
                "Offline downgrade needs an explicit range such as <from>:{}",
                value
            ))),
        },
    }
}

fn reject_relative(from: &RevisionTarget, to: &RevisionTarget) -> Result<(), LineageError> {
    if matches!(from, RevisionTarget::Relative(_)) || matches!(to, RevisionTarget::Relative(_)) {
        return Err(LineageError::Migration(
            "Relative revisions are not supported in --sql mode".to_string(),
        ));
    }
    Ok(())
}

pub fn upgrade(context: &MigrationContext, range: &str) -> Result<(), LineageError> {
    let (from, to) = parse_range(range, Some(RevisionTarget::Base))?;
    reject_relative(&from, &to)?;
    tracing::info!(module = %context.module(), "Generating offline upgrade {} -> {}", from, to);
    print!("{}", context.upgrade_sql(&from, &to)?);
    Ok(())
}

pub fn downgrade(context: &MigrationContext, range: &str) -> Result<(), LineageError> {
    let (from, to) = parse_range(range, None)?;
    reject_relative(&from, &to)?;
    tracing::info!(module = %context.module(), "Generating offline downgrade {} -> {}", from, to);
    print!("{}", context.downgrade_sql(&from, &to)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        let (from, to) = parse_range("head", Some(RevisionTarget::Base)).unwrap();
        assert_eq!(from, RevisionTarget::Base);
        assert_eq!(to, RevisionTarget::Head);

        let (from, to) = parse_range("ae10:base", None).unwrap();
        assert_eq!(from, RevisionTarget::Revision("ae10".to_string()));
        assert_eq!(to, RevisionTarget::Base);

        assert!(parse_range("base", None).is_err());
    }

    #[test]
    fn test_relative_targets_rejected() {
        let (from, to) = parse_range("+1", Some(RevisionTarget::Base)).unwrap();
        assert!(reject_relative(&from, &to).is_err());
        assert!(reject_relative(&RevisionTarget::Base, &RevisionTarget::Head).is_ok());
    }
}
