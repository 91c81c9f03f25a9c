use std::path::Path;
use std::process::{Command, Output};

use lineage_testing::{TestDatabase, TestProject};

const BOOKS_REV: &str = "0b1c2d3e4f5a";
const USERS_REV: &str = "5a4f3e2d1c0b";

fn revision(rev: &str, message: &str, up: &str, down: &str) -> String {
    format!(
        "-- Migration: {message}\n-- Revision: {rev}\n-- Revises:\n\
         -- Create Date: 2024-01-01 12:00:00 UTC\n\n\
         -- Up migration\n{up}\n\n-- Down migration\n{down}\n"
    )
}

fn lineage(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lineage"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "error")
        .output()
        .expect("failed to run lineage binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

async fn setup() -> (TestDatabase, TestProject) {
    let db = TestDatabase::new().await.unwrap();
    let project = TestProject::new().unwrap();
    project.write_modules(db.url(), &["one", "two"]).unwrap();
    project
        .write_revision(
            "one",
            &format!("{BOOKS_REV}_create_books_table.sql"),
            &revision(
                BOOKS_REV,
                "create books table",
                "CREATE TABLE books (id INTEGER NOT NULL, title VARCHAR(30), author VARCHAR, PRIMARY KEY (id));",
                "DROP TABLE books;",
            ),
        )
        .unwrap();
    project
        .write_revision(
            "two",
            &format!("{USERS_REV}_create_users_table.sql"),
            &revision(
                USERS_REV,
                "create users table",
                "CREATE TABLE users (id INTEGER NOT NULL, name VARCHAR(50), fullname VARCHAR, PRIMARY KEY (id));",
                "DROP TABLE users;",
            ),
        )
        .unwrap();
    (db, project)
}

#[tokio::test]
async fn test_upgrade_both_modules_from_cli() {
    let (db, project) = setup().await;
    let config = project.config_path();

    let one = lineage(&config, &["--name", "one", "upgrade", "head"]);
    assert!(one.status.success(), "{}", String::from_utf8_lossy(&one.stderr));
    let two = lineage(&config, &["--name", "two", "upgrade"]);
    assert!(two.status.success(), "{}", String::from_utf8_lossy(&two.stderr));

    assert_eq!(
        db.table_names().await.unwrap(),
        vec!["alembic_version_one", "alembic_version_two", "books", "users"]
    );

    let current = lineage(&config, &["--name", "one", "current"]);
    assert_eq!(stdout(&current).trim(), format!("{BOOKS_REV} (head)"));

    let again = lineage(&config, &["--name", "two", "upgrade", "head"]);
    assert!(stdout(&again).contains("already at"));
}

#[tokio::test]
async fn test_downgrade_and_offline_sql() {
    let (db, project) = setup().await;
    let config = project.config_path();

    let sql = lineage(&config, &["--name", "one", "upgrade", "head", "--sql"]);
    assert!(sql.status.success());
    let script = stdout(&sql);
    assert!(script.contains("alembic_version_one"));
    assert!(!script.contains("alembic_version_two"));
    assert!(db.table_names().await.unwrap().is_empty());

    let down_sql = lineage(&config, &["--name", "two", "downgrade", "base", "--sql"]);
    assert!(!down_sql.status.success());

    lineage(&config, &["--name", "one", "upgrade"]);
    lineage(&config, &["--name", "two", "upgrade"]);
    let down = lineage(&config, &["--name", "one", "downgrade", "base"]);
    assert!(down.status.success());

    assert!(!db.has_table("books").await.unwrap());
    assert!(db.has_table("users").await.unwrap());
    assert_eq!(
        db.version_of("alembic_version_two").await.unwrap().as_deref(),
        Some(USERS_REV)
    );
}

#[tokio::test]
async fn test_unknown_module_exits_non_zero() {
    let (_db, project) = setup().await;
    let output = lineage(&project.config_path(), &["--name", "three", "current"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown module 'three'"));
    assert!(stderr.contains("one, two"));
}

#[tokio::test]
async fn test_list_modules() {
    let (_db, project) = setup().await;
    let output = lineage(&project.config_path(), &["list"]);

    assert!(output.status.success());
    let listing = stdout(&output);
    assert!(listing.contains("alembic_version_one"));
    assert!(listing.contains("alembic_version_two"));
}
