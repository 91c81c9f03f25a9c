use lineage_orm::{CrudOperations, Inspector, Model, SchemaBuilder};
use lineage_plugins::one::Book;
use lineage_plugins::two::User;
use lineage_testing::TestDatabase;

async fn create_tables(db: &TestDatabase) {
    let mut builder = SchemaBuilder::new();
    builder.create_table_from(&Book::table());
    builder.create_table_from(&User::table());
    for statement in builder.to_sql() {
        db.execute(&statement).await.unwrap();
    }
}

#[tokio::test]
async fn test_declared_tables_reflect_back() {
    let db = TestDatabase::new().await.unwrap();
    create_tables(&db).await;

    let inspector = Inspector::new(db.pool());
    let books = inspector.reflect_table("books").await.unwrap().unwrap();
    assert_eq!(books, Book::table());

    let users = inspector.reflect_table("users").await.unwrap().unwrap();
    assert_eq!(users.primary_key_columns(), vec!["id"]);
    assert_eq!(
        db.column_names("users").await.unwrap(),
        vec!["id", "name", "fullname"]
    );
}

#[tokio::test]
async fn test_book_crud() {
    let db = TestDatabase::new().await.unwrap();
    create_tables(&db).await;

    let created = Book::create(db.pool(), Book::new("Dune", "Frank Herbert")).await.unwrap();
    let id = created.id.unwrap();
    assert_eq!(created.title.as_deref(), Some("Dune"));

    let mut found = Book::find_or_fail(db.pool(), id).await.unwrap();
    found.title = Some("Dune Messiah".to_string());
    found.update(db.pool()).await.unwrap();

    let all = Book::all(db.pool()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title.as_deref(), Some("Dune Messiah"));

    found.delete(db.pool()).await.unwrap();
    assert!(Book::find(db.pool(), id).await.unwrap().is_none());
    assert_eq!(Book::count(db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_user_crud_and_missing_rows() {
    let db = TestDatabase::new().await.unwrap();
    create_tables(&db).await;

    let ada = User::create(db.pool(), User::new("ada", "Ada Lovelace")).await.unwrap();
    User::create(db.pool(), User::new("alan", "Alan Turing")).await.unwrap();
    assert_eq!(User::count(db.pool()).await.unwrap(), 2);
    assert_eq!(db.count_records("users").await.unwrap(), 2);

    let mut ghost = ada.clone();
    ghost.set_primary_key(999);
    assert!(ghost.update(db.pool()).await.is_err());
    assert!(User::find_or_fail(db.pool(), 999).await.is_err());

    let names: Vec<_> = User::all(db.pool())
        .await
        .unwrap()
        .into_iter()
        .filter_map(|u| u.name)
        .collect();
    assert_eq!(names, vec!["ada", "alan"]);
}
