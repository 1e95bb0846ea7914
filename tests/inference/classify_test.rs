use std::sync::Arc;

use modelsmith::catalog::{
    CatalogFacade, Column, FacadeOptions, ForeignKeyEdge, SnapshotCatalog, SqliteCatalog, Table,
};
use modelsmith::inference::{through_name, InferenceEngine, Relationship, RelationshipKind};
use modelsmith::model::Pluralization;
use modelsmith::GenerateError;
use rusqlite::Connection;

async fn facade(catalog: SnapshotCatalog) -> CatalogFacade {
    CatalogFacade::open(Arc::new(catalog), FacadeOptions::default())
        .await
        .unwrap()
}

async fn classify_all(catalog: SnapshotCatalog, table: &str) -> Vec<Relationship> {
    let facade = facade(catalog).await;
    let edges = facade.foreign_keys_of(table).await.unwrap();
    InferenceEngine::default()
        .classify_table(&facade, table, &edges)
        .await
        .unwrap()
}

fn author_book() -> SnapshotCatalog {
    SnapshotCatalog::new()
        .table(Table::new("author").column(Column::new("id", "int").primary_key()))
        .table(
            Table::new("book")
                .column(Column::new("id", "int").primary_key())
                .column(Column::new("author_id", "int"))
                .foreign_key("author_id", "author", "id"),
        )
}

fn school() -> SnapshotCatalog {
    SnapshotCatalog::new()
        .table(Table::new("student").column(Column::new("id", "int").primary_key()))
        .table(Table::new("course").column(Column::new("id", "int").primary_key()))
        .table(
            Table::new("student_course")
                .column(Column::new("id", "int").primary_key())
                .column(Column::new("student_id", "int"))
                .column(Column::new("course_id", "int"))
                .foreign_key("student_id", "student", "id")
                .foreign_key("course_id", "course", "id"),
        )
}

#[tokio::test]
async fn test_author_book_is_many_to_one() {
    let rels = classify_all(author_book(), "book").await;
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].kind, RelationshipKind::ManyToOne);
    assert_eq!(rels[0].target_entity, "Author");
    assert_eq!(rels[0].property_name, "author");
    assert_eq!(rels[0].through, None);

    // no automatic inverse on the target
    assert!(classify_all(author_book(), "author").await.is_empty());
}

#[tokio::test]
async fn test_reverse_edge_turns_many_to_one_into_one_to_many() {
    let forward_only = SnapshotCatalog::new()
        .table(Table::new("customer").column(Column::new("id", "int").primary_key()))
        .table(
            Table::new("order")
                .column(Column::new("id", "int").primary_key())
                .column(Column::new("customer_id", "int"))
                .foreign_key("customer_id", "customer", "id"),
        );
    let rels = classify_all(forward_only.clone(), "order").await;
    assert_eq!(rels[0].kind, RelationshipKind::ManyToOne);
    assert_eq!(rels[0].property_name, "customer");

    let bidirectional = forward_only.table(
        Table::new("customer")
            .column(Column::new("id", "int").primary_key())
            .column(Column::new("last_order_id", "int").nullable())
            .foreign_key("last_order_id", "order", "id"),
    );
    let rels = classify_all(bidirectional, "order").await;
    assert_eq!(rels[0].kind, RelationshipKind::OneToMany);
    assert_eq!(rels[0].property_name, "customers");
}

#[tokio::test]
async fn test_unique_column_is_one_to_one_even_with_reverse_edge() {
    let catalog = SnapshotCatalog::new()
        .table(
            Table::new("user")
                .column(Column::new("id", "int").primary_key())
                .column(Column::new("profile_id", "int").nullable())
                .foreign_key("profile_id", "profile", "id"),
        )
        .table(
            Table::new("profile")
                .column(Column::new("id", "int").primary_key())
                .column(Column::new("user_id", "int").unique())
                .foreign_key("user_id", "user", "id"),
        );
    let rels = classify_all(catalog, "profile").await;
    assert_eq!(rels[0].kind, RelationshipKind::OneToOne);
    assert_eq!(rels[0].property_name, "user");
}

#[tokio::test]
async fn test_primary_key_reference_is_one_to_one() {
    let catalog = SnapshotCatalog::new()
        .table(Table::new("account").column(Column::new("id", "int").primary_key()))
        .table(
            Table::new("account_settings")
                .column(Column::new("account_id", "int").primary_key())
                .foreign_key("account_id", "account", "id"),
        );
    let rels = classify_all(catalog, "account_settings").await;
    assert_eq!(rels[0].kind, RelationshipKind::OneToOne);
}

#[tokio::test]
async fn test_join_table_is_many_to_many_with_symmetric_through() {
    let rels = classify_all(school(), "student_course").await;
    assert_eq!(rels.len(), 2);
    for rel in &rels {
        assert_eq!(rel.kind, RelationshipKind::ManyToMany);
        assert_eq!(rel.through.as_deref(), Some("course_student"));
        assert_eq!(rel.other_key.as_deref(), Some("course_id"));
    }
    assert_eq!(rels[0].target_entity, "Student");
    assert_eq!(rels[0].property_name, "students");
    assert_eq!(rels[1].target_entity, "Course");
    assert_eq!(rels[1].property_name, "courses");
}

#[tokio::test]
async fn test_through_name_does_not_depend_on_processing_order() {
    // Same join table, foreign keys declared the other way round.
    let reversed = SnapshotCatalog::new()
        .table(Table::new("course").column(Column::new("id", "int").primary_key()))
        .table(Table::new("student").column(Column::new("id", "int").primary_key()))
        .table(
            Table::new("student_course")
                .column(Column::new("id", "int").primary_key())
                .column(Column::new("course_id", "int"))
                .column(Column::new("student_id", "int"))
                .foreign_key("course_id", "course", "id")
                .foreign_key("student_id", "student", "id"),
        );
    let a = classify_all(school(), "student_course").await;
    let b = classify_all(reversed, "student_course").await;
    assert_eq!(a[0].through, b[0].through);
    assert_eq!(a[1].through, b[1].through);
    assert_eq!(through_name("student", "course"), through_name("course", "student"));
}

#[tokio::test]
async fn test_join_table_check_precedes_uniqueness() {
    // student_id is the primary key, so it is unique, but the table still has
    // two other indexed references and reads as a join table.
    let catalog = school().table(
        Table::new("enrollment")
            .column(Column::new("student_id", "int").primary_key())
            .column(Column::new("course_id", "int"))
            .column(Column::new("mentor_id", "int"))
            .foreign_key("student_id", "student", "id")
            .foreign_key("course_id", "course", "id")
            .foreign_key("mentor_id", "student", "id"),
    );
    let rels = classify_all(catalog, "enrollment").await;
    assert_eq!(rels.len(), 3);
    assert!(rels.iter().all(|r| r.kind == RelationshipKind::ManyToMany));
    assert_eq!(rels[0].property_name, "students");
    assert_eq!(rels[2].property_name, "mentorIdStudent");
}

#[tokio::test]
async fn test_dangling_reference_is_an_error() {
    let catalog = SnapshotCatalog::new().table(
        Table::new("book")
            .column(Column::new("id", "int").primary_key())
            .column(Column::new("publisher_id", "int"))
            .foreign_key("publisher_id", "publisher", "id"),
    );
    let facade = facade(catalog).await;
    let edge = facade.foreign_keys_of("book").await.unwrap().remove(0);

    let err = InferenceEngine::default()
        .classify(&facade, "book", &edge)
        .await
        .unwrap_err();
    match err {
        GenerateError::DanglingReference {
            table,
            column,
            target_table,
            constraint,
        } => {
            assert_eq!(table, "book");
            assert_eq!(column, "publisher_id");
            assert_eq!(target_table, "publisher");
            assert_eq!(constraint, "fk_book_publisher_id");
        }
        other => panic!("expected DanglingReference, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_source_column_is_schema_not_found() {
    let catalog = author_book();
    let facade = facade(catalog).await;
    let edge = ForeignKeyEdge::new("book", "editor_id", "author", "id", "fk_book_editor");

    let err = InferenceEngine::default()
        .classify(&facade, "book", &edge)
        .await
        .unwrap_err();
    assert!(matches!(err, GenerateError::SchemaNotFound { column: Some(ref c), .. } if c == "editor_id"));
}

#[tokio::test]
async fn test_every_edge_gets_exactly_one_kind() {
    let catalog = school()
        .table(Table::new("author").column(Column::new("id", "int").primary_key()))
        .table(
            Table::new("book")
                .column(Column::new("id", "int").primary_key())
                .column(Column::new("author_id", "int"))
                .column(Column::new("editor_id", "int").unique())
                .foreign_key("author_id", "author", "id")
                .foreign_key("editor_id", "author", "id"),
        );
    let facade = facade(catalog).await;
    let engine = InferenceEngine::default();

    let mut total_edges = 0;
    let mut total_rels = 0;
    for table in facade.list_tables() {
        let edges = facade.foreign_keys_of(table).await.unwrap();
        total_edges += edges.len();
        total_rels += engine.classify_table(&facade, table, &edges).await.unwrap().len();
    }
    assert_eq!(total_edges, total_rels);
    assert_eq!(total_edges, 4);
}

#[tokio::test]
async fn test_english_pluralization() {
    let catalog = SnapshotCatalog::new()
        .table(
            Table::new("category")
                .column(Column::new("id", "int").primary_key())
                .column(Column::new("featured_entry_id", "int").nullable())
                .foreign_key("featured_entry_id", "entry", "id"),
        )
        .table(
            Table::new("entry")
                .column(Column::new("id", "int").primary_key())
                .column(Column::new("category_id", "int"))
                .foreign_key("category_id", "category", "id"),
        );
    let facade = facade(catalog).await;
    let edges = facade.foreign_keys_of("entry").await.unwrap();

    let suffix = InferenceEngine::default()
        .classify(&facade, "entry", &edges[0])
        .await
        .unwrap();
    let english = InferenceEngine::new(Pluralization::English)
        .classify(&facade, "entry", &edges[0])
        .await
        .unwrap();
    assert_eq!(suffix.property_name, "categorys");
    assert_eq!(english.property_name, "categories");
}

#[tokio::test]
async fn test_composite_primary_key_members_fall_back_to_one_to_one() {
    // Both reference columns are PRI, so the join-table shape (two MUL
    // columns) does not match and each edge is classified on its own.
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "
        CREATE TABLE student (id INTEGER PRIMARY KEY);
        CREATE TABLE course (id INTEGER PRIMARY KEY);
        CREATE TABLE student_course (
            student_id INTEGER NOT NULL REFERENCES student(id),
            course_id INTEGER NOT NULL REFERENCES course(id),
            PRIMARY KEY (student_id, course_id)
        );
        ",
    )
    .unwrap();
    let facade = CatalogFacade::open(
        Arc::new(SqliteCatalog::from_connection(conn)),
        FacadeOptions::default(),
    )
    .await
    .unwrap();
    let edges = facade.foreign_keys_of("student_course").await.unwrap();

    assert!(!facade.is_join_table("student_course").await.unwrap());
    let rels = InferenceEngine::default()
        .classify_table(&facade, "student_course", &edges)
        .await
        .unwrap();
    assert_eq!(rels.len(), 2);
    assert!(rels.iter().all(|r| r.kind == RelationshipKind::OneToOne));
    assert!(rels.iter().all(|r| r.through.is_none()));
}
