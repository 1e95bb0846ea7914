use std::fs;
use std::sync::Arc;

use async_trait::async_trait;
use modelsmith::catalog::{
    CatalogFacade, CatalogSource, Column, FacadeOptions, ForeignKeyEdge, SnapshotCatalog,
    SqliteCatalog, Table,
};
use modelsmith::pipeline::{CancelToken, Generator, GeneratorOptions};
use modelsmith::{GenerateError, GenerateResult};
use rusqlite::Connection;
use tempfile::TempDir;

const SHOP_DDL: &str = "
    CREATE TABLE customer (
        id INTEGER PRIMARY KEY,
        email VARCHAR(255) NOT NULL UNIQUE,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );
    CREATE TABLE product (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        price DECIMAL(10,2) NOT NULL
    );
    CREATE TABLE purchase (
        id INTEGER PRIMARY KEY,
        customer_id INTEGER NOT NULL REFERENCES customer(id),
        product_id INTEGER NOT NULL REFERENCES product(id)
    );
";

fn shop() -> SqliteCatalog {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SHOP_DDL).unwrap();
    SqliteCatalog::from_connection(conn)
}

fn library() -> SnapshotCatalog {
    SnapshotCatalog::new()
        .table(
            Table::new("author")
                .column(Column::new("id", "int").primary_key().auto_increment())
                .column(Column::new("name", "varchar(100)")),
        )
        .table(
            Table::new("book")
                .column(Column::new("id", "int").primary_key().auto_increment())
                .column(Column::new("title", "varchar(200)"))
                .column(Column::new("author_id", "int"))
                .foreign_key("author_id", "author", "id"),
        )
}

async fn facade(catalog: SnapshotCatalog) -> CatalogFacade {
    CatalogFacade::open(Arc::new(catalog), FacadeOptions::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_repeated_runs_are_byte_identical() {
    let facade = facade(library()).await;
    let first = Generator::default().run(&facade).await.unwrap();
    let second = Generator::default().run(&facade).await.unwrap();

    assert_eq!(first.digest, second.digest);
    for (a, b) in first.artifacts.iter().zip(&second.artifacts) {
        assert_eq!(a, b);
    }
}

#[tokio::test]
async fn test_sqlite_and_replayed_snapshot_agree() {
    let live = CatalogFacade::open(Arc::new(shop()), FacadeOptions::default())
        .await
        .unwrap();
    let from_live = Generator::default().run(&live).await.unwrap();

    let json = live.prefetch().await.unwrap().to_json().unwrap();
    let replayed = facade(SnapshotCatalog::from_json(&json).unwrap()).await;
    let from_snapshot = Generator::default().run(&replayed).await.unwrap();

    assert_eq!(from_live.digest, from_snapshot.digest);
    let names: Vec<_> = from_live.artifacts.iter().map(|a| a.file_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Customer.model.ts",
            "Product.model.ts",
            "Purchase.model.ts",
            "init-models.ts"
        ]
    );
}

#[tokio::test]
async fn test_registry_wires_associations_in_table_order() {
    let output = Generator::default().run(&facade(library()).await).await.unwrap();
    let init = &output.artifacts.last().unwrap().contents;

    assert!(init.contains("import Author from './Author.model';"));
    assert!(init.contains("import Book from './Book.model';"));
    assert!(init.contains(r#"Book.belongsTo(Author, {"foreignKey":"authorId"});"#));
    assert!(init.find("Author,").unwrap() < init.find("Book,").unwrap());

    let book = &output.artifacts[1].contents;
    assert!(book.contains("@BelongsTo(() => Author"));
    assert!(book.contains("declare author: Author;"));

    // the target entity stays one-sided
    let author = &output.artifacts[0].contents;
    assert!(!author.contains("@HasMany"));
}

#[tokio::test]
async fn test_join_table_registers_many_to_many() {
    let live = CatalogFacade::open(Arc::new(shop()), FacadeOptions::default())
        .await
        .unwrap();
    let output = Generator::default().run(&live).await.unwrap();
    let init = &output.artifacts.last().unwrap().contents;

    assert!(init.contains(
        r#"Purchase.belongsToMany(Customer, {"foreignKey":"customerId","otherKey":"productId","through":"customer_product"});"#
    ));
    assert!(init.contains(
        r#"Purchase.belongsToMany(Product, {"foreignKey":"productId","otherKey":"productId","through":"customer_product"});"#
    ));
}

#[tokio::test]
async fn test_cancel_before_run_yields_nothing() {
    let token = CancelToken::new();
    token.cancel();
    let generator = Generator::default().with_cancel_token(token);

    let err = generator.run(&facade(library()).await).await.unwrap_err();
    match err {
        GenerateError::Cancelled { table } => assert_eq!(table, "author"),
        other => panic!("expected Cancelled, got {:?}", other),
    }
}

/// Cancels the run while the columns of `cancel_at` are being fetched.
struct CancellingSource {
    inner: SnapshotCatalog,
    cancel_at: &'static str,
    token: CancelToken,
}

#[async_trait]
impl CatalogSource for CancellingSource {
    async fn list_tables(&self) -> GenerateResult<Vec<String>> {
        self.inner.list_tables().await
    }

    async fn columns_of(&self, table: &str) -> GenerateResult<Vec<Column>> {
        if table == self.cancel_at {
            self.token.cancel();
        }
        self.inner.columns_of(table).await
    }

    async fn foreign_keys_of(&self, table: &str) -> GenerateResult<Vec<ForeignKeyEdge>> {
        self.inner.foreign_keys_of(table).await
    }
}

#[tokio::test]
async fn test_cancel_mid_table_abandons_that_table() {
    let token = CancelToken::new();
    let source = CancellingSource {
        inner: library(),
        cancel_at: "book",
        token: token.clone(),
    };
    let facade = CatalogFacade::open(Arc::new(source), FacadeOptions::default())
        .await
        .unwrap();

    let result = Generator::default()
        .with_cancel_token(token)
        .run(&facade)
        .await;
    match result {
        Err(GenerateError::Cancelled { table }) => assert_eq!(table, "book"),
        Err(other) => panic!("expected Cancelled, got {:?}", other),
        Ok(_) => panic!("cancelled run produced output"),
    }
}

#[tokio::test]
async fn test_column_named_after_target_does_not_clash() {
    let catalog = SnapshotCatalog::new()
        .table(Table::new("category").column(Column::new("id", "int").primary_key()))
        .table(
            Table::new("post")
                .column(Column::new("id", "int").primary_key())
                .column(Column::new("category", "int"))
                .foreign_key("category", "category", "id"),
        );
    let output = Generator::default().run(&facade(catalog).await).await.unwrap();
    let post = &output.artifacts[1].contents;

    assert_eq!(post.matches("declare category:").count(), 1);
    assert!(post.contains("declare category: number;"));
    assert!(post.contains("declare categoryCategory: Category;"));
}

#[tokio::test]
async fn test_dangling_reference_fails_the_whole_run() {
    let catalog = library().table(
        Table::new("review")
            .column(Column::new("id", "int").primary_key())
            .column(Column::new("publisher_id", "int"))
            .foreign_key("publisher_id", "publisher", "id"),
    );
    let err = Generator::default()
        .run(&facade(catalog).await)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GenerateError::DanglingReference { ref table, .. } if table == "review"
    ));
}

#[tokio::test]
async fn test_write_to_places_every_artifact() {
    let output = Generator::new(GeneratorOptions::default())
        .run(&facade(library()).await)
        .await
        .unwrap();
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("models");

    let written = output.write_to(&dir).unwrap();
    assert_eq!(written.len(), 3);
    for artifact in &output.artifacts {
        let on_disk = fs::read_to_string(dir.join(&artifact.file_name)).unwrap();
        assert_eq!(on_disk, artifact.contents);
    }
}
