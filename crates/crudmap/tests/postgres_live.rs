use crudmap::clock::parse_timestamp;
use crudmap::{
    ColumnMap, CrudResult, Database, PgConnector, Value, stmt,
};
use std::time::{SystemTime, UNIX_EPOCH};

fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").ok()
}

#[tokio::test]
async fn postgres_round_trip() -> CrudResult<()> {
    let Some(url) = database_url() else {
        eprintln!("DATABASE_URL is not set; skipping postgres_round_trip");
        return Ok(());
    };

    let db = Database::new(PgConnector::from_url(&url)?);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    let table = format!("crudmap_test_{}_{}", std::process::id(), nanos);

    db.execute_sql(
        &format!(
            "CREATE TABLE {table} (
                id BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                score DOUBLE PRECISION,
                active BOOLEAN,
                createtime TIMESTAMP NOT NULL,
                modifiedtime TIMESTAMP NOT NULL
            )"
        ),
        vec![],
    )
    .await?;

    let result = async {
        let record = ColumnMap::new()
            .with("id", 1)
            .with("name", "O'Brien; DROP TABLE x")
            .with("score", 2.5)
            .with("active", Value::Null);
        assert_eq!(db.insert(&table, record.clone()).await?, 1);

        let rows = db
            .fetch(&stmt::select_all(&table).eq("id", 1))
            .await?;
        assert_eq!(rows.len(), 1);
        let row = &rows.rows()[0];
        for (column, value) in record.iter() {
            assert_eq!(row.get(column), Some(value), "column {column}");
        }
        let created = row.get("createtime").cloned().expect("createtime");
        assert!(parse_timestamp(&created.to_string()).is_some());

        let none = db
            .select(&table, ["id"], Some(ColumnMap::new().with("id", 2)))
            .await?;
        assert!(none.is_empty());

        assert_eq!(
            db.update(&table, ColumnMap::new().with("active", true), Some(ColumnMap::new().with("id", 1)))
                .await?,
            1
        );
        let after = db
            .select(&table, ["createtime", "active"], Some(ColumnMap::new().with("id", 1)))
            .await?;
        assert_eq!(after.rows()[0].get("createtime"), Some(&created));
        assert_eq!(after.rows()[0].get("active"), Some(&Value::Bool(true)));

        assert_eq!(db.delete(&table, ColumnMap::new().with("id", 1)).await?, 1);
        CrudResult::Ok(())
    }
    .await;

    db.execute_sql(&format!("DROP TABLE {table}"), vec![]).await?;
    result
}
