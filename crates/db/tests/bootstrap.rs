//! Schema bootstrap: migrations apply and the expected tables exist.
//!
//! Needs `DATABASE_URL`; run with `cargo test -p kontrol-db -- --ignored`.

use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_full_bootstrap(pool: PgPool) {
    kontrol_db::health_check(&pool).await.unwrap();

    let tables = [
        "organizations",
        "areas",
        "departments",
        "users",
        "clients",
        "master_controls",
        "control_items",
        "inspection_sessions",
        "inspection_reports",
    ];
    for table in tables {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}
