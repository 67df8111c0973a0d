use carebell_db::{create_pool, run_migrations, DbRuntimeSettings};

#[test]
fn migrations_persist_across_pool_instances() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("carebell.db");
    let path = path.to_str().expect("temp path should be utf-8");

    {
        let pool = create_pool(path, DbRuntimeSettings::default()).expect("failed to create pool");
        let conn = pool.get().expect("failed to get connection");
        let applied = run_migrations(&conn).expect("failed to run migrations");
        assert!(applied > 0);
    }

    let pool = create_pool(path, DbRuntimeSettings::default()).expect("failed to reopen pool");
    let conn = pool.get().expect("failed to get connection");
    let applied = run_migrations(&conn).expect("failed to rerun migrations");
    assert_eq!(applied, 0, "reopened database should already be migrated");

    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
        .expect("failed to prepare table query");
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .expect("failed to execute table query")
        .map(|r| r.expect("failed to read table name"))
        .collect();

    assert_eq!(
        tables,
        vec![
            "_carebell_migrations",
            "daily_summaries",
            "medications",
            "reminder_logs",
            "reminders",
            "sessions",
            "users",
        ]
    );
}
