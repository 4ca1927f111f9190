use blogstore_core::db::migrations::latest_version;
use blogstore_core::db::{close_db, open_db, open_db_in_memory, reset_db, DbError};
use blogstore_core::{NewUser, SqliteUserRepository, UserRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "users");
    assert_table_exists(&conn, "posts");
}

#[test]
fn open_db_enables_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent_and_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blogstore.db");

    let conn_first = open_db(&path).unwrap();
    SqliteUserRepository::try_new(&conn_first)
        .unwrap()
        .create_user(&NewUser::new("Kites", "i@kites.cc"))
        .unwrap();
    close_db(conn_first).unwrap();

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_eq!(row_count(&conn_second, "users"), 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn reset_wipes_rows_and_restarts_identifiers() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let repo = SqliteUserRepository::try_new(&conn).unwrap();
        repo.create_user(&NewUser::new("Kites", "i@kites.cc")).unwrap();
        repo.create_user(&NewUser::new("Kites2", "i2@kites.cc"))
            .unwrap();
    }
    conn.execute(
        "INSERT INTO posts (title, author_id) VALUES ('A Post', 1);",
        [],
    )
    .unwrap();

    reset_db(&mut conn).unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(row_count(&conn, "users"), 0);
    assert_eq!(row_count(&conn, "posts"), 0);

    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    let fresh = repo
        .create_user(&NewUser::new("Kites", "i@kites.cc"))
        .unwrap();
    assert_eq!(fresh.id, 1);
}

#[test]
fn reset_on_file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reset.db");

    let mut conn = open_db(&path).unwrap();
    SqliteUserRepository::try_new(&conn)
        .unwrap()
        .create_user(&NewUser::new("Kites", "i@kites.cc"))
        .unwrap();
    reset_db(&mut conn).unwrap();
    close_db(conn).unwrap();

    let reopened = open_db(&path).unwrap();
    assert_eq!(row_count(&reopened, "users"), 0);
}

#[test]
fn failed_reset_keeps_previous_schema_and_rows() {
    let mut conn = open_db_in_memory().unwrap();
    SqliteUserRepository::try_new(&conn)
        .unwrap()
        .create_user(&NewUser::new("Kites", "i@kites.cc"))
        .unwrap();
    // A table squatting on an index name makes the rebuild fail halfway.
    conn.execute_batch(
        "DROP INDEX idx_posts_title;
         CREATE TABLE idx_posts_title (id INTEGER);",
    )
    .unwrap();

    assert!(reset_db(&mut conn).is_err());

    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(row_count(&conn, "users"), 1);
    assert_table_exists(&conn, "posts");
    assert!(SqliteUserRepository::try_new(&conn)
        .unwrap()
        .find_user_by_email("i@kites.cc")
        .unwrap()
        .is_some());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
