//! File-backed database opened from the environment, plus the schema check.
//!
//! Kept to a single test: it owns the process-wide connection and the
//! environment of this test binary.

use liteorm::connection::{self, DATABASE_DIR_ENV, DATABASE_ENV, SchemaIssue};
use liteorm::prelude::*;

#[derive(Debug, Default, Entity)]
struct Note {
    #[orm(primary_key, auto_increment)]
    id: i64,
    body: String,
    #[orm(column = "createdBy")]
    created_by: String,
}

#[derive(Debug, Default, Entity)]
#[orm(table = "tags")]
struct Tag {
    #[orm(primary_key)]
    name: String,
}

#[test]
fn open_from_env_and_check_schema() {
    let dir = tempfile::tempdir().unwrap();

    assert!(!connection::is_initialized());
    let err = liteorm::select::<Note>().get_list().unwrap_err();
    assert!(err.is_not_initialized(), "{err}");

    // SAFETY: this binary runs a single test, so nothing reads the
    // environment concurrently.
    unsafe {
        std::env::set_var(DATABASE_ENV, "notes.db");
        std::env::set_var(DATABASE_DIR_ENV, dir.path());
    }
    let config = ConnectionConfig::from_env().unwrap();
    assert_eq!(config.path(), dir.path().join("notes.db"));

    connection::init(&config).unwrap();
    // Later calls keep the first connection.
    connection::init(&ConnectionConfig::in_memory()).unwrap();
    assert!(dir.path().join("notes.db").exists());

    connection::execute_batch("create table note (id integer primary key autoincrement, body text);")
        .unwrap();

    let issues = connection::check_entities().unwrap();
    assert_eq!(
        issues,
        [
            SchemaIssue::MissingColumn {
                entity: "Note".to_string(),
                table: "note".to_string(),
                column: "createdBy".to_string(),
            },
            SchemaIssue::MissingTable {
                entity: "Tag".to_string(),
                table: "tags".to_string(),
            },
        ]
    );
    assert_eq!(issues[1].to_string(), "Tag: table 'tags' does not exist");

    connection::execute_batch(
        "alter table note add column createdBy text;
         create table tags (name text primary key);",
    )
    .unwrap();
    assert!(connection::check_entities().unwrap().is_empty());

    let mut note = Note {
        body: "hello".to_string(),
        created_by: "nick".to_string(),
        ..Default::default()
    };
    liteorm::insert(&mut note).execute().unwrap();
    let stored = liteorm::select::<Note>().get_first().unwrap().unwrap();
    assert_eq!(stored.created_by, "nick");
    assert_eq!(stored.id, note.id);

    let registered: Vec<_> = liteorm::registry::entities()
        .iter()
        .map(|d| d.table)
        .collect();
    assert_eq!(registered, ["note", "tags"]);
}
