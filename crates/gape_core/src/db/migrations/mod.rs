//! Schema migrations for the block store.
//!
//! # Responsibility
//! - List the schema steps of the block store in the order they apply.
//! - Run pending steps inside one transaction per open.
//!
//! # Invariants
//! - `version` values are strictly increasing, starting at 1.
//! - The version of the last applied step is mirrored to `PRAGMA user_version`.
//! - A failing step rolls back every step of the same run.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "seed_templates",
        sql: include_str!("0002_seed_templates.sql"),
    },
];

/// Highest schema version this build can open.
pub fn latest_version() -> u32 {
    latest_of(MIGRATIONS)
}

/// Brings the connection's schema up to [`latest_version`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    run_pending(conn, MIGRATIONS)
}

fn latest_of(migrations: &[Migration]) -> u32 {
    migrations.last().map_or(0, |migration| migration.version)
}

fn run_pending(conn: &mut Connection, migrations: &[Migration]) -> DbResult<()> {
    let from_version = schema_version(conn)?;
    let latest = latest_of(migrations);
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = migrations
        .iter()
        .filter(|migration| migration.version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in pending {
        let step = format!(
            "{}\nPRAGMA user_version = {};",
            migration.sql, migration.version
        );
        tx.execute_batch(&step)
            .map_err(|source| DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={from_version} to_version={latest}");
    Ok(())
}

fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::{run_pending, schema_version, Migration, MIGRATIONS};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn registered_versions_start_at_one_and_increase() {
        assert_eq!(MIGRATIONS.first().map(|m| m.version), Some(1));
        assert!(MIGRATIONS
            .windows(2)
            .all(|pair| pair[0].version < pair[1].version));
    }

    #[test]
    fn failing_step_names_itself_and_rolls_back_the_run() {
        let mut conn = Connection::open_in_memory().unwrap();
        let steps = [
            Migration {
                version: 1,
                name: "create_things",
                sql: "CREATE TABLE things (id TEXT PRIMARY KEY);",
            },
            Migration {
                version: 2,
                name: "broken",
                sql: "ALTER TABLE missing ADD COLUMN x INTEGER;",
            },
        ];

        match run_pending(&mut conn, &steps).unwrap_err() {
            DbError::Migration { version, name, .. } => {
                assert_eq!(version, 2);
                assert_eq!(name, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(schema_version(&conn).unwrap(), 0);
        let things: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'things';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(things, 0);
    }

    #[test]
    fn only_steps_past_current_version_run() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE things (id TEXT); PRAGMA user_version = 1;")
            .unwrap();
        let steps = [
            Migration {
                version: 1,
                name: "create_things",
                sql: "CREATE TABLE things (id TEXT);",
            },
            Migration {
                version: 2,
                name: "add_label",
                sql: "ALTER TABLE things ADD COLUMN label TEXT;",
            },
        ];

        run_pending(&mut conn, &steps).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 2);
        run_pending(&mut conn, &steps).unwrap();
    }
}
