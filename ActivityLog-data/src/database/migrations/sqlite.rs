use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_physical_activities_table(conn)?;
    create_physical_activities_indexes(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the physical activities table
fn create_physical_activities_table(conn: &Connection) -> Result<(), String> {
    info!("Creating physical_activities table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS physical_activities (
            id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL,
            name TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            duration INTEGER NOT NULL,
            calories REAL NOT NULL,
            steps REAL,
            distance REAL,
            levels TEXT,
            heart_rate_average REAL,
            heart_rate_zones TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Two activities of the same patient may not share a start time
fn create_physical_activities_indexes(conn: &Connection) -> Result<(), String> {
    info!("Creating physical_activities indexes");

    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_physical_activities_patient_start
            ON physical_activities (patient_id, start_time);
         CREATE INDEX IF NOT EXISTS idx_physical_activities_patient_recent
            ON physical_activities (patient_id, start_time DESC);",
    ).map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}
