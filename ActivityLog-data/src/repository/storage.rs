use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{types::Type, OptionalExtension, Row};
use tracing::debug;

use crate::models::physical_activity::{ActivityFilter, PhysicalActivity};
use crate::database::DatabasePool;
use super::errors::RepositoryError;

const SELECT_COLUMNS: &str =
    "SELECT id, patient_id, name, start_time, end_time, duration, calories, steps, distance,
            levels, heart_rate_average, heart_rate_zones
     FROM physical_activities";

/// Timestamps are stored with a fixed width so that text ordering matches time ordering
fn to_db_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn from_db_time(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn from_db_json<T: serde::de::DeserializeOwned>(idx: usize, value: Option<String>) -> rusqlite::Result<Option<T>> {
    value
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_activity(row: &Row<'_>) -> rusqlite::Result<PhysicalActivity> {
    Ok(PhysicalActivity {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        name: row.get(2)?,
        start_time: from_db_time(3, row.get(3)?)?,
        end_time: from_db_time(4, row.get(4)?)?,
        duration: row.get::<_, i64>(5)? as u64,
        calories: row.get(6)?,
        steps: row.get(7)?,
        distance: row.get(8)?,
        levels: from_db_json(9, row.get(9)?)?,
        heart_rate_average: row.get(10)?,
        heart_rate_zones: from_db_json(11, row.get(11)?)?,
    })
}

/// Database storage operations for physical activities
pub struct DatabaseStorage;

impl DatabaseStorage {
    /// Check whether an activity with the same patient and start time is stored
    pub async fn exists(pool: &DatabasePool, patient_id: &str, start_time: &DateTime<Utc>) -> Result<bool, RepositoryError> {
        debug!("Checking for existing physical activity: patient_id={}", patient_id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let exists = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM physical_activities WHERE patient_id = ?1 AND start_time = ?2)",
                    (patient_id, to_db_time(start_time)),
                    |row| row.get::<_, bool>(0),
                )?;

                Ok(exists)
            },
        }
    }

    /// Store an activity in the database
    pub async fn store_activity(pool: &DatabasePool, activity: &PhysicalActivity) -> Result<(), RepositoryError> {
        debug!("Storing physical activity in database: id={}", activity.id);

        let levels = activity.levels.as_ref().map(serde_json::to_string).transpose()?;
        let zones = activity.heart_rate_zones.as_ref().map(serde_json::to_string).transpose()?;

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let result = conn.execute(
                    "INSERT INTO physical_activities
                     (id, patient_id, name, start_time, end_time, duration, calories, steps, distance,
                      levels, heart_rate_average, heart_rate_zones, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    rusqlite::params![
                        &activity.id,
                        &activity.patient_id,
                        &activity.name,
                        to_db_time(&activity.start_time),
                        to_db_time(&activity.end_time),
                        activity.duration as i64,
                        activity.calories,
                        activity.steps,
                        activity.distance,
                        levels,
                        activity.heart_rate_average,
                        zones,
                        to_db_time(&Utc::now()),
                    ],
                );

                match result {
                    Ok(_) => Ok(()),
                    Err(rusqlite::Error::SqliteFailure(err, _))
                        if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        Err(RepositoryError::Conflict(format!(
                            "activity starting at {} already stored for patient {}",
                            to_db_time(&activity.start_time),
                            activity.patient_id
                        )))
                    },
                    Err(e) => Err(RepositoryError::Sqlite(e)),
                }
            },
        }
    }

    /// Get a patient's activity by ID
    pub async fn get_by_id_and_patient(
        pool: &DatabasePool,
        id: &str,
        patient_id: &str,
    ) -> Result<Option<PhysicalActivity>, RepositoryError> {
        debug!("Getting physical activity from database: id={}, patient_id={}", id, patient_id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let mut stmt = conn.prepare(&format!("{} WHERE id = ?1 AND patient_id = ?2", SELECT_COLUMNS))?;

                let activity = stmt
                    .query_row((id, patient_id), row_to_activity)
                    .optional()?;

                Ok(activity)
            },
        }
    }

    /// Get a filtered page of a patient's activities with the total match count
    pub async fn get_by_patient(
        pool: &DatabasePool,
        patient_id: &str,
        filter: &ActivityFilter,
    ) -> Result<(Vec<PhysicalActivity>, usize), RepositoryError> {
        debug!("Getting filtered physical activities from database: patient_id={}", patient_id);

        let sort_direction = if filter.sort_desc.unwrap_or(true) { "DESC" } else { "ASC" };
        // SQLite treats a negative limit as unbounded
        let limit_val = filter.limit.map(|l| l as i64).unwrap_or(-1);
        let offset_val = filter.offset.unwrap_or(0);

        let start_string = filter.start_date.as_ref().map(to_db_time);
        let end_string = filter.end_date.as_ref().map(to_db_time);

        let mut where_clauses = vec!["patient_id = ?"];
        let mut params: Vec<&dyn rusqlite::ToSql> = vec![&patient_id];

        if let Some(ref start) = start_string {
            where_clauses.push("start_time >= ?");
            params.push(start as &dyn rusqlite::ToSql);
        }

        if let Some(ref end) = end_string {
            where_clauses.push("start_time <= ?");
            params.push(end as &dyn rusqlite::ToSql);
        }

        let where_sql = where_clauses.join(" AND ");

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let query = format!(
                    "{} WHERE {} ORDER BY start_time {} LIMIT {} OFFSET {}",
                    SELECT_COLUMNS, where_sql, sort_direction, limit_val, offset_val
                );
                let mut stmt = conn.prepare(&query)?;
                let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), row_to_activity)?;

                let mut result = Vec::new();
                for activity in rows {
                    result.push(activity?);
                }

                let count_query = format!("SELECT COUNT(*) FROM physical_activities WHERE {}", where_sql);
                let total: i64 = conn.query_row(
                    &count_query,
                    rusqlite::params_from_iter(params.iter()),
                    |row| row.get(0),
                )?;

                Ok((result, total as usize))
            },
        }
    }

    /// Delete a patient's activity, returning whether a row was removed
    pub async fn delete_by_patient(pool: &DatabasePool, id: &str, patient_id: &str) -> Result<bool, RepositoryError> {
        debug!("Deleting physical activity from database: id={}, patient_id={}", id, patient_id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let removed = conn.execute(
                    "DELETE FROM physical_activities WHERE id = ?1 AND patient_id = ?2",
                    (id, patient_id),
                )?;

                Ok(removed > 0)
            },
        }
    }

    /// Count a patient's activities
    pub async fn count_by_patient(pool: &DatabasePool, patient_id: &str) -> Result<usize, RepositoryError> {
        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let total: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM physical_activities WHERE patient_id = ?1",
                    [patient_id],
                    |row| row.get(0),
                )?;

                Ok(total as usize)
            },
        }
    }
}
