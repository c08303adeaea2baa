//! Appointment Repository

use super::{RepoError, RepoResult};
use shared::models::{Appointment, AppointmentCreate, AppointmentReschedule};
use sqlx::SqlitePool;

const APPOINTMENT_SELECT: &str = "SELECT id, patient_id, provider_id, datetime, reason, appointment_type, status, encounter_id, created_at, updated_at FROM appointment";

pub async fn create(
    pool: &SqlitePool,
    data: AppointmentCreate,
    now: i64,
) -> RepoResult<Appointment> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO appointment (id, patient_id, provider_id, datetime, reason, appointment_type, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'scheduled', ?7, ?7)",
    )
    .bind(id)
    .bind(data.patient_id)
    .bind(data.provider_id)
    .bind(&data.datetime)
    .bind(&data.reason)
    .bind(data.appointment_type)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create appointment".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Appointment>> {
    let sql = format!("{APPOINTMENT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Appointment>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Update the only scheduling fields orchestration may touch
pub async fn reschedule(
    pool: &SqlitePool,
    id: i64,
    data: AppointmentReschedule,
    now: i64,
) -> RepoResult<Appointment> {
    let rows = sqlx::query(
        "UPDATE appointment SET datetime = COALESCE(?1, datetime), reason = COALESCE(?2, reason), updated_at = ?3 WHERE id = ?4",
    )
    .bind(&data.datetime)
    .bind(&data.reason)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Appointment {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Appointment {id} not found")))
}

/// Write (or clear, with `None`) the encounter back-reference.
///
/// Callers only invoke this after the encounter write has succeeded,
/// so the appointment never points at a row that does not exist.
pub async fn set_encounter_id(
    pool: &SqlitePool,
    id: i64,
    encounter_id: Option<i64>,
    now: i64,
) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE appointment SET encounter_id = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(encounter_id)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Appointment {id} not found")));
    }
    Ok(())
}

/// Scheduled coaching appointments that still need a flow
pub async fn find_coaching_without_encounter(pool: &SqlitePool) -> RepoResult<Vec<Appointment>> {
    let sql = format!(
        "{APPOINTMENT_SELECT} WHERE appointment_type = 'coaching' AND status = 'scheduled' AND encounter_id IS NULL ORDER BY datetime"
    );
    let rows = sqlx::query_as::<_, Appointment>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
