//! Encounter Repository

use super::{RepoError, RepoResult};
use shared::models::{BusinessType, Encounter, EncounterUpdate};
use sqlx::SqlitePool;

const ENCOUNTER_SELECT: &str = "SELECT id, patient_id, provider_id, title, date, status, encounter_type, business_type, appointment_id, order_id, provider_name, provider_notes, finalized_at, finalized_by, created_at, updated_at FROM encounter";

/// Insert a fully-built encounter row.
///
/// Uses `INSERT OR IGNORE` against the unique partial indexes on
/// `(order_id)` and `(appointment_id, business_type)`: a concurrent
/// duplicate insert is silently skipped and reported as `false`, and
/// the caller re-selects the winner row. This is what closes the
/// check-then-act race on flow creation.
pub async fn insert(pool: &SqlitePool, enc: &Encounter) -> RepoResult<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO encounter (id, patient_id, provider_id, title, date, status, encounter_type, business_type, appointment_id, order_id, provider_name, provider_notes, finalized_at, finalized_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
    )
    .bind(enc.id)
    .bind(enc.patient_id)
    .bind(enc.provider_id)
    .bind(&enc.title)
    .bind(&enc.date)
    .bind(enc.status)
    .bind(enc.encounter_type)
    .bind(enc.business_type)
    .bind(enc.appointment_id)
    .bind(enc.order_id)
    .bind(&enc.provider_name)
    .bind(&enc.provider_notes)
    .bind(enc.finalized_at)
    .bind(enc.finalized_by)
    .bind(enc.created_at)
    .bind(enc.updated_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Encounter>> {
    let sql = format!("{ENCOUNTER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Encounter>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_order_id(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<Encounter>> {
    let sql = format!("{ENCOUNTER_SELECT} WHERE order_id = ?");
    let row = sqlx::query_as::<_, Encounter>(&sql)
        .bind(order_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_appointment_id(
    pool: &SqlitePool,
    appointment_id: i64,
) -> RepoResult<Option<Encounter>> {
    let sql = format!("{ENCOUNTER_SELECT} WHERE appointment_id = ? LIMIT 1");
    let row = sqlx::query_as::<_, Encounter>(&sql)
        .bind(appointment_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_by_patient(pool: &SqlitePool, patient_id: i64) -> RepoResult<Vec<Encounter>> {
    let sql = format!("{ENCOUNTER_SELECT} WHERE patient_id = ? ORDER BY date DESC");
    let rows = sqlx::query_as::<_, Encounter>(&sql)
        .bind(patient_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Partial field update (provider-driven edits)
pub async fn update_fields(
    pool: &SqlitePool,
    id: i64,
    patch: &EncounterUpdate,
    now: i64,
) -> RepoResult<Encounter> {
    let rows = sqlx::query(
        "UPDATE encounter SET title = COALESCE(?1, title), date = COALESCE(?2, date), status = COALESCE(?3, status), encounter_type = COALESCE(?4, encounter_type), provider_name = COALESCE(?5, provider_name), provider_notes = COALESCE(?6, provider_notes), updated_at = ?7 WHERE id = ?8",
    )
    .bind(&patch.title)
    .bind(&patch.date)
    .bind(patch.status)
    .bind(patch.encounter_type)
    .bind(&patch.provider_name)
    .bind(&patch.provider_notes)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Encounter {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Encounter {id} not found")))
}

/// Merge path: bind an order onto an existing appointment-based
/// encounter and promote its business type.
pub async fn attach_order(
    pool: &SqlitePool,
    id: i64,
    order_id: i64,
    business_type: BusinessType,
    now: i64,
) -> RepoResult<Encounter> {
    let rows = sqlx::query(
        "UPDATE encounter SET order_id = ?1, business_type = ?2, updated_at = ?3 WHERE id = ?4",
    )
    .bind(order_id)
    .bind(business_type)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Encounter {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Encounter {id} not found")))
}

/// Bind an appointment (and its provider) onto an existing encounter,
/// e.g. a sync-order placeholder awaiting its live session or an
/// ad-hoc coaching encounter scheduled after the fact.
pub async fn attach_appointment(
    pool: &SqlitePool,
    id: i64,
    appointment_id: i64,
    provider_id: i64,
    provider_name: &str,
    date: &str,
    now: i64,
) -> RepoResult<Encounter> {
    let rows = sqlx::query(
        "UPDATE encounter SET appointment_id = ?1, provider_id = ?2, provider_name = ?3, date = ?4, updated_at = ?5 WHERE id = ?6",
    )
    .bind(appointment_id)
    .bind(provider_id)
    .bind(provider_name)
    .bind(date)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Encounter {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Encounter {id} not found")))
}

/// Write-once note-signing marker. Returns `false` if the encounter is
/// already finalized.
pub async fn set_finalized(
    pool: &SqlitePool,
    id: i64,
    finalized_by: i64,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE encounter SET finalized_at = ?1, finalized_by = ?2, updated_at = ?1 WHERE id = ?3 AND finalized_at IS NULL",
    )
    .bind(now)
    .bind(finalized_by)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Hard delete. Only the ownership-checked manual-encounter path and
/// `unlink` use this.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM encounter WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{EncounterStatus, EncounterType};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::MIGRATOR.run(&pool).await.unwrap();

        sqlx::query("INSERT INTO user (id, display_name, role, is_active, created_at, updated_at) VALUES (1, 'Dr. Reyes', 'provider', 1, 0, 0)")
            .execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO patient (id, user_id, full_name, is_active, created_at, updated_at) VALUES (10, NULL, 'Pat Doe', 1, 0, 0)")
            .execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO clinical_order (id, patient_id, order_type, status, created_at, updated_at) VALUES (100, 10, 'weight_loss', 'pending', 0, 0)")
            .execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO appointment (id, patient_id, provider_id, datetime, reason, appointment_type, status, created_at, updated_at) VALUES (200, 10, 1, '2026-03-01T10:00:00Z', 'Follow-up', 'medical', 'scheduled', 0, 0)")
            .execute(&pool).await.unwrap();

        pool
    }

    fn make_encounter(id: i64, order_id: Option<i64>, appointment_id: Option<i64>) -> Encounter {
        Encounter {
            id,
            patient_id: 10,
            provider_id: None,
            title: "Consultation".into(),
            date: "2026-03-01T10:00:00Z".into(),
            status: EncounterStatus::Upcoming,
            encounter_type: EncounterType::Consultation,
            business_type: BusinessType::OrderBasedSync,
            appointment_id,
            order_id,
            provider_name: "TBD".into(),
            provider_notes: None,
            finalized_at: None,
            finalized_by: None,
            created_at: 1000,
            updated_at: 1000,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let pool = test_pool().await;
        let enc = make_encounter(1, Some(100), Some(200));
        assert!(insert(&pool, &enc).await.unwrap());

        let found = find_by_order_id(&pool, 100).await.unwrap().unwrap();
        assert_eq!(found.id, 1);
        assert_eq!(found.business_type, BusinessType::OrderBasedSync);
        assert_eq!(found.status, EncounterStatus::Upcoming);

        let by_appointment = find_by_appointment_id(&pool, 200).await.unwrap().unwrap();
        assert_eq!(by_appointment.id, 1);
    }

    #[tokio::test]
    async fn test_insert_duplicate_order_is_ignored() {
        let pool = test_pool().await;
        assert!(insert(&pool, &make_encounter(1, Some(100), None)).await.unwrap());
        // Second insert for the same order loses the race and is skipped
        assert!(!insert(&pool, &make_encounter(2, Some(100), None)).await.unwrap());

        let found = find_by_order_id(&pool, 100).await.unwrap().unwrap();
        assert_eq!(found.id, 1);
        assert!(find_by_id(&pool, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_appointment_context_is_ignored() {
        let pool = test_pool().await;
        assert!(insert(&pool, &make_encounter(1, None, Some(200))).await.unwrap());
        // Same (appointment, business_type) pair → skipped
        assert!(!insert(&pool, &make_encounter(2, None, Some(200))).await.unwrap());
    }

    #[tokio::test]
    async fn test_manual_encounters_have_no_uniqueness_constraint() {
        let pool = test_pool().await;
        let mut a = make_encounter(1, None, None);
        a.business_type = BusinessType::Manual;
        let mut b = make_encounter(2, None, None);
        b.business_type = BusinessType::Manual;
        // NULL keys are outside the partial indexes
        assert!(insert(&pool, &a).await.unwrap());
        assert!(insert(&pool, &b).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_fields_partial() {
        let pool = test_pool().await;
        insert(&pool, &make_encounter(1, Some(100), None)).await.unwrap();

        let patch = EncounterUpdate {
            status: Some(EncounterStatus::InProgress),
            provider_notes: Some("Vitals taken".into()),
            ..Default::default()
        };
        let updated = update_fields(&pool, 1, &patch, 2000).await.unwrap();
        assert_eq!(updated.status, EncounterStatus::InProgress);
        assert_eq!(updated.provider_notes.as_deref(), Some("Vitals taken"));
        // Untouched fields keep their values
        assert_eq!(updated.title, "Consultation");
        assert_eq!(updated.updated_at, 2000);
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let pool = test_pool().await;
        let err = update_fields(&pool, 999, &EncounterUpdate::default(), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_attach_order_promotes_business_type() {
        let pool = test_pool().await;
        let mut enc = make_encounter(1, None, Some(200));
        enc.business_type = BusinessType::AppointmentBased;
        insert(&pool, &enc).await.unwrap();

        let merged = attach_order(&pool, 1, 100, BusinessType::OrderBasedSync, 2000)
            .await
            .unwrap();
        assert_eq!(merged.order_id, Some(100));
        assert_eq!(merged.business_type, BusinessType::OrderBasedSync);
        assert_eq!(merged.appointment_id, Some(200));
    }

    #[tokio::test]
    async fn test_attach_order_already_linked_elsewhere_is_duplicate() {
        let pool = test_pool().await;
        insert(&pool, &make_encounter(1, Some(100), None)).await.unwrap();
        let mut other = make_encounter(2, None, Some(200));
        other.business_type = BusinessType::AppointmentBased;
        insert(&pool, &other).await.unwrap();

        let err = attach_order(&pool, 2, 100, BusinessType::OrderBasedSync, 2000)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_set_finalized_write_once() {
        let pool = test_pool().await;
        insert(&pool, &make_encounter(1, Some(100), None)).await.unwrap();

        assert!(set_finalized(&pool, 1, 1, 5000).await.unwrap());
        // Second finalization attempt is a no-op
        assert!(!set_finalized(&pool, 1, 1, 6000).await.unwrap());

        let enc = find_by_id(&pool, 1).await.unwrap().unwrap();
        assert_eq!(enc.finalized_at, Some(5000));
        assert_eq!(enc.finalized_by, Some(1));
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = test_pool().await;
        insert(&pool, &make_encounter(1, Some(100), None)).await.unwrap();
        assert!(delete(&pool, 1).await.unwrap());
        assert!(!delete(&pool, 1).await.unwrap());
        assert!(find_by_id(&pool, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_patient_orders_by_date_desc() {
        let pool = test_pool().await;
        let mut a = make_encounter(1, None, None);
        a.business_type = BusinessType::Manual;
        a.date = "2026-01-01T09:00:00Z".into();
        let mut b = make_encounter(2, None, None);
        b.business_type = BusinessType::Manual;
        b.date = "2026-02-01T09:00:00Z".into();
        insert(&pool, &a).await.unwrap();
        insert(&pool, &b).await.unwrap();

        let rows = list_by_patient(&pool, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 2);
        assert_eq!(rows[1].id, 1);
    }
}
