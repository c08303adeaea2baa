//! Encounter Service
//!
//! Ownership-checked CRUD over the encounter table. Every read and
//! write from UI-facing callers goes through here; the flow services
//! (system-driven paths) use the repository directly.
//!
//! Error contract: patient-level operations (`create`,
//! `list_by_patient`) fail with `Forbidden`; row-level operations
//! (`get_by_id`, `update`, `delete`, `finalize`) fail with `NotFound`
//! whether the row is missing or merely not visible to the actor, so
//! callers cannot probe for the existence of other patients' records.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::auth::AccessPolicy;
use crate::db::repository::{appointment, encounter, user};
use crate::utils::{AppError, AppResult, Clock};
use shared::models::{
    AppointmentStatus, BusinessType, Encounter, EncounterCreate, EncounterStatus, EncounterType,
    EncounterUpdate, PROVIDER_PLACEHOLDER,
};

pub struct EncounterService {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    access: Arc<dyn AccessPolicy>,
}

impl EncounterService {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>, access: Arc<dyn AccessPolicy>) -> Self {
        Self { pool, clock, access }
    }

    /// True if the actor may read/write this patient's chart:
    /// provider/admin roles for any active patient, a patient account
    /// for its own active record only. Store failures deny (fail
    /// closed), matching the access-policy contract.
    pub async fn verify_patient_access(&self, actor_id: i64, patient_id: i64) -> bool {
        let active = match user::find_patient_by_id(&self.pool, patient_id).await {
            Ok(Some(p)) => p.is_active,
            Ok(None) => false,
            Err(e) => {
                warn!(patient_id, error = %e, "patient lookup failed, denying access");
                false
            }
        };
        if !active {
            return false;
        }
        if self.access.is_provider(actor_id).await {
            return true;
        }
        self.access.owns_patient(actor_id, patient_id).await
    }

    pub async fn create(&self, actor_id: i64, data: EncounterCreate) -> AppResult<Encounter> {
        if !self.verify_patient_access(actor_id, data.patient_id).await {
            return Err(AppError::Forbidden(format!(
                "No access to patient {}",
                data.patient_id
            )));
        }
        if data.title.trim().is_empty() {
            return Err(AppError::Validation("Encounter title is required".into()));
        }

        // Provider resolution: the appointment's provider wins; failing
        // that, a provider/admin actor becomes the provider.
        let (provider_id, provider_name, appointment_date) =
            if let Some(appointment_id) = data.appointment_id {
                let app = appointment::find_by_id(&self.pool, appointment_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Appointment {appointment_id} not found"))
                    })?;
                let name = self.provider_display_name(app.provider_id).await;
                (Some(app.provider_id), name, Some(app.datetime))
            } else if self.access.is_provider(actor_id).await {
                let name = self.provider_display_name(actor_id).await;
                (Some(actor_id), name, None)
            } else {
                (None, PROVIDER_PLACEHOLDER.to_string(), None)
            };

        let now = self.clock.now_millis();
        let date = data
            .date
            .or(appointment_date)
            .unwrap_or_else(|| self.clock.now_rfc3339());

        let enc = Encounter {
            id: shared::util::snowflake_id(),
            patient_id: data.patient_id,
            provider_id,
            title: data.title,
            date,
            status: EncounterStatus::Upcoming,
            encounter_type: data.encounter_type.unwrap_or(EncounterType::Routine),
            business_type: data.business_type.unwrap_or(BusinessType::Manual),
            appointment_id: data.appointment_id,
            order_id: data.order_id,
            provider_name,
            provider_notes: data.provider_notes,
            finalized_at: None,
            finalized_by: None,
            created_at: now,
            updated_at: now,
        };

        if !encounter::insert(&self.pool, &enc).await? {
            return Err(AppError::Conflict(
                "An encounter already exists for this order or appointment".into(),
            ));
        }
        info!(encounter_id = enc.id, patient_id = enc.patient_id, "encounter created");
        Ok(enc)
    }

    pub async fn get_by_id(&self, actor_id: i64, id: i64) -> AppResult<Encounter> {
        let enc = self.load_visible(actor_id, id).await?;
        Ok(enc)
    }

    pub async fn list_by_patient(&self, actor_id: i64, patient_id: i64) -> AppResult<Vec<Encounter>> {
        if !self.verify_patient_access(actor_id, patient_id).await {
            return Err(AppError::Forbidden(format!("No access to patient {patient_id}")));
        }
        Ok(encounter::list_by_patient(&self.pool, patient_id).await?)
    }

    pub async fn update(
        &self,
        actor_id: i64,
        id: i64,
        patch: EncounterUpdate,
    ) -> AppResult<Encounter> {
        let existing = self.load_visible(actor_id, id).await?;

        if let Some(new_status) = patch.status {
            self.check_status_transition(&existing, new_status).await?;
        }
        if let Some(title) = &patch.title
            && title.trim().is_empty()
        {
            return Err(AppError::Validation("Encounter title is required".into()));
        }

        let updated =
            encounter::update_fields(&self.pool, id, &patch, self.clock.now_millis()).await?;
        Ok(updated)
    }

    /// Sign the clinical note. Write-once: a second call is a conflict.
    pub async fn finalize(&self, actor_id: i64, id: i64) -> AppResult<Encounter> {
        let existing = self.load_visible(actor_id, id).await?;
        if !encounter::set_finalized(&self.pool, id, actor_id, self.clock.now_millis()).await? {
            return Err(AppError::Conflict(format!(
                "Encounter {} is already finalized",
                existing.id
            )));
        }
        self.load_visible(actor_id, id).await
    }

    /// Hard delete, manual encounters only; flow-created encounters
    /// are removed through `unlink`.
    pub async fn delete(&self, actor_id: i64, id: i64) -> AppResult<()> {
        let existing = self.load_visible(actor_id, id).await?;
        if existing.business_type != BusinessType::Manual {
            return Err(AppError::BusinessRule(
                "Only manual encounters can be deleted".into(),
            ));
        }
        encounter::delete(&self.pool, id).await?;
        info!(encounter_id = id, "encounter deleted");
        Ok(())
    }

    /// Idempotency read helper. Swallows store errors to `None` by
    /// documented contract: a transient read failure degrades to
    /// "nothing found" instead of failing a listing view.
    pub async fn find_by_order_id(&self, order_id: i64) -> Option<Encounter> {
        match encounter::find_by_order_id(&self.pool, order_id).await {
            Ok(found) => found,
            Err(e) => {
                warn!(order_id, error = %e, "encounter lookup failed, treating as absent");
                None
            }
        }
    }

    /// See [`Self::find_by_order_id`] for the error contract.
    pub async fn find_by_appointment_id(&self, appointment_id: i64) -> Option<Encounter> {
        match encounter::find_by_appointment_id(&self.pool, appointment_id).await {
            Ok(found) => found,
            Err(e) => {
                warn!(appointment_id, error = %e, "encounter lookup failed, treating as absent");
                None
            }
        }
    }

    /// Load a row the actor may see; missing and denied are the same
    /// `NotFound` from the caller's point of view.
    async fn load_visible(&self, actor_id: i64, id: i64) -> AppResult<Encounter> {
        let enc = encounter::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Encounter {id} not found")))?;
        if !self.verify_patient_access(actor_id, enc.patient_id).await {
            return Err(AppError::NotFound(format!("Encounter {id} not found")));
        }
        Ok(enc)
    }

    /// Monotonic lifecycle, and completion is gated on any linked
    /// appointment no longer being scheduled.
    async fn check_status_transition(
        &self,
        existing: &Encounter,
        new_status: EncounterStatus,
    ) -> AppResult<()> {
        if new_status.rank() < existing.status.rank() {
            return Err(AppError::BusinessRule(format!(
                "Encounter status cannot move backwards ({:?} → {:?})",
                existing.status, new_status
            )));
        }
        if new_status == EncounterStatus::Completed
            && let Some(appointment_id) = existing.appointment_id
            && let Some(app) = appointment::find_by_id(&self.pool, appointment_id).await?
            && app.status == AppointmentStatus::Scheduled
        {
            return Err(AppError::BusinessRule(
                "Cannot complete an encounter while its appointment is still scheduled".into(),
            ));
        }
        Ok(())
    }

    /// Display-name enrichment; lookup failure falls back to the
    /// placeholder rather than failing the mutation.
    async fn provider_display_name(&self, user_id: i64) -> String {
        match user::find_by_id(&self.pool, user_id).await {
            Ok(Some(u)) => u.display_name,
            Ok(None) => PROVIDER_PLACEHOLDER.to_string(),
            Err(e) => {
                warn!(user_id, error = %e, "provider name lookup failed");
                PROVIDER_PLACEHOLDER.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DbAccessPolicy;
    use crate::utils::FixedClock;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::MIGRATOR.run(&pool).await.unwrap();

        sqlx::query("INSERT INTO user (id, display_name, role, is_active, created_at, updated_at) VALUES (1, 'Dr. Reyes', 'provider', 1, 0, 0), (3, 'Pat Doe', 'patient', 1, 0, 0), (5, 'Stranger', 'patient', 1, 0, 0)")
            .execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO patient (id, user_id, full_name, is_active, created_at, updated_at) VALUES (10, 3, 'Pat Doe', 1, 0, 0), (12, NULL, 'Archived', 0, 0, 0)")
            .execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO appointment (id, patient_id, provider_id, datetime, reason, appointment_type, status, created_at, updated_at) VALUES (200, 10, 1, '2026-03-01T10:00:00Z', 'Follow-up', 'medical', 'scheduled', 0, 0)")
            .execute(&pool).await.unwrap();

        pool
    }

    fn service(pool: &SqlitePool) -> EncounterService {
        EncounterService::new(
            pool.clone(),
            Arc::new(FixedClock(1_704_067_200_000)),
            Arc::new(DbAccessPolicy::new(pool.clone())),
        )
    }

    fn manual_create(patient_id: i64) -> EncounterCreate {
        EncounterCreate {
            patient_id,
            title: "Intake visit".into(),
            date: None,
            encounter_type: None,
            business_type: None,
            appointment_id: None,
            order_id: None,
            provider_notes: None,
        }
    }

    async fn encounter_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM encounter")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_denied_writes_nothing() {
        let pool = test_pool().await;
        let svc = service(&pool);
        // User 5 is neither provider nor this patient's account
        let err = svc.create(5, manual_create(10)).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(encounter_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_create_inactive_patient_denied_even_for_provider() {
        let pool = test_pool().await;
        let svc = service(&pool);
        let err = svc.create(1, manual_create(12)).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_create_by_provider_resolves_provider_from_actor() {
        let pool = test_pool().await;
        let svc = service(&pool);
        let enc = svc.create(1, manual_create(10)).await.unwrap();
        assert_eq!(enc.provider_id, Some(1));
        assert_eq!(enc.provider_name, "Dr. Reyes");
        assert_eq!(enc.business_type, BusinessType::Manual);
        assert_eq!(enc.status, EncounterStatus::Upcoming);
        assert_eq!(enc.date, "2024-01-01T00:00:00Z"); // from the fixed clock
    }

    #[tokio::test]
    async fn test_create_by_patient_leaves_provider_placeholder() {
        let pool = test_pool().await;
        let svc = service(&pool);
        let enc = svc.create(3, manual_create(10)).await.unwrap();
        assert_eq!(enc.provider_id, None);
        assert_eq!(enc.provider_name, PROVIDER_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_create_appointment_provider_wins_over_actor() {
        let pool = test_pool().await;
        let svc = service(&pool);
        let mut data = manual_create(10);
        data.appointment_id = Some(200);
        data.business_type = Some(BusinessType::AppointmentBased);
        // Actor 3 is the patient; provider comes from the appointment
        let enc = svc.create(3, data).await.unwrap();
        assert_eq!(enc.provider_id, Some(1));
        assert_eq!(enc.provider_name, "Dr. Reyes");
        assert_eq!(enc.date, "2026-03-01T10:00:00Z"); // appointment datetime
    }

    #[tokio::test]
    async fn test_create_blank_title_rejected() {
        let pool = test_pool().await;
        let svc = service(&pool);
        let mut data = manual_create(10);
        data.title = "   ".into();
        let err = svc.create(1, data).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_status_regression_rejected() {
        let pool = test_pool().await;
        let svc = service(&pool);
        let enc = svc.create(1, manual_create(10)).await.unwrap();
        svc.update(
            1,
            enc.id,
            EncounterUpdate { status: Some(EncounterStatus::InProgress), ..Default::default() },
        )
        .await
        .unwrap();

        let err = svc
            .update(
                1,
                enc.id,
                EncounterUpdate { status: Some(EncounterStatus::Upcoming), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn test_complete_blocked_while_appointment_scheduled() {
        let pool = test_pool().await;
        let svc = service(&pool);
        let mut data = manual_create(10);
        data.appointment_id = Some(200);
        data.business_type = Some(BusinessType::AppointmentBased);
        let enc = svc.create(1, data).await.unwrap();

        let err = svc
            .update(
                1,
                enc.id,
                EncounterUpdate { status: Some(EncounterStatus::Completed), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));

        // Once the appointment is no longer scheduled, completion goes through
        sqlx::query("UPDATE appointment SET status = 'completed' WHERE id = 200")
            .execute(&pool)
            .await
            .unwrap();
        let done = svc
            .update(
                1,
                enc.id,
                EncounterUpdate { status: Some(EncounterStatus::Completed), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(done.status, EncounterStatus::Completed);
    }

    #[tokio::test]
    async fn test_row_level_denied_reads_as_not_found() {
        let pool = test_pool().await;
        let svc = service(&pool);
        let enc = svc.create(1, manual_create(10)).await.unwrap();

        // Stranger can't tell the row exists
        let err = svc.get_by_id(5, enc.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = svc.update(5, enc.id, EncounterUpdate::default()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_only_manual() {
        let pool = test_pool().await;
        let svc = service(&pool);
        let mut data = manual_create(10);
        data.business_type = Some(BusinessType::OrderBasedAsync);
        data.order_id = Some(100);
        let flow_enc = svc.create(1, data).await.unwrap();

        let err = svc.delete(1, flow_enc.id).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));

        let manual = svc.create(1, manual_create(10)).await.unwrap();
        svc.delete(1, manual.id).await.unwrap();
        assert!(matches!(
            svc.get_by_id(1, manual.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_finalize_write_once() {
        let pool = test_pool().await;
        let svc = service(&pool);
        let enc = svc.create(1, manual_create(10)).await.unwrap();

        let signed = svc.finalize(1, enc.id).await.unwrap();
        assert_eq!(signed.finalized_by, Some(1));
        assert!(signed.finalized_at.is_some());

        let err = svc.finalize(1, enc.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_patient_lists_own_chart_only() {
        let pool = test_pool().await;
        let svc = service(&pool);
        svc.create(1, manual_create(10)).await.unwrap();

        let rows = svc.list_by_patient(3, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        let err = svc.list_by_patient(5, 10).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_read_helpers_swallow_store_failure() {
        let pool = test_pool().await;
        let svc = service(&pool);
        pool.close().await;
        assert!(svc.find_by_order_id(100).await.is_none());
        assert!(svc.find_by_appointment_id(200).await.is_none());
    }
}
