//! Coaching Flow Service
//!
//! The linking responsibility specialized for coaching sessions. No
//! order is ever involved: a coaching encounter is born either from a
//! coaching appointment or ad hoc by a provider, with an appointment
//! optionally attached later.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository::{appointment, encounter, user};
use crate::flow::classify;
use crate::flow::linking::{LinkDisposition, LinkOutcome};
use crate::utils::{AppError, AppResult, Clock};
use shared::models::{
    Appointment, AppointmentCreate, AppointmentType, BusinessType, CoachingCategory, Encounter,
    EncounterStatus, EncounterType, PROVIDER_PLACEHOLDER,
};

pub struct CoachingFlowService {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl CoachingFlowService {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Find-or-create the encounter for a coaching appointment. The
    /// session category is inferred from the booking reason; the
    /// provider comes from the appointment.
    pub async fn create_from_appointment(&self, appointment_id: i64) -> AppResult<LinkOutcome> {
        let app = appointment::find_by_id(&self.pool, appointment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Appointment {appointment_id} not found")))?;
        if app.appointment_type != AppointmentType::Coaching {
            return Err(AppError::Validation(format!(
                "Appointment {appointment_id} is not a coaching appointment"
            )));
        }

        if let Some(existing) = encounter::find_by_appointment_id(&self.pool, appointment_id).await? {
            return Ok(LinkOutcome {
                disposition: LinkDisposition::AlreadyExists,
                encounter: existing,
            });
        }

        let category = classify::session_category(app.reason.as_deref());
        let now = self.clock.now_millis();
        let enc = Encounter {
            id: shared::util::snowflake_id(),
            patient_id: app.patient_id,
            provider_id: Some(app.provider_id),
            title: category.session_title().to_string(),
            date: app.datetime.clone(),
            status: EncounterStatus::Upcoming,
            encounter_type: EncounterType::Consultation,
            business_type: BusinessType::Coaching,
            appointment_id: Some(appointment_id),
            order_id: None,
            provider_name: self.provider_display_name(app.provider_id).await,
            provider_notes: None,
            finalized_at: None,
            finalized_by: None,
            created_at: now,
            updated_at: now,
        };

        let (disposition, stored) = if encounter::insert(&self.pool, &enc).await? {
            (LinkDisposition::Created, enc)
        } else {
            // Concurrent creator won; reuse its row
            match encounter::find_by_appointment_id(&self.pool, appointment_id).await? {
                Some(winner) => (LinkDisposition::AlreadyExists, winner),
                None => {
                    return Err(AppError::Internal(format!(
                        "Encounter for appointment {appointment_id} vanished during creation"
                    )));
                }
            }
        };

        appointment::set_encounter_id(&self.pool, appointment_id, Some(stored.id), now).await?;
        info!(appointment_id, encounter_id = stored.id, "coaching flow created");
        Ok(LinkOutcome { disposition, encounter: stored })
    }

    /// Provider-initiated coaching encounter with no appointment.
    pub async fn create_adhoc(
        &self,
        provider_id: i64,
        patient_id: i64,
        category: Option<CoachingCategory>,
    ) -> AppResult<Encounter> {
        let category = category.unwrap_or(CoachingCategory::LifeCoaching);
        let now = self.clock.now_millis();
        let enc = Encounter {
            id: shared::util::snowflake_id(),
            patient_id,
            provider_id: Some(provider_id),
            title: category.session_title().to_string(),
            date: self.clock.now_rfc3339(),
            status: EncounterStatus::Upcoming,
            encounter_type: EncounterType::Consultation,
            business_type: BusinessType::Coaching,
            appointment_id: None,
            order_id: None,
            provider_name: self.provider_display_name(provider_id).await,
            provider_notes: None,
            finalized_at: None,
            finalized_by: None,
            created_at: now,
            updated_at: now,
        };
        if !encounter::insert(&self.pool, &enc).await? {
            return Err(AppError::Internal("Ad-hoc encounter insert was skipped".into()));
        }
        info!(encounter_id = enc.id, patient_id, "ad-hoc coaching encounter created");
        Ok(enc)
    }

    /// Attach a later-booked appointment to an ad-hoc coaching
    /// encounter, using the same back-reference mechanism as order
    /// linking.
    pub async fn attach_appointment(
        &self,
        encounter_id: i64,
        appointment_id: i64,
    ) -> AppResult<Encounter> {
        let enc = encounter::find_by_id(&self.pool, encounter_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Encounter {encounter_id} not found")))?;
        if enc.business_type != BusinessType::Coaching {
            return Err(AppError::BusinessRule(
                "Only coaching encounters can have a session attached here".into(),
            ));
        }
        if let Some(existing) = enc.appointment_id {
            if existing == appointment_id {
                return Ok(enc); // idempotent
            }
            return Err(AppError::Conflict(format!(
                "Encounter {encounter_id} is already bound to appointment {existing}"
            )));
        }

        let app = appointment::find_by_id(&self.pool, appointment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Appointment {appointment_id} not found")))?;
        if app.appointment_type != AppointmentType::Coaching {
            return Err(AppError::Validation(format!(
                "Appointment {appointment_id} is not a coaching appointment"
            )));
        }
        if let Some(other) = app.encounter_id
            && other != encounter_id
        {
            return Err(AppError::Conflict(format!(
                "Appointment {appointment_id} already belongs to encounter {other}"
            )));
        }

        let now = self.clock.now_millis();
        let provider_name = self.provider_display_name(app.provider_id).await;
        let updated = encounter::attach_appointment(
            &self.pool,
            encounter_id,
            appointment_id,
            app.provider_id,
            &provider_name,
            &app.datetime,
            now,
        )
        .await?;
        appointment::set_encounter_id(&self.pool, appointment_id, Some(encounter_id), now).await?;
        info!(encounter_id, appointment_id, "appointment attached to coaching encounter");
        Ok(updated)
    }

    /// Book the live session for an ad-hoc coaching encounter and bind
    /// it in one step.
    pub async fn schedule_session(
        &self,
        encounter_id: i64,
        data: AppointmentCreate,
    ) -> AppResult<Encounter> {
        if data.appointment_type != AppointmentType::Coaching {
            return Err(AppError::Validation(
                "Coaching sessions must use a coaching appointment".into(),
            ));
        }
        let app = appointment::create(&self.pool, data, self.clock.now_millis()).await?;
        self.attach_appointment(encounter_id, app.id).await
    }

    /// Scheduled coaching appointments still waiting on a flow. Read
    /// failures degrade to an empty result.
    pub async fn find_appointments_needing_flow(&self) -> Vec<Appointment> {
        match appointment::find_coaching_without_encounter(&self.pool).await {
            Ok(apps) => apps,
            Err(e) => {
                warn!(error = %e, "coaching appointment scan failed, returning empty");
                Vec::new()
            }
        }
    }

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
