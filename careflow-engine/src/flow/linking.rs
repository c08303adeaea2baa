//! Appointment Linking Service
//!
//! Reconciles one order with one appointment into a single encounter.
//! An appointment is frequently booked before the associated order is
//! finalized, so the service must merge onto an existing
//! appointment-based encounter instead of creating a second row.

use std::sync::Arc;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository::{appointment, encounter, order};
use crate::flow::{classify, order_types};
use crate::utils::{AppError, AppResult, Clock};
use shared::models::{
    BusinessType, Encounter, EncounterStatus, EncounterType, OrderFlowCandidate,
    PROVIDER_PLACEHOLDER,
};

/// How the encounter came to be bound to the (order, appointment) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDisposition {
    /// An encounter already existed for this order; idempotent no-op
    AlreadyExists,
    /// An appointment-based encounter was promoted in place
    Merged,
    /// A fresh encounter was created with both keys set
    Created,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkOutcome {
    pub disposition: LinkDisposition,
    pub encounter: Encounter,
}

pub struct AppointmentLinkingService {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl AppointmentLinkingService {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Bind an order and an appointment to a single encounter.
    ///
    /// Four mutually exclusive cases, checked in priority order:
    /// 1. encounter exists for the order → returned unchanged
    /// 2. encounter exists for the appointment only → order merged on
    /// 3. neither exists → created with both keys
    /// 4. store failure → error; the appointment back-reference is only
    ///    written after the encounter write succeeded, so the
    ///    appointment can never point at a row that was not created
    pub async fn link(&self, appointment_id: i64, order_id: i64) -> AppResult<LinkOutcome> {
        let ord = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {order_id} not found")))?;
        let app = appointment::find_by_id(&self.pool, appointment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Appointment {appointment_id} not found")))?;
        let now = self.clock.now_millis();

        // Case 1: already linked
        if let Some(existing) = encounter::find_by_order_id(&self.pool, order_id).await? {
            info!(order_id, encounter_id = existing.id, "order already has an encounter");
            return Ok(LinkOutcome { disposition: LinkDisposition::AlreadyExists, encounter: existing });
        }

        // Case 2: appointment booked first, promote its encounter
        if let Some(existing) = encounter::find_by_appointment_id(&self.pool, appointment_id).await? {
            let merged =
                encounter::attach_order(&self.pool, existing.id, order_id, BusinessType::OrderBasedSync, now)
                    .await?;
            appointment::set_encounter_id(&self.pool, appointment_id, Some(merged.id), now).await?;
            info!(order_id, appointment_id, encounter_id = merged.id, "merged order onto appointment encounter");
            return Ok(LinkOutcome { disposition: LinkDisposition::Merged, encounter: merged });
        }

        // Case 3: neither exists, create with both foreign keys
        let enc = Encounter {
            id: shared::util::snowflake_id(),
            patient_id: ord.patient_id,
            provider_id: Some(app.provider_id),
            title: app
                .reason
                .clone()
                .unwrap_or_else(|| format!("{} consultation", ord.order_type)),
            date: app.datetime.clone(),
            status: EncounterStatus::Upcoming,
            encounter_type: EncounterType::Consultation,
            business_type: BusinessType::OrderBasedSync,
            appointment_id: Some(appointment_id),
            order_id: Some(order_id),
            // Placeholder pending enrichment; the appointment's provider
            // id is kept so enrichment can fill the name later.
            provider_name: PROVIDER_PLACEHOLDER.to_string(),
            provider_notes: None,
            finalized_at: None,
            finalized_by: None,
            created_at: now,
            updated_at: now,
        };

        let (disposition, stored) = if encounter::insert(&self.pool, &enc).await? {
            (LinkDisposition::Created, enc)
        } else {
            // Lost a concurrent race on one of the unique indexes; the
            // winner row for this order is the idempotent result.
            match encounter::find_by_order_id(&self.pool, order_id).await? {
                Some(winner) => (LinkDisposition::AlreadyExists, winner),
                None => {
                    return Err(AppError::Conflict(format!(
                        "Appointment {appointment_id} is already bound to another encounter"
                    )));
                }
            }
        };

        appointment::set_encounter_id(&self.pool, appointment_id, Some(stored.id), now).await?;
        info!(order_id, appointment_id, encounter_id = stored.id, "linked order to appointment");
        Ok(LinkOutcome { disposition, encounter: stored })
    }

    /// Reverse an erroneous link: delete the order's encounter and
    /// clear the appointment back-reference.
    pub async fn unlink(&self, appointment_id: i64, order_id: i64) -> AppResult<()> {
        let enc = encounter::find_by_order_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No encounter linked to order {order_id}")))?;
        encounter::delete(&self.pool, enc.id).await?;
        appointment::set_encounter_id(&self.pool, appointment_id, None, self.clock.now_millis())
            .await?;
        info!(order_id, appointment_id, encounter_id = enc.id, "unlinked order from appointment");
        Ok(())
    }

    /// Pending, unlinked orders that look appointment-gated.
    ///
    /// The registry is authoritative when the order-type code is known;
    /// otherwise line-item names go through the keyword heuristic.
    /// Read failures degrade to an empty result; a broken listing scan
    /// must not take the caller down.
    pub async fn find_unlinked_sync_orders(&self) -> Vec<OrderFlowCandidate> {
        let orders = match order::list_pending_without_encounter(&self.pool).await {
            Ok(orders) => orders,
            Err(e) => {
                warn!(error = %e, "pending-order scan failed, returning empty");
                return Vec::new();
            }
        };

        let mut candidates = Vec::new();
        for ord in orders {
            let requires_appointment = match order_types::lookup(&ord.order_type) {
                Some(rule) => rule.requires_appointment,
                None => {
                    let names = match order::item_names(&self.pool, ord.id).await {
                        Ok(names) => names,
                        Err(e) => {
                            warn!(order_id = ord.id, error = %e, "line-item scan failed, skipping order");
                            continue;
                        }
                    };
                    classify::order_requires_sync(&names)
                }
            };
            if requires_appointment {
                candidates.push(OrderFlowCandidate {
                    order: ord,
                    requires_appointment: true,
                    business_type: BusinessType::OrderBasedSync,
                });
            }
        }
        candidates
    }
}
