//! Flow Factory
//!
//! Top-level orchestrator: classifies an order by type, routes it to
//! the async or sync creation path, derives flow status, and exposes
//! batch discovery of orders/appointments that still need a flow.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository::{encounter, order};
use crate::flow::coaching::CoachingFlowService;
use crate::flow::linking::AppointmentLinkingService;
use crate::flow::{classify, order_types};
use crate::utils::{AppError, AppResult, Clock};
use shared::models::{
    BusinessType, CoachingFlowStatus, Encounter, EncounterStatus, EncounterType, FlowResult,
    FlowStatus, OrderFlowCandidate, OrderFlowStatus, PROVIDER_PLACEHOLDER,
};

pub struct FlowFactory {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    linking: AppointmentLinkingService,
    coaching: CoachingFlowService,
}

impl FlowFactory {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self {
            linking: AppointmentLinkingService::new(pool.clone(), clock.clone()),
            coaching: CoachingFlowService::new(pool.clone(), clock.clone()),
            pool,
            clock,
        }
    }

    pub fn linking(&self) -> &AppointmentLinkingService {
        &self.linking
    }

    pub fn coaching(&self) -> &CoachingFlowService {
        &self.coaching
    }

    /// Create the flow for a new order.
    ///
    /// Async types get their encounter immediately (no appointment
    /// involved); sync types get a placeholder encounter that a later
    /// appointment is linked onto. Unknown order types are an error,
    /// never a silent default.
    pub async fn create_order_flow(&self, order_id: i64) -> FlowResult {
        match self.create_order_flow_inner(order_id).await {
            Ok((encounter_id, flow_type)) => FlowResult::ok(encounter_id, flow_type),
            Err(AppError::InvalidOrderType(order_type)) => {
                warn!(order_id, order_type = %order_type, "order flow rejected: unknown order type");
                FlowResult::error("Invalid order type")
            }
            Err(e) => {
                warn!(order_id, error = %e, "order flow creation failed");
                FlowResult::error(e.to_string())
            }
        }
    }

    async fn create_order_flow_inner(&self, order_id: i64) -> AppResult<(i64, BusinessType)> {
        let ord = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {order_id} not found")))?;
        let rule = order_types::lookup(&ord.order_type)
            .ok_or_else(|| AppError::InvalidOrderType(ord.order_type.clone()))?;

        // Idempotent: a repeated webhook delivery reuses the encounter
        if let Some(existing) = encounter::find_by_order_id(&self.pool, order_id).await? {
            return Ok((existing.id, existing.business_type));
        }

        let now = self.clock.now_millis();
        let title = if rule.requires_appointment {
            format!("{} consultation", ord.order_type)
        } else {
            format!("{} order review", ord.order_type)
        };
        let enc = Encounter {
            id: shared::util::snowflake_id(),
            patient_id: ord.patient_id,
            provider_id: None,
            title,
            date: self.clock.now_rfc3339(),
            status: EncounterStatus::Upcoming,
            encounter_type: if rule.requires_appointment {
                EncounterType::Consultation
            } else {
                EncounterType::Routine
            },
            business_type: rule.business_type,
            appointment_id: None,
            order_id: Some(order_id),
            provider_name: PROVIDER_PLACEHOLDER.to_string(),
            provider_notes: None,
            finalized_at: None,
            finalized_by: None,
            created_at: now,
            updated_at: now,
        };

        let stored_id = if encounter::insert(&self.pool, &enc).await? {
            enc.id
        } else {
            // Concurrent creator won the unique-index race
            encounter::find_by_order_id(&self.pool, order_id)
                .await?
                .map(|winner| winner.id)
                .ok_or_else(|| {
                    AppError::Internal(format!("Encounter for order {order_id} vanished during creation"))
                })?
        };
        info!(order_id, encounter_id = stored_id, flow_type = rule.business_type.as_str(), "order flow created");
        Ok((stored_id, rule.business_type))
    }

    /// Load both records and delegate to the linking service.
    pub async fn link_appointment_to_sync_order(
        &self,
        appointment_id: i64,
        order_id: i64,
        actor_id: i64,
    ) -> FlowResult {
        info!(appointment_id, order_id, actor_id, "linking appointment to sync order");
        match self.linking.link(appointment_id, order_id).await {
            Ok(outcome) => FlowResult::ok(outcome.encounter.id, outcome.encounter.business_type),
            Err(e) => {
                warn!(appointment_id, order_id, error = %e, "linking failed");
                FlowResult::error(e.to_string())
            }
        }
    }

    /// Derive order-flow progress by presence-checking. Read-only,
    /// never mutates. Read failures degrade to `pending` so a broken
    /// store cannot take a listing view down.
    pub async fn get_order_flow_status(&self, order_id: i64) -> OrderFlowStatus {
        let enc = match encounter::find_by_order_id(&self.pool, order_id).await {
            Ok(found) => found,
            Err(e) => {
                warn!(order_id, error = %e, "status lookup failed, reporting pending");
                None
            }
        };

        let flow_type = match &enc {
            Some(e) => Some(e.business_type),
            None => match order::find_by_id(&self.pool, order_id).await {
                Ok(Some(o)) => order_types::lookup(&o.order_type).map(|r| r.business_type),
                Ok(None) => None,
                Err(e) => {
                    warn!(order_id, error = %e, "order lookup failed during status derivation");
                    None
                }
            },
        };

        let (has_encounter, has_appointment, status) = match &enc {
            None => (false, false, FlowStatus::Pending),
            Some(e) if e.status == EncounterStatus::Completed => {
                (true, e.appointment_id.is_some(), FlowStatus::Completed)
            }
            Some(e) => (true, e.appointment_id.is_some(), FlowStatus::InProgress),
        };

        OrderFlowStatus { order_id, flow_type, has_encounter, has_appointment, status }
    }

    /// Coaching counterpart of [`Self::get_order_flow_status`].
    pub async fn get_coaching_flow_status(&self, appointment_id: i64) -> CoachingFlowStatus {
        let enc = match encounter::find_by_appointment_id(&self.pool, appointment_id).await {
            Ok(found) => found,
            Err(e) => {
                warn!(appointment_id, error = %e, "status lookup failed, reporting pending");
                None
            }
        };
        let (has_encounter, encounter_id, status) = match &enc {
            None => (false, None, FlowStatus::Pending),
            Some(e) if e.status == EncounterStatus::Completed => {
                (true, Some(e.id), FlowStatus::Completed)
            }
            Some(e) => (true, Some(e.id), FlowStatus::InProgress),
        };
        CoachingFlowStatus { appointment_id, has_encounter, encounter_id, status }
    }

    /// All pending orders with no flow yet, classified best-effort:
    /// registry when the type code is known, keyword heuristic over
    /// line items otherwise. Read failures degrade to an empty list.
    pub async fn get_orders_needing_flow_creation(&self) -> Vec<OrderFlowCandidate> {
        let orders = match order::list_pending_without_encounter(&self.pool).await {
            Ok(orders) => orders,
            Err(e) => {
                warn!(error = %e, "order discovery scan failed, returning empty");
                return Vec::new();
            }
        };

        let mut candidates = Vec::new();
        for ord in orders {
            let (requires_appointment, business_type) = match order_types::lookup(&ord.order_type) {
                Some(rule) => (rule.requires_appointment, rule.business_type),
                None => {
                    let names = order::item_names(&self.pool, ord.id).await.unwrap_or_default();
                    if classify::order_requires_sync(&names) {
                        (true, BusinessType::OrderBasedSync)
                    } else {
                        (false, BusinessType::OrderBasedAsync)
                    }
                }
            };
            candidates.push(OrderFlowCandidate { order: ord, requires_appointment, business_type });
        }
        candidates
    }

    /// Scheduled coaching appointments with no flow yet.
    pub async fn get_coaching_appointments_needing_flow_creation(
        &self,
    ) -> Vec<shared::models::Appointment> {
        self.coaching.find_appointments_needing_flow().await
    }
}
