//! Care-Flow DTOs
//!
//! Result and status shapes returned across the engine's service
//! boundary. Serialized camelCase for the UI / webhook callers.

use serde::{Deserialize, Serialize};

use super::encounter::BusinessType;
use super::order::ClinicalOrder;

/// Derived flow progress. Presence-checked, never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    Pending,
    InProgress,
    Completed,
}

/// Outcome of a flow-creation or linking call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_type: Option<BusinessType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FlowResult {
    pub fn ok(encounter_id: i64, flow_type: BusinessType) -> Self {
        Self {
            success: true,
            encounter_id: Some(encounter_id),
            flow_type: Some(flow_type),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            encounter_id: None,
            flow_type: None,
            error: Some(message.into()),
        }
    }
}

/// Derived order-flow status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFlowStatus {
    pub order_id: i64,
    pub flow_type: Option<BusinessType>,
    pub has_encounter: bool,
    pub has_appointment: bool,
    pub status: FlowStatus,
}

/// Derived coaching-flow status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachingFlowStatus {
    pub appointment_id: i64,
    pub has_encounter: bool,
    pub encounter_id: Option<i64>,
    pub status: FlowStatus,
}

/// A pending order that still needs a flow, as surfaced by discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFlowCandidate {
    pub order: ClinicalOrder,
    pub requires_appointment: bool,
    pub business_type: BusinessType,
}

/// Coaching session category, inferred from the appointment reason
/// when not supplied explicitly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CoachingCategory {
    LifeCoaching,
    WellnessCoaching,
    CareerCoaching,
}

impl CoachingCategory {
    /// Human-readable session title used when creating coaching encounters
    pub fn session_title(self) -> &'static str {
        match self {
            CoachingCategory::LifeCoaching => "Life Coaching Session",
            CoachingCategory::WellnessCoaching => "Wellness Coaching Session",
            CoachingCategory::CareerCoaching => "Career Coaching Session",
        }
    }
}
