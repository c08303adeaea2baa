//! Encounter Model
//!
//! The clinical record row representing a single patient-provider
//! interaction, optionally linked to an Order and/or Appointment.

use serde::{Deserialize, Serialize};

/// Provider name written onto placeholder encounters until a real
/// provider is resolved (linking, enrichment).
pub const PROVIDER_PLACEHOLDER: &str = "TBD";

/// Lifecycle state, provider-driven. Monotonic: upcoming → in_progress
/// → completed, no regression.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum EncounterStatus {
    Upcoming,
    InProgress,
    Completed,
}

impl EncounterStatus {
    /// Position in the lifecycle, used to reject status regression.
    pub fn rank(self) -> u8 {
        match self {
            EncounterStatus::Upcoming => 0,
            EncounterStatus::InProgress => 1,
            EncounterStatus::Completed => 2,
        }
    }
}

/// Clinical classification of the visit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum EncounterType {
    Routine,
    FollowUp,
    Urgent,
    Consultation,
}

/// Why the encounter exists. Immutable after creation, with one
/// exception: an `AppointmentBased` encounter is promoted to
/// `OrderBasedSync` when a later order is merged onto it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum BusinessType {
    Manual,
    AppointmentBased,
    OrderBasedAsync,
    OrderBasedSync,
    Coaching,
}

impl BusinessType {
    pub fn as_str(self) -> &'static str {
        match self {
            BusinessType::Manual => "manual",
            BusinessType::AppointmentBased => "appointment_based",
            BusinessType::OrderBasedAsync => "order_based_async",
            BusinessType::OrderBasedSync => "order_based_sync",
            BusinessType::Coaching => "coaching",
        }
    }
}

/// Encounter entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Encounter {
    pub id: i64,
    pub patient_id: i64,
    pub provider_id: Option<i64>,
    pub title: String,
    /// Scheduled date of the interaction (RFC 3339)
    pub date: String,
    pub status: EncounterStatus,
    pub encounter_type: EncounterType,
    pub business_type: BusinessType,
    pub appointment_id: Option<i64>,
    pub order_id: Option<i64>,
    pub provider_name: String,
    pub provider_notes: Option<String>,
    /// Set once when the clinical note is signed; terminal marker.
    pub finalized_at: Option<i64>,
    pub finalized_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create encounter payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterCreate {
    pub patient_id: i64,
    pub title: String,
    /// Defaults to the creation instant when omitted
    pub date: Option<String>,
    pub encounter_type: Option<EncounterType>,
    /// Defaults to `Manual` when unset
    pub business_type: Option<BusinessType>,
    pub appointment_id: Option<i64>,
    pub order_id: Option<i64>,
    pub provider_notes: Option<String>,
}

/// Update encounter payload (partial)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncounterUpdate {
    pub title: Option<String>,
    pub date: Option<String>,
    pub status: Option<EncounterStatus>,
    pub encounter_type: Option<EncounterType>,
    pub provider_name: Option<String>,
    pub provider_notes: Option<String>,
}
