//! Appointment Model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum AppointmentType {
    Medical,
    Coaching,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

/// Appointment entity: a scheduled live session between patient and
/// provider. `encounter_id` is the back-reference written once the
/// appointment is bound to an encounter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub provider_id: i64,
    /// Session start (RFC 3339)
    pub datetime: String,
    pub reason: Option<String>,
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub encounter_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create appointment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentCreate {
    pub patient_id: i64,
    pub provider_id: i64,
    pub datetime: String,
    pub reason: Option<String>,
    pub appointment_type: AppointmentType,
}

/// Reschedule payload, limited to the fields orchestration may touch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentReschedule {
    pub datetime: Option<String>,
    pub reason: Option<String>,
}
