//! Clinical Order Model
//!
//! Orders originate outside the engine (prescriptions, lab requests,
//! coaching packages). Orchestration reads them and links encounters;
//! it never mutates order fields.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

/// Clinical order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ClinicalOrder {
    pub id: i64,
    pub patient_id: i64,
    /// Order-type code, e.g. "trt", "medication", "lab_test"
    pub order_type: String,
    pub status: OrderStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Line item on an order. Item names feed the best-effort keyword
/// classifier used by flow discovery when the order-type code alone is
/// not decisive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub name: String,
}
