//! Order-Type Rule Table
//!
//! Static mapping from an order-type code to its flow rules. Pure
//! lookup, no store access. Unknown codes resolve to `None` and the
//! factory surfaces that as `InvalidOrderType`. The engine never
//! silently defaults an unknown type to the async path; that could
//! route a controlled substance around its required live appointment.

use shared::models::BusinessType;

/// Broad clinical category of an order type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderCategory {
    HormoneTherapy,
    ControlledMedication,
    WeightLoss,
    MentalHealth,
    Medication,
    Supplement,
    LabTest,
}

/// Flow rules for one order-type code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTypeRule {
    /// A live appointment must exist before fulfillment
    pub requires_appointment: bool,
    pub business_type: BusinessType,
    pub category: OrderCategory,
}

const fn sync(category: OrderCategory) -> OrderTypeRule {
    OrderTypeRule {
        requires_appointment: true,
        business_type: BusinessType::OrderBasedSync,
        category,
    }
}

const fn without_appointment(category: OrderCategory) -> OrderTypeRule {
    OrderTypeRule {
        requires_appointment: false,
        business_type: BusinessType::OrderBasedAsync,
        category,
    }
}

/// Look up the flow rules for an order-type code. Codes are matched
/// case-insensitively; surrounding whitespace is ignored.
pub fn lookup(order_type: &str) -> Option<OrderTypeRule> {
    let code = order_type.trim().to_ascii_lowercase();
    let rule = match code.as_str() {
        // Appointment-gated categories
        "trt" | "testosterone_replacement" => sync(OrderCategory::HormoneTherapy),
        "controlled_medication" => sync(OrderCategory::ControlledMedication),
        "weight_loss" => sync(OrderCategory::WeightLoss),
        "mental_health" => sync(OrderCategory::MentalHealth),

        // Fulfillable without a live session
        "medication" => without_appointment(OrderCategory::Medication),
        "supplement" => without_appointment(OrderCategory::Supplement),
        "lab_test" | "lab_panel" => without_appointment(OrderCategory::LabTest),

        _ => return None,
    };
    Some(rule)
}
