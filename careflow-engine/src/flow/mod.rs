//! Care-Flow Orchestration
//!
//! Decides, for a clinical order or a coaching booking, whether a live
//! appointment is required, and creates/links/keeps synchronized the
//! Order ↔ Appointment ↔ Encounter triad.
//!
//! ```text
//! order / appointment event
//!         │
//!         ▼
//!   FlowFactory ──▶ OrderTypeRegistry (rule table)
//!         │
//!         ├──▶ AppointmentLinkingService (order + appointment → encounter)
//!         └──▶ CoachingFlowService (coaching booking → encounter)
//! ```

pub mod classify;
pub mod coaching;
pub mod factory;
pub mod linking;
pub mod order_types;

pub use coaching::CoachingFlowService;
pub use factory::FlowFactory;
pub use linking::{AppointmentLinkingService, LinkDisposition, LinkOutcome};
pub use order_types::{OrderCategory, OrderTypeRule};
