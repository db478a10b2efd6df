//! Plan-alignment engine.
//!
//! Extracts the clinical elements of a protocol document, checks that an
//! engagement plan draft mentions every one of them, and repairs drafts that
//! fall short. Every operation here is pure and synchronous; callers own I/O.

pub mod category;
pub mod extract;
pub mod gate;
pub mod matcher;
pub mod phase;
pub mod plan;
pub mod policy;
pub mod protocol;
pub mod repair;
pub mod validate;

pub use category::{Classification, ElementCategory, PerCategory};
pub use extract::{ExtractedElement, ExtractedElementSet, SafetyConstraint, extract};
pub use gate::{AlignmentGate, AlignmentOutcome, GateVerdict};
pub use plan::EngagementPlanDraft;
pub use policy::AlignmentPolicy;
pub use protocol::ProtocolDocument;
pub use repair::{AlignmentNote, RepairOutcome, repair, repair_with};
pub use validate::{ValidationReport, validate, validate_with};
