//! Multi-step document-intake wizard.
//!
//! Steps run in a fixed order (responsibility centre, date, type/subtype,
//! customer/vendor, content, circuit, review). Option sets that depend on
//! earlier answers are resolved asynchronously through a
//! [`ConstraintResolver`]; see [`WizardController`] for the protocol.

mod assembler;
mod cascade;
mod controller;
mod error;
mod fallback;
mod form;
mod notice;
mod options;
mod resolver;
mod steps;
mod tracking;
mod validation;

pub use assembler::{AssemblyError, RequestAssembler};
pub use cascade::{DEPENDENTS, dependents_of, invalidation_closure};
pub use controller::{ApplyOutcome, SessionState, UpdateOutcome, WizardController};
pub use error::WizardError;
pub use fallback::{FallbackDataProvider, FallbackEntry};
pub use form::{Field, FieldUpdate, FormState};
pub use notice::{Notice, NoticeLevel};
pub use options::OptionSet;
pub use resolver::{
    ConstraintResolver, ResolutionError, ResolutionSource, ServiceResolver, SubtypeResolution,
};
pub use steps::{STEPS, StepContext, StepDefinition, StepId, TOTAL_STEPS, definition};
pub use tracking::{
    ResolutionKey, ResolutionKind, ResolutionPayload, ResolutionRequest, ResolutionResponse,
    ResolutionTicket, ResolutionTracker,
};
pub use validation::{FieldErrors, StepReport, TITLE_MAX_CHARS, ValidationEngine, derive_title};
