use thiserror::Error;

use super::assembler::AssemblyError;
use super::form::Field;
use super::steps::StepId;
use super::validation::FieldErrors;

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Step {step} is not complete: {errors}")]
    Validation { step: StepId, errors: FieldErrors },

    #[error("Step {0} is still loading its options")]
    ResolutionPending(StepId),

    #[error("Options for step {step} could not be loaded: {message}")]
    ResolutionFailed { step: StepId, message: String },

    #[error("Cannot jump from {from} to {to}")]
    JumpNotAllowed { from: StepId, to: StepId },

    #[error("This action is only available on the review step")]
    NotOnReview,

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    #[error("No submission is in progress")]
    NoSubmissionInFlight,

    #[error("The wizard session is closed")]
    Closed,

    #[error("Field {0} is fixed for this user")]
    ReadOnlyField(Field),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("Document service rejected the request: {0}")]
    Submission(String),
}
