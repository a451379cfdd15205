mod context;
pub mod fsm;
mod orchestrator;

pub use context::{
    AbortReason, PartFailure, SubmissionContext, SubmissionOutcome, SubmissionReport,
};
pub use fsm::{ExchangeEvent, ExchangeState, ExchangeStateMachine};
pub use orchestrator::InferenceExchange;
