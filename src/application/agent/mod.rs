//! Agent orchestrator: decide, dispatch, finalize.

mod errors;
mod instructions;
mod models;
mod runner;


pub use errors::AgentError;
pub use instructions::{
    DecisionEntry, FALLBACK_POLICY, ROUTING_PROMPT, StructuredDecision, structured_decision_schema,
    structured_instructions,
};
pub use models::{AgentOptions, AgentOutcome, AgentStep, OrchestratorSettings, Phase};
pub use runner::Orchestrator;
