//! Workflow state machine.
//!
//! - `Stage` / `WorkflowRecord`: the stage sequence and the per-run artifact record
//! - `WorkflowEngine`: drives a record through every stage under one timeout

mod engine;
mod record;

pub use engine::WorkflowEngine;
pub use record::{Stage, Transition, WorkflowRecord};
