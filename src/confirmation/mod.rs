// src/confirmation/mod.rs

mod action;
mod state_machine;

pub use action::{resolve_action, Action, CompositeKey};
pub use state_machine::{ConfirmationEngine, EngineState};
