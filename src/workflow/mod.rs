//! Request lifecycle rules.
//!
//! [`policy`] answers "who may do what"; [`transition`] turns an action on a
//! request into a [`Plan`] without side effects.

pub mod policy;
pub mod transition;

pub use policy::{Authority, authority, awaits, is_senior, submission_stage};
pub use transition::{Action, CloseStage, Effect, OpenStage, Plan, plan};
