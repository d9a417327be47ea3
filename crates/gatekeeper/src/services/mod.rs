//! Business logic services.

pub mod decision;

pub use decision::{DecideError, Decision, DecisionService};
