//! Algorithms built on network traces.

pub mod reachability;
pub mod set_direction;
pub mod set_phases;

pub use reachability::{trace_reachable, Reachability, TraceStart};
pub use set_direction::DirectionAssignments;
pub use set_phases::PhaseAssignments;
