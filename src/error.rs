//! Error types for gridtrace.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the specific failure: configuration problems are reported before a trace
//! starts, graph problems come from the equipment graph or step actions, and
//! execution problems come from the concurrent runtime.

use thiserror::Error;

use crate::direction::FeederDirection;
use crate::network::{EquipmentId, TerminalId};
use crate::phase::PhaseCode;

/// Validation errors raised while configuring a trace or building a network.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Direction {direction} cannot be requested by a direction condition")]
    UnsupportedDirection {
        direction: FeederDirection,
    },

    #[error("Context value key '{key}' is registered more than once")]
    DuplicateContextKey {
        key: String,
    },

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField {
        field: String,
        reason: String,
    },

    #[error("Duplicate mRID: {mrid}")]
    DuplicateMrid {
        mrid: String,
    },

    #[error("Invalid trace configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Errors describing lookups into, or inconsistencies in, the equipment graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Terminal not found: {id}")]
    TerminalNotFound {
        id: TerminalId,
    },

    #[error("Equipment not found: {id}")]
    EquipmentNotFound {
        id: EquipmentId,
    },

    #[error("No equipment with mRID '{mrid}'")]
    UnknownMrid {
        mrid: String,
    },

    #[error("Equipment {equipment} has no terminal with sequence number {sequence_number}")]
    NoSuchTerminal {
        equipment: EquipmentId,
        sequence_number: u32,
    },

    #[error("Terminal {terminal} carries phases {terminal_phases} but its equipment only declares {equipment_phases}")]
    PhaseInconsistency {
        terminal: TerminalId,
        terminal_phases: PhaseCode,
        equipment_phases: PhaseCode,
    },

    #[error("Invalid segment attachment: {reason}")]
    InvalidAttachment {
        reason: String,
    },
}

/// Errors raised while executing traces.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Step action failed: {message}")]
    StepAction {
        message: String,
    },

    #[error("Trace queue is full (capacity {capacity})")]
    QueueFull {
        capacity: usize,
    },

    #[error("Trace runtime is disconnected")]
    Disconnected,

    #[error("Trace timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Failed to spawn trace worker: {message}")]
    Spawn {
        message: String,
    },
}

/// Top-level error type for gridtrace.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl TraceError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a step action failure from any displayable message.
    #[must_use]
    pub fn step_action(message: impl Into<String>) -> Self {
        Self::Execution(ExecutionError::StepAction {
            message: message.into(),
        })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a graph error.
    #[must_use]
    pub const fn is_graph(&self) -> bool {
        matches!(self, Self::Graph(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Result type alias for gridtrace operations.
pub type TraceResult<T> = Result<T, TraceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_direction() {
        let err = ValidationError::UnsupportedDirection {
            direction: FeederDirection::Connector,
        };
        let msg = format!("{err}");
        assert!(msg.contains("CONNECTOR"));
        assert!(msg.contains("cannot be requested"));
    }

    #[test]
    fn test_validation_error_duplicate_key() {
        let err = ValidationError::DuplicateContextKey {
            key: "equipment_type_step_count:Breaker".to_string(),
        };
        assert!(err.to_string().contains("Breaker"));
    }

    #[test]
    fn test_graph_error_phase_inconsistency() {
        let err = GraphError::PhaseInconsistency {
            terminal: TerminalId::new(3),
            terminal_phases: PhaseCode::ABCN,
            equipment_phases: PhaseCode::ABC,
        };
        let msg = format!("{err}");
        assert!(msg.contains("ABCN"));
        assert!(msg.contains("ABC"));
    }

    #[test]
    fn test_execution_error_queue_full() {
        let err = ExecutionError::QueueFull { capacity: 8 };
        assert!(err.to_string().contains('8'));
    }

    #[test]
    fn test_trace_error_from_validation() {
        let err: TraceError = ValidationError::MissingField {
            field: "mrid".to_string(),
        }
        .into();
        assert!(err.is_validation());
        assert!(!err.is_graph());
    }

    #[test]
    fn test_trace_error_from_graph() {
        let err: TraceError = GraphError::UnknownMrid {
            mrid: "b2".to_string(),
        }
        .into();
        assert!(err.is_graph());
        assert!(err.to_string().contains("b2"));
    }

    #[test]
    fn test_trace_error_step_action() {
        let err = TraceError::step_action("writer rejected terminal");
        assert!(err.is_execution());
        assert!(err.to_string().contains("writer rejected terminal"));
    }

    #[test]
    fn test_trace_error_internal() {
        let err = TraceError::internal("unexpected state");
        assert!(err.is_internal());
        assert!(err.to_string().contains("unexpected state"));
    }
}
