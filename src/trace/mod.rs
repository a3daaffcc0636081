//! The network trace engine.
//!
//! [`Traversal`] is a generic breadth-first or depth-first search driven by
//! pluggable conditions. [`NetworkTrace`] binds it to an equipment graph
//! through [`next_paths`] and a set of state operators.
//!
//! # Termination
//!
//! Items are tracked by the terminal they arrive at together with their
//! context values. A terminal is therefore queued at most once per distinct
//! set of context values, and any trace whose context values range over a
//! finite set terminates on a cyclic network.

pub mod actions;
pub mod conditions;
pub mod context;
pub mod network_trace;
pub mod next_paths;
pub mod path;
pub mod queue;
pub mod traversal;

pub use actions::{if_not_stopping, if_stopping, IfNotStopping, IfStopping, NetworkTraceActionType, StepAction};
pub use conditions::{
    ContextValueComputer, DirectionCondition, EquipmentStepLimitCondition, EquipmentTypeStepLimitCondition,
    GroundingTerminalCondition, NetworkTraceQueueCondition, OpenCondition, QueueCondition, StopCondition,
    StopConditionWithContextValue,
};
pub use context::{ContextValue, ContextValues, StepContext, StoredValue};
pub use network_trace::{NetworkExpander, NetworkTrace};
pub use next_paths::next_paths;
pub use path::{NetworkTraceStep, StepPath, StepType};
pub use queue::{QueueStrategy, TraversalQueue};
pub use traversal::{ItemExpander, Traversal, TraversalStats};
