//! # gridtrace - Connectivity tracing for electrical networks
//!
//! gridtrace walks the terminal/equipment graph of a distribution network.
//! A trace starts at one or more terminals and expands step by step through
//! connectivity nodes (external steps) and through equipment (internal
//! steps), consulting pluggable conditions that decide what is queued, where
//! the trace stops, and which steps run actions.
//!
//! ## Core Concepts
//!
//! - **Network**: equipment, their terminals, and the nodes joining them
//! - **NetworkState**: switch, in-service, direction and phase state, kept for
//!   a normal and a current view
//! - **Traversal**: a generic search driven by queue and stop conditions,
//!   step actions and per-path context values
//! - **NetworkTrace**: a traversal bound to a network and one state view
//! - **Algorithms**: feeder direction assignment, phase energisation and
//!   configurable reachability built on network traces
//!
//! ## Usage
//!
//! ```rust
//! use gridtrace::algorithms::{trace_reachable, TraceStart};
//! use gridtrace::network::{EquipmentClass, Network, NetworkState};
//! use gridtrace::TraceConfig;
//!
//! let mut b = Network::builder();
//! let source = b.add_equipment("source", EquipmentClass::EnergySource, 1)?;
//! let breaker = b.add_equipment("cb", EquipmentClass::Breaker, 2)?;
//! let load = b.add_equipment("load", EquipmentClass::EnergyConsumer, 1)?;
//! b.chain(&[source, breaker, load])?;
//! let network = b.build();
//!
//! let mut state = NetworkState::new();
//! state.set_switch_open(breaker, true);
//!
//! let reached = trace_reachable(&network, &state, TraceStart::Equipment(source), &TraceConfig::default())?;
//! assert_eq!(reached.equipment_mrids(&network), vec!["source", "cb"]);
//! # Ok::<(), gridtrace::TraceError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod direction;
pub mod error;
pub mod network;
pub mod phase;

// State access and trace engine
pub mod config;
pub mod operators;
pub mod trace;

// Algorithms and execution
pub mod algorithms;
pub mod runtime;

// Re-export primary types at crate root for convenience
pub use config::{EquipmentTypeLimit, TraceConfig};
pub use direction::FeederDirection;
pub use error::{ExecutionError, GraphError, TraceError, TraceResult, ValidationError};
pub use network::{EquipmentClass, EquipmentId, Network, NetworkBuilder, NetworkState, StateView, TerminalId};
pub use operators::{state_operators, CurrentStateOperators, NetworkStateOperators, NormalStateOperators};
pub use phase::{PhaseCode, SinglePhaseKind};
pub use runtime::{TraceHandle, TraceRuntime, TraceRuntimeConfig};
pub use trace::{NetworkTrace, NetworkTraceActionType, NetworkTraceStep, QueueStrategy, StepContext, StepPath};
