//! Configurable reachability search.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::TraceConfig;
use crate::error::TraceResult;
use crate::network::{EquipmentId, Network, NetworkState, TerminalId};
use crate::operators::state_operators;
use crate::trace::{NetworkTrace, NetworkTraceStep, StepContext, TraversalStats};

/// Where a reachability search starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStart {
    /// A single terminal.
    Terminal(TerminalId),
    /// Every terminal of a piece of equipment.
    Equipment(EquipmentId),
}

/// Result of a reachability search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reachability {
    /// Where the search started.
    pub start: TraceStart,
    /// Equipment reached, in first-visit order.
    pub equipment: Vec<EquipmentId>,
    /// Terminals reached, in first-visit order.
    pub terminals: Vec<TerminalId>,
    /// Traversal counters.
    pub stats: TraversalStats,
}

impl Reachability {
    /// Returns true if `equipment` was reached.
    #[must_use]
    pub fn contains_equipment(&self, equipment: EquipmentId) -> bool {
        self.equipment.contains(&equipment)
    }

    /// mRIDs of the reached equipment, in visit order.
    #[must_use]
    pub fn equipment_mrids<'n>(&self, network: &'n Network) -> Vec<&'n str> {
        self.equipment
            .iter()
            .map(|id| network.equipment(*id).mrid.as_str())
            .collect()
    }
}

/// Runs a reachability search described by `config`.
///
/// Only actionable steps are reported, so with
/// [`FirstStepOnEquipment`](crate::trace::NetworkTraceActionType::FirstStepOnEquipment)
/// the terminal list holds the terminal each piece of equipment was first
/// entered through.
///
/// # Errors
/// Returns a validation error for an invalid configuration and a graph error
/// for a start that is not part of `network`.
pub fn trace_reachable(
    network: &Network,
    state: &NetworkState,
    start: TraceStart,
    config: &TraceConfig,
) -> TraceResult<Reachability> {
    let ops = state_operators(config.state_view, network, state);
    let mut equipment = Vec::new();
    let mut terminals = Vec::new();
    let mut seen_equipment = HashSet::new();
    let mut seen_terminals = HashSet::new();

    let mut trace = NetworkTrace::from_config(ops.as_ref(), config)?.add_step_action(
        |step: &NetworkTraceStep<()>, _: &StepContext| -> TraceResult<()> {
            if seen_terminals.insert(step.path.to_terminal) {
                terminals.push(step.path.to_terminal);
            }
            if seen_equipment.insert(step.path.to_equipment) {
                equipment.push(step.path.to_equipment);
            }
            Ok(())
        },
    );
    let stats = match start {
        TraceStart::Terminal(terminal) => trace.run_from_terminal(terminal, ())?,
        TraceStart::Equipment(id) => trace.run_from_equipment(id, ())?,
    };
    drop(trace);

    tracing::debug!(
        equipment = equipment.len(),
        terminals = terminals.len(),
        processed = stats.items_processed,
        "reachability trace complete"
    );
    Ok(Reachability {
        start,
        equipment,
        terminals,
        stats,
    })
}
