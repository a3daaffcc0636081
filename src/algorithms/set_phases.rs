//! Energised phase propagation.
//!
//! Each energy source terminal is traced with its own phases. Phases shrink
//! to the intersection with every terminal reached, and open phases of a
//! switch are removed when stepping through it. A step left with no phases
//! is not queued.

use std::collections::BTreeMap;

use crate::error::{GraphError, TraceError, TraceResult};
use crate::network::{EquipmentClass, Network, NetworkState, StateView, TerminalId};
use crate::operators::{state_operators, NetworkStateOperators};
use crate::phase::PhaseCode;
use crate::trace::{ContextValueComputer, NetworkTrace, NetworkTraceActionType, NetworkTraceStep, StepContext};

/// Energised phases computed for each terminal.
pub type PhaseAssignments = BTreeMap<TerminalId, PhaseCode>;

const PHASES_KEY: &str = "set_phases:phases";

struct PhasesToApply<'a> {
    ops: &'a dyn NetworkStateOperators,
}

impl<T> ContextValueComputer<NetworkTraceStep<T>> for PhasesToApply<'_> {
    type Value = PhaseCode;

    fn key(&self) -> &str {
        PHASES_KEY
    }

    fn compute_initial_value(&self, item: &NetworkTraceStep<T>) -> PhaseCode {
        self.ops.network().terminal(item.path.to_terminal).phases
    }

    fn compute_next_value(
        &self,
        next_item: &NetworkTraceStep<T>,
        _current_item: &NetworkTraceStep<T>,
        current_value: &PhaseCode,
    ) -> PhaseCode {
        let network = self.ops.network();
        let path = &next_item.path;
        let mut phases = current_value.intersection(network.terminal(path.to_terminal).phases);
        if path.traced_internally() && network.equipment(path.to_equipment).class.is_switch() {
            phases = phases.difference(self.ops.open_phases(path.to_equipment));
        }
        phases
    }
}

fn check_terminal_phases(network: &Network, terminal: TerminalId) -> Result<(), GraphError> {
    let t = network.terminal(terminal);
    let equipment = network.equipment(t.equipment);
    if t.phases.is_subset_of(equipment.phases) {
        Ok(())
    } else {
        Err(GraphError::PhaseInconsistency {
            terminal,
            terminal_phases: t.phases,
            equipment_phases: equipment.phases,
        })
    }
}

/// Computes energised phases reachable from `source_terminal`.
///
/// # Errors
/// Returns [`GraphError::PhaseInconsistency`] when a reached terminal
/// carries phases its equipment does not declare.
pub fn compute(ops: &dyn NetworkStateOperators, source_terminal: TerminalId) -> TraceResult<PhaseAssignments> {
    let network = ops.network();
    let mut assignments = PhaseAssignments::new();

    NetworkTrace::without_data(ops, NetworkTraceActionType::AllSteps)
        .add_context_value_computer(PhasesToApply { ops })
        .add_queue_condition(
            |_: &NetworkTraceStep<()>, next_ctx: &StepContext, _: &NetworkTraceStep<()>, _: &StepContext| {
                next_ctx.value::<PhaseCode>(PHASES_KEY).is_some_and(|p| !p.is_empty())
            },
        )
        .add_step_action(|step: &NetworkTraceStep<()>, ctx: &StepContext| -> TraceResult<()> {
            check_terminal_phases(network, step.path.to_terminal)?;
            let phases = ctx
                .value::<PhaseCode>(PHASES_KEY)
                .copied()
                .ok_or_else(|| TraceError::internal("phase context value missing"))?;
            let entry = assignments.entry(step.path.to_terminal).or_default();
            *entry = entry.union(phases);
            Ok(())
        })
        .run_from_terminal(source_terminal, ())?;

    Ok(assignments)
}

/// Energises phases from every energy source in `view`.
///
/// # Errors
/// Propagates errors from [`compute`]. The state is untouched on error.
pub fn run(network: &Network, state: &mut NetworkState, view: StateView) -> TraceResult<PhaseAssignments> {
    let mut combined = PhaseAssignments::new();
    {
        let ops = state_operators(view, network, state);
        let sources = network
            .equipment_iter()
            .filter(|eq| eq.is_instance_of(EquipmentClass::EnergySource));
        for source in sources {
            for &terminal in &source.terminals {
                for (t, phases) in compute(ops.as_ref(), terminal)? {
                    let entry = combined.entry(t).or_default();
                    *entry = entry.union(phases);
                }
            }
        }
    }

    let view_state = state.view_mut(view);
    for (&terminal, &phases) in &combined {
        view_state.add_energised_phases(terminal, phases);
    }
    tracing::info!(view = ?view, terminals = combined.len(), "energised phases applied");
    Ok(combined)
}
