//! Feeder direction assignment.
//!
//! Each feeder head is traced outward. The head terminal and every terminal
//! reached by an internal step or a segment walk is `Downstream`; every
//! terminal reached by an external step is `Upstream`. The direction being
//! applied is a context value, so a terminal in a loop is reached once per
//! direction and accumulates `Both`.

use std::collections::BTreeMap;

use crate::direction::FeederDirection;
use crate::error::{TraceError, TraceResult};
use crate::network::{Network, NetworkState, StateView, TerminalId};
use crate::operators::{state_operators, NetworkStateOperators};
use crate::trace::{
    if_not_stopping, ContextValueComputer, NetworkTrace, NetworkTraceActionType, NetworkTraceStep, StepContext,
};

/// Directions computed for each terminal.
pub type DirectionAssignments = BTreeMap<TerminalId, FeederDirection>;

const DIRECTION_KEY: &str = "set_direction:direction";

struct DirectionToApply;

impl<T> ContextValueComputer<NetworkTraceStep<T>> for DirectionToApply {
    type Value = FeederDirection;

    fn key(&self) -> &str {
        DIRECTION_KEY
    }

    fn compute_initial_value(&self, _item: &NetworkTraceStep<T>) -> FeederDirection {
        FeederDirection::Downstream
    }

    fn compute_next_value(
        &self,
        next_item: &NetworkTraceStep<T>,
        _current_item: &NetworkTraceStep<T>,
        _current_value: &FeederDirection,
    ) -> FeederDirection {
        let path = &next_item.path;
        if path.traced_internally() || path.traversed_ac_line_segment {
            FeederDirection::Downstream
        } else {
            FeederDirection::Upstream
        }
    }
}

/// Computes directions for the feeder starting at `head`.
///
/// Stops at switches open in the operators' view and at other feeder heads.
/// Nothing is written to the state.
///
/// # Errors
/// Returns a graph error if `head` is not a terminal of the network.
pub fn compute(ops: &dyn NetworkStateOperators, head: TerminalId) -> TraceResult<DirectionAssignments> {
    let network = ops.network();
    let mut assignments = DirectionAssignments::new();

    NetworkTrace::without_data(ops, NetworkTraceActionType::AllSteps)
        .stop_at_open(None)
        .add_context_value_computer(DirectionToApply)
        .add_stop_condition(|step: &NetworkTraceStep<()>, _: &StepContext| network.is_feeder_head(step.path.to_terminal))
        .can_stop_on_start_item(false)
        .add_step_action(if_not_stopping(
            |step: &NetworkTraceStep<()>, ctx: &StepContext| -> TraceResult<()> {
                let direction = ctx
                    .value::<FeederDirection>(DIRECTION_KEY)
                    .copied()
                    .ok_or_else(|| TraceError::internal("direction context value missing"))?;
                let entry = assignments.entry(step.path.to_terminal).or_default();
                *entry = entry.plus(direction);
                Ok(())
            },
        ))
        .run_from_terminal(head, ())?;

    Ok(assignments)
}

/// Assigns feeder directions from every feeder head in `view`.
///
/// All feeders are computed against the state as it was on entry, then the
/// combined result is added to the view. Existing directions are kept and
/// combined with the new ones.
///
/// # Errors
/// Propagates errors from [`compute`]. The state is untouched on error.
pub fn run(network: &Network, state: &mut NetworkState, view: StateView) -> TraceResult<DirectionAssignments> {
    let mut combined = DirectionAssignments::new();
    {
        let ops = state_operators(view, network, state);
        for &head in network.feeder_heads() {
            for (terminal, direction) in compute(ops.as_ref(), head)? {
                let entry = combined.entry(terminal).or_default();
                *entry = entry.plus(direction);
            }
        }
    }

    let view_state = state.view_mut(view);
    let mut changed = 0_usize;
    for (&terminal, &direction) in &combined {
        changed += usize::from(view_state.add_direction(terminal, direction));
    }
    tracing::info!(
        view = ?view,
        feeder_heads = network.feeder_heads().len(),
        terminals = combined.len(),
        changed,
        "feeder directions applied"
    );
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::EquipmentClass;
    use crate::operators::NormalStateOperators;

    #[test]
    fn radial_feeder_alternates_directions() {
        let mut b = Network::builder();
        let breaker = b.add_equipment("cb", EquipmentClass::Breaker, 2).unwrap();
        let line = b.add_equipment("line", EquipmentClass::AcLineSegment, 2).unwrap();
        let load = b.add_equipment("load", EquipmentClass::EnergyConsumer, 1).unwrap();
        b.chain(&[breaker, line, load]).unwrap();
        let head = b.terminal(breaker, 2).unwrap();
        b.add_feeder_head(head).unwrap();
        let net = b.build();
        let state = NetworkState::new();
        let ops = NormalStateOperators::new(&net, &state);

        let result = compute(&ops, head).unwrap();
        let line_t = &net.equipment(line).terminals;
        let load_t = net.equipment(load).terminals[0];
        assert_eq!(result[&head], FeederDirection::Downstream);
        assert_eq!(result[&line_t[0]], FeederDirection::Upstream);
        assert_eq!(result[&line_t[1]], FeederDirection::Downstream);
        assert_eq!(result[&load_t], FeederDirection::Upstream);
        assert!(!result.contains_key(&net.equipment(breaker).terminals[0]));
    }

    #[test]
    fn run_applies_to_the_chosen_view_only() {
        let mut b = Network::builder();
        let breaker = b.add_equipment("cb", EquipmentClass::Breaker, 2).unwrap();
        let load = b.add_equipment("load", EquipmentClass::EnergyConsumer, 1).unwrap();
        b.chain(&[breaker, load]).unwrap();
        let head = b.terminal(breaker, 2).unwrap();
        b.add_feeder_head(head).unwrap();
        let net = b.build();

        let mut state = NetworkState::new();
        run(&net, &mut state, StateView::Current).unwrap();
        assert_eq!(state.view(StateView::Current).direction(head), FeederDirection::Downstream);
        assert_eq!(state.view(StateView::Normal).direction(head), FeederDirection::None);

        // Re-running adds nothing new.
        let again = run(&net, &mut state, StateView::Current).unwrap();
        assert_eq!(again[&head], FeederDirection::Downstream);
        assert_eq!(state.view(StateView::Current).direction(head), FeederDirection::Downstream);
    }
}
