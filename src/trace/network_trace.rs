//! Network traces: the traversal engine bound to an equipment graph.

use crate::config::TraceConfig;
use crate::direction::FeederDirection;
use crate::error::{TraceResult, ValidationError};
use crate::network::{EquipmentClass, EquipmentId, TerminalId};
use crate::operators::NetworkStateOperators;
use crate::phase::SinglePhaseKind;

use super::actions::{NetworkTraceActionType, StepAction};
use super::conditions::{
    self, ContextValueComputer, DirectionCondition, EquipmentStepLimitCondition, EquipmentTypeStepLimitCondition,
    NetworkTraceQueueCondition, QueueCondition, StopCondition, StopConditionWithContextValue,
};
use super::next_paths::next_paths;
use super::path::{NetworkTraceStep, StepPath, StepType};
use super::queue::QueueStrategy;
use super::traversal::{ItemExpander, Traversal, TraversalStats};

type ComputeData<'a, T> = Box<dyn Fn(&NetworkTraceStep<T>, &StepPath) -> T + 'a>;

/// Expands network trace steps along [`next_paths`].
pub struct NetworkExpander<'a, T> {
    ops: &'a dyn NetworkStateOperators,
    compute_data: ComputeData<'a, T>,
}

impl<T> ItemExpander<NetworkTraceStep<T>> for NetworkExpander<'_, T> {
    type Key = TerminalId;

    fn visit_key(&self, item: &NetworkTraceStep<T>) -> TerminalId {
        item.path.to_terminal
    }

    fn next_items(&self, item: &NetworkTraceStep<T>) -> TraceResult<Vec<NetworkTraceStep<T>>> {
        Ok(next_paths(self.ops, &item.path)
            .into_iter()
            .map(|path| {
                let data = (self.compute_data)(item, &path);
                item.next(path, data)
            })
            .collect())
    }
}

/// A trace over one view of a network, carrying data of type `T` per step.
///
/// # Example
/// ```
/// use gridtrace::network::{EquipmentClass, Network, NetworkState};
/// use gridtrace::operators::NormalStateOperators;
/// use gridtrace::trace::{NetworkTrace, NetworkTraceActionType};
///
/// let mut b = Network::builder();
/// let source = b.add_equipment("source", EquipmentClass::EnergySource, 1)?;
/// let line = b.add_equipment("line", EquipmentClass::AcLineSegment, 2)?;
/// b.chain(&[source, line])?;
/// let network = b.build();
/// let state = NetworkState::new();
/// let ops = NormalStateOperators::new(&network, &state);
///
/// let stats = NetworkTrace::without_data(&ops, NetworkTraceActionType::AllSteps)
///     .stop_at_open(None)
///     .run_from_equipment(source, ())?;
/// assert_eq!(stats.items_processed, 3);
/// # Ok::<(), gridtrace::TraceError>(())
/// ```
pub struct NetworkTrace<'a, T> {
    ops: &'a dyn NetworkStateOperators,
    traversal: Traversal<'a, NetworkTraceStep<T>, NetworkExpander<'a, T>>,
}

impl<'a> NetworkTrace<'a, ()> {
    /// A trace that carries no data.
    #[must_use]
    pub fn without_data(ops: &'a dyn NetworkStateOperators, action_type: NetworkTraceActionType) -> Self {
        Self::new(ops, action_type, |_, _| ())
    }

    /// A data-less trace set up from `config`.
    ///
    /// The caller picks operators matching `config.state_view`.
    ///
    /// # Errors
    /// Returns any error from [`TraceConfig::validate`].
    pub fn from_config(ops: &'a dyn NetworkStateOperators, config: &TraceConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        let mut trace = Self::without_data(ops, config.action_type)
            .queue_strategy(config.queue)
            .can_stop_on_start_item(config.can_stop_on_start_item);
        if config.stop_at_open {
            trace = trace.stop_at_open(config.open_phase);
        }
        if let Some(direction) = config.direction {
            trace = trace.with_direction(direction)?;
        }
        if let Some(limit) = config.max_equipment_steps {
            trace = trace.limit_equipment_steps(limit);
        }
        if let Some(limit) = config.equipment_type_limit {
            trace = trace.limit_equipment_type_steps(limit.limit, limit.class);
        }
        if config.stop_at_grounding_terminals {
            trace = trace.stop_at_grounding_terminals();
        }
        Ok(trace)
    }
}

impl<'a, T: 'a> NetworkTrace<'a, T> {
    /// Creates a trace whose step data is produced by `compute_data` from
    /// the current step and the next path.
    pub fn new(
        ops: &'a dyn NetworkStateOperators,
        action_type: NetworkTraceActionType,
        compute_data: impl Fn(&NetworkTraceStep<T>, &StepPath) -> T + 'a,
    ) -> Self {
        let expander = NetworkExpander {
            ops,
            compute_data: Box::new(compute_data),
        };
        let traversal = Traversal::new(expander)
            .actionable_filter(move |item: &NetworkTraceStep<T>, ctx| action_type.is_actionable(item, ctx));
        Self { ops, traversal }
    }

    /// The operators this trace reads.
    #[must_use]
    pub fn ops(&self) -> &'a dyn NetworkStateOperators {
        self.ops
    }

    /// Sets the queue strategy.
    #[must_use]
    pub fn queue_strategy(mut self, strategy: QueueStrategy) -> Self {
        self.traversal = self.traversal.queue_strategy(strategy);
        self
    }

    /// Adds a queue condition applied to every step.
    #[must_use]
    pub fn add_queue_condition(mut self, condition: impl QueueCondition<NetworkTraceStep<T>> + 'a) -> Self {
        self.traversal = self.traversal.add_queue_condition(condition);
        self
    }

    /// Adds a queue condition applied only to steps of `step_type`.
    #[must_use]
    pub fn add_network_condition<C>(self, step_type: StepType, condition: C) -> Self
    where
        C: QueueCondition<NetworkTraceStep<T>> + 'a,
    {
        self.add_queue_condition(NetworkTraceQueueCondition::new(step_type, condition))
    }

    /// Adds a stop condition.
    #[must_use]
    pub fn add_stop_condition(mut self, condition: impl StopCondition<NetworkTraceStep<T>> + 'a) -> Self {
        self.traversal = self.traversal.add_stop_condition(condition);
        self
    }

    /// Adds a stop condition driven by its own context value.
    #[must_use]
    pub fn add_stop_condition_with_value<C>(mut self, condition: C) -> Self
    where
        C: StopConditionWithContextValue<NetworkTraceStep<T>> + 'a,
    {
        self.traversal = self.traversal.add_stop_condition_with_value(condition);
        self
    }

    /// Adds a context-value computer.
    #[must_use]
    pub fn add_context_value_computer<C>(mut self, computer: C) -> Self
    where
        C: ContextValueComputer<NetworkTraceStep<T>> + 'a,
    {
        self.traversal = self.traversal.add_context_value_computer(computer);
        self
    }

    /// Adds a step action.
    #[must_use]
    pub fn add_step_action(mut self, action: impl StepAction<NetworkTraceStep<T>> + 'a) -> Self {
        self.traversal = self.traversal.add_step_action(action);
        self
    }

    /// When false, stop conditions are not consulted for start items.
    #[must_use]
    pub fn can_stop_on_start_item(mut self, can_stop: bool) -> Self {
        self.traversal = self.traversal.can_stop_on_start_item(can_stop);
        self
    }

    /// Blocks internal steps through switches open on `phase` (any phase if `None`).
    #[must_use]
    pub fn stop_at_open(self, phase: Option<SinglePhaseKind>) -> Self {
        let condition = conditions::stop_at_open(self.ops, phase);
        self.add_queue_condition(condition)
    }

    /// Only follows steps heading in `direction`.
    ///
    /// # Errors
    /// Returns [`ValidationError::UnsupportedDirection`] for `Connector`.
    pub fn with_direction(self, direction: FeederDirection) -> Result<Self, ValidationError> {
        let condition = DirectionCondition::new(direction, self.ops)?;
        Ok(self.add_queue_condition(condition))
    }

    /// Stops after `limit` equipment steps.
    #[must_use]
    pub fn limit_equipment_steps(self, limit: usize) -> Self {
        self.add_stop_condition(EquipmentStepLimitCondition::new(limit))
    }

    /// Stops after stepping onto `limit` pieces of equipment of `class`.
    #[must_use]
    pub fn limit_equipment_type_steps(self, limit: usize, class: EquipmentClass) -> Self {
        let condition = EquipmentTypeStepLimitCondition::new(self.ops.network(), limit, class);
        self.add_stop_condition_with_value(condition)
    }

    /// Blocks internal steps through shunt compensator grounding terminals.
    #[must_use]
    pub fn stop_at_grounding_terminals(self) -> Self {
        let condition = conditions::stop_at_grounding_terminals(self.ops.network());
        self.add_queue_condition(condition)
    }

    /// Runs from a single terminal.
    ///
    /// # Errors
    /// Returns [`GraphError::TerminalNotFound`](crate::error::GraphError) for
    /// a foreign terminal, and any error from the run.
    pub fn run_from_terminal(&mut self, terminal: TerminalId, data: T) -> TraceResult<TraversalStats> {
        let network = self.ops.network();
        network.get_terminal(terminal)?;
        self.run([NetworkTraceStep::start(StepPath::start(network, terminal), data)])
    }

    /// Runs from every terminal of `equipment`.
    ///
    /// # Errors
    /// Returns [`GraphError::EquipmentNotFound`](crate::error::GraphError)
    /// for foreign equipment, and any error from the run.
    pub fn run_from_equipment(&mut self, equipment: EquipmentId, data: T) -> TraceResult<TraversalStats>
    where
        T: Clone,
    {
        let network = self.ops.network();
        let starts: Vec<_> = network
            .get_equipment(equipment)?
            .terminals
            .iter()
            .map(|t| NetworkTraceStep::start(StepPath::start(network, *t), data.clone()))
            .collect();
        self.run(starts)
    }

    /// Runs from explicit start items.
    ///
    /// # Errors
    /// Propagates configuration errors and the first step-action error.
    pub fn run(&mut self, start_items: impl IntoIterator<Item = NetworkTraceStep<T>>) -> TraceResult<TraversalStats> {
        tracing::debug!(view = ?self.ops.view(), "starting network trace");
        self.traversal.run(start_items)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::network::{Network, NetworkState};
    use crate::operators::NormalStateOperators;
    use crate::trace::context::StepContext;

    fn chain(n: usize) -> (Network, Vec<EquipmentId>) {
        let mut b = Network::builder();
        let ids: Vec<_> = (0..n)
            .map(|i| b.add_equipment(format!("e{i}"), EquipmentClass::Junction, 2).unwrap())
            .collect();
        b.chain(&ids).unwrap();
        (b.build(), ids)
    }

    #[test]
    fn data_is_computed_per_step() {
        let (net, ids) = chain(3);
        let state = NetworkState::new();
        let ops = NormalStateOperators::new(&net, &state);
        let depths = RefCell::new(Vec::new());

        NetworkTrace::new(&ops, NetworkTraceActionType::AllSteps, |step: &NetworkTraceStep<u32>, _| step.data + 10)
            .add_step_action(|step: &NetworkTraceStep<u32>, _: &StepContext| -> TraceResult<()> {
                depths.borrow_mut().push(step.data);
                Ok(())
            })
            .run_from_terminal(net.equipment(ids[0]).terminals[1], 0)
            .unwrap();
        assert_eq!(depths.into_inner(), vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn first_step_on_equipment_skips_internal_steps() {
        let (net, ids) = chain(3);
        let state = NetworkState::new();
        let ops = NormalStateOperators::new(&net, &state);
        let seen = RefCell::new(Vec::new());

        NetworkTrace::without_data(&ops, NetworkTraceActionType::FirstStepOnEquipment)
            .add_step_action(|step: &NetworkTraceStep<()>, _: &StepContext| -> TraceResult<()> {
                seen.borrow_mut().push(step.path.to_equipment);
                Ok(())
            })
            .run_from_terminal(net.equipment(ids[0]).terminals[1], ())
            .unwrap();
        assert_eq!(seen.into_inner(), vec![ids[0], ids[1], ids[2]]);
    }

    #[test]
    fn foreign_start_terminal_is_a_graph_error() {
        let (net, _) = chain(1);
        let state = NetworkState::new();
        let ops = NormalStateOperators::new(&net, &state);
        let err = NetworkTrace::without_data(&ops, NetworkTraceActionType::AllSteps)
            .run_from_terminal(TerminalId::new(99), ())
            .unwrap_err();
        assert!(err.is_graph());
    }

    #[test]
    fn connector_direction_is_rejected() {
        let (net, _) = chain(1);
        let state = NetworkState::new();
        let ops = NormalStateOperators::new(&net, &state);
        let result = NetworkTrace::without_data(&ops, NetworkTraceActionType::AllSteps).with_direction(FeederDirection::Connector);
        assert!(result.is_err());
    }
}
