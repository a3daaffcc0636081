use crate::operators::NetworkStateOperators;
use crate::phase::SinglePhaseKind;
use crate::trace::context::StepContext;
use crate::trace::path::{NetworkTraceStep, StepType};

use super::{NetworkTraceQueueCondition, QueueCondition};

/// Blocks steps through open switches.
///
/// Non-switch equipment is always queued. A switch is queued unless it is
/// open on `phase`, or on any phase when no phase is given.
#[derive(Debug, Clone, Copy)]
pub struct OpenCondition<'a> {
    ops: &'a dyn NetworkStateOperators,
    phase: Option<SinglePhaseKind>,
}

impl<'a> OpenCondition<'a> {
    /// Creates the condition for `phase`.
    #[must_use]
    pub fn new(ops: &'a dyn NetworkStateOperators, phase: Option<SinglePhaseKind>) -> Self {
        Self { ops, phase }
    }
}

impl<T> QueueCondition<NetworkTraceStep<T>> for OpenCondition<'_> {
    fn should_queue(
        &self,
        next_item: &NetworkTraceStep<T>,
        _next_context: &StepContext,
        _current_item: &NetworkTraceStep<T>,
        _current_context: &StepContext,
    ) -> bool {
        let equipment = next_item.path.to_equipment;
        !self.ops.network().equipment(equipment).class.is_switch() || !self.ops.is_open(equipment, self.phase)
    }
}

/// [`OpenCondition`] gated to internal steps.
#[must_use]
pub fn stop_at_open(
    ops: &dyn NetworkStateOperators,
    phase: Option<SinglePhaseKind>,
) -> NetworkTraceQueueCondition<OpenCondition<'_>> {
    NetworkTraceQueueCondition::new(StepType::Internal, OpenCondition::new(ops, phase))
}
