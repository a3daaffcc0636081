use crate::network::{EquipmentClass, Network};
use crate::trace::context::StepContext;
use crate::trace::path::{NetworkTraceStep, StepType};

use super::{NetworkTraceQueueCondition, QueueCondition};

/// Stops internal steps into or out of a shunt compensator's grounding terminal.
#[derive(Debug, Clone, Copy)]
pub struct GroundingTerminalCondition<'a> {
    network: &'a Network,
}

impl<'a> GroundingTerminalCondition<'a> {
    /// Creates the condition.
    #[must_use]
    pub fn new(network: &'a Network) -> Self {
        Self { network }
    }
}

impl<T> QueueCondition<NetworkTraceStep<T>> for GroundingTerminalCondition<'_> {
    fn should_queue(
        &self,
        next_item: &NetworkTraceStep<T>,
        _next_context: &StepContext,
        _current_item: &NetworkTraceStep<T>,
        _current_context: &StepContext,
    ) -> bool {
        let path = &next_item.path;
        let equipment = self.network.equipment(path.to_equipment);
        if !equipment.is_instance_of(EquipmentClass::ShuntCompensator) {
            return true;
        }
        equipment
            .grounding_terminal
            .map_or(true, |g| g != path.to_terminal && g != path.from_terminal)
    }
}

/// [`GroundingTerminalCondition`] gated to internal steps.
#[must_use]
pub fn stop_at_grounding_terminals(network: &Network) -> NetworkTraceQueueCondition<GroundingTerminalCondition<'_>> {
    NetworkTraceQueueCondition::new(StepType::Internal, GroundingTerminalCondition::new(network))
}
