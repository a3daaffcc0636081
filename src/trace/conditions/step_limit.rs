use crate::network::{EquipmentClass, Network};
use crate::trace::context::StepContext;
use crate::trace::path::NetworkTraceStep;

use super::{ContextValueComputer, StopCondition, StopConditionWithContextValue};

/// Stops once `limit` equipment steps have been taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquipmentStepLimitCondition {
    limit: usize,
}

impl EquipmentStepLimitCondition {
    /// Creates the condition.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl<T> StopCondition<NetworkTraceStep<T>> for EquipmentStepLimitCondition {
    fn should_stop(&self, item: &NetworkTraceStep<T>, _context: &StepContext) -> bool {
        item.num_equipment_steps >= self.limit
    }
}

/// Stops once `limit` pieces of equipment of a class have been stepped onto.
///
/// The count is a context value: it only grows on external steps whose
/// target equipment is an instance of the class.
#[derive(Debug, Clone)]
pub struct EquipmentTypeStepLimitCondition<'a> {
    network: &'a Network,
    limit: usize,
    class: EquipmentClass,
    key: String,
}

impl<'a> EquipmentTypeStepLimitCondition<'a> {
    /// Creates the condition.
    #[must_use]
    pub fn new(network: &'a Network, limit: usize, class: EquipmentClass) -> Self {
        Self {
            network,
            limit,
            class,
            key: format!("equipment_type_step_count:{class}"),
        }
    }
}

impl<T> ContextValueComputer<NetworkTraceStep<T>> for EquipmentTypeStepLimitCondition<'_> {
    type Value = usize;

    fn key(&self) -> &str {
        &self.key
    }

    fn compute_initial_value(&self, _item: &NetworkTraceStep<T>) -> usize {
        0
    }

    fn compute_next_value(&self, next_item: &NetworkTraceStep<T>, _current_item: &NetworkTraceStep<T>, current_value: &usize) -> usize {
        let path = &next_item.path;
        if path.traced_externally() && self.network.equipment(path.to_equipment).is_instance_of(self.class) {
            current_value + 1
        } else {
            *current_value
        }
    }
}

impl<T> StopConditionWithContextValue<NetworkTraceStep<T>> for EquipmentTypeStepLimitCondition<'_> {
    fn should_stop(&self, _item: &NetworkTraceStep<T>, _context: &StepContext, value: &usize) -> bool {
        *value >= self.limit
    }
}
