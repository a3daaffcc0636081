use std::cell::RefCell;
use std::collections::HashSet;

use crate::direction::FeederDirection;
use crate::error::ValidationError;
use crate::network::{EquipmentClass, TerminalId};
use crate::operators::NetworkStateOperators;
use crate::trace::context::StepContext;
use crate::trace::next_paths::next_paths;
use crate::trace::path::{NetworkTraceStep, StepPath};

use super::QueueCondition;

/// Queues only steps heading in the requested feeder direction.
///
/// A terminal's direction describes tracing *out* of it. Steps that continue
/// out of the terminal they arrive at (internal steps and segment walks)
/// test the requested direction directly. External steps enter equipment,
/// so they test the complement of the request.
///
/// Cuts have no direction of their own worth testing. A step entering a cut,
/// or crossing between its terminals, is queued if any path beyond it would
/// be.
#[derive(Debug)]
pub struct DirectionCondition<'a> {
    direction: FeederDirection,
    ops: &'a dyn NetworkStateOperators,
    in_progress: RefCell<HashSet<TerminalId>>,
}

impl<'a> DirectionCondition<'a> {
    /// Creates the condition.
    ///
    /// # Errors
    /// Returns [`ValidationError::UnsupportedDirection`] for `Connector`.
    pub fn new(direction: FeederDirection, ops: &'a dyn NetworkStateOperators) -> Result<Self, ValidationError> {
        if direction == FeederDirection::Connector {
            return Err(ValidationError::UnsupportedDirection { direction });
        }
        Ok(Self {
            direction,
            ops,
            in_progress: RefCell::new(HashSet::new()),
        })
    }

    /// The requested direction.
    #[must_use]
    pub fn direction(&self) -> FeederDirection {
        self.direction
    }

    fn enters_or_crosses_cut(&self, path: &StepPath) -> bool {
        !path.is_start() && self.is_class(path, EquipmentClass::Cut)
    }

    fn is_class(&self, path: &StepPath, class: EquipmentClass) -> bool {
        self.ops.network().equipment(path.to_equipment).class == class
    }

    fn should_queue_path(&self, path: &StepPath) -> bool {
        if self.enters_or_crosses_cut(path) {
            return self.should_queue_next_paths(path);
        }
        let actual = self.ops.get_direction(path.to_terminal);
        if path.traced_internally() || path.traversed_ac_line_segment {
            actual.contains(self.direction)
        } else {
            actual.contains(self.direction.complement())
        }
    }

    fn should_queue_next_paths(&self, path: &StepPath) -> bool {
        // Cut to cut cycles would otherwise recurse forever.
        if !self.in_progress.borrow_mut().insert(path.to_terminal) {
            return false;
        }
        let result = next_paths(self.ops, path)
            .iter()
            .any(|next| self.should_queue_path(next));
        self.in_progress.borrow_mut().remove(&path.to_terminal);
        result
    }
}

impl<T> QueueCondition<NetworkTraceStep<T>> for DirectionCondition<'_> {
    fn should_queue(
        &self,
        next_item: &NetworkTraceStep<T>,
        _next_context: &StepContext,
        _current_item: &NetworkTraceStep<T>,
        _current_context: &StepContext,
    ) -> bool {
        self.should_queue_path(&next_item.path)
    }

    fn should_queue_start_item(&self, item: &NetworkTraceStep<T>) -> bool {
        let path = &item.path;
        if self.ops.get_direction(path.to_terminal).contains(self.direction) {
            return true;
        }
        (self.is_class(path, EquipmentClass::Clamp) || self.is_class(path, EquipmentClass::Cut))
            && self.should_queue_next_paths(path)
    }
}
