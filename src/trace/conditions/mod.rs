//! Queue and stop conditions.
//!
//! Queue conditions are AND-combined: a candidate is queued only if every
//! condition accepts it. Stop conditions are OR-combined: an item stops if
//! any condition matches. Conditions may read the context but never write
//! it; values are produced only by [`ContextValueComputer`]s.

mod direction;
mod grounding;
mod open;
mod step_limit;

use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

pub use direction::DirectionCondition;
pub use grounding::{stop_at_grounding_terminals, GroundingTerminalCondition};
pub use open::{stop_at_open, OpenCondition};
pub use step_limit::{EquipmentStepLimitCondition, EquipmentTypeStepLimitCondition};

use super::context::{StepContext, StoredValue};
use super::path::{NetworkTraceStep, StepType};

/// Decides whether a candidate item is queued.
pub trait QueueCondition<I> {
    /// Called for each candidate produced by expanding `current_item`.
    fn should_queue(
        &self,
        next_item: &I,
        next_context: &StepContext,
        current_item: &I,
        current_context: &StepContext,
    ) -> bool;

    /// Called once per start item before the trace begins.
    fn should_queue_start_item(&self, _item: &I) -> bool {
        true
    }
}

impl<I, F> QueueCondition<I> for F
where
    F: Fn(&I, &StepContext, &I, &StepContext) -> bool,
{
    fn should_queue(&self, next_item: &I, next_context: &StepContext, current_item: &I, current_context: &StepContext) -> bool {
        self(next_item, next_context, current_item, current_context)
    }
}

/// Decides whether an item stops. Stopped items still run step actions but
/// are not expanded.
pub trait StopCondition<I> {
    /// Returns true to stop at `item`.
    fn should_stop(&self, item: &I, context: &StepContext) -> bool;
}

impl<I, F> StopCondition<I> for F
where
    F: Fn(&I, &StepContext) -> bool,
{
    fn should_stop(&self, item: &I, context: &StepContext) -> bool {
        self(item, context)
    }
}

/// Computes a value threaded along each traversal path.
///
/// The value of an item depends only on its path prefix: the start item gets
/// [`compute_initial_value`](Self::compute_initial_value) and each following
/// item derives its value from its predecessor's.
pub trait ContextValueComputer<I> {
    /// Value type. Equal values make items equivalent for visit tracking.
    type Value: Eq + Hash + fmt::Debug + 'static;

    /// Key the value is stored under. Must be unique within a trace.
    fn key(&self) -> &str;

    /// Value for a start item.
    fn compute_initial_value(&self, item: &I) -> Self::Value;

    /// Value for `next_item` reached from `current_item`.
    fn compute_next_value(&self, next_item: &I, current_item: &I, current_value: &Self::Value) -> Self::Value;
}

/// A stop condition driven by its own context value.
pub trait StopConditionWithContextValue<I>: ContextValueComputer<I> {
    /// Returns true to stop at `item` given its computed value.
    fn should_stop(&self, item: &I, context: &StepContext, value: &Self::Value) -> bool;
}

/// Object-safe view of a [`ContextValueComputer`].
pub(crate) trait ErasedComputer<I> {
    fn initial_value(&self, item: &I) -> StoredValue;
    fn next_value(&self, next_item: &I, current_item: &I, current: Option<&StoredValue>) -> StoredValue;
}

impl<I, C> ErasedComputer<I> for C
where
    C: ContextValueComputer<I>,
{
    fn initial_value(&self, item: &I) -> StoredValue {
        StoredValue::new(self.compute_initial_value(item))
    }

    fn next_value(&self, next_item: &I, current_item: &I, current: Option<&StoredValue>) -> StoredValue {
        match current.and_then(StoredValue::downcast::<C::Value>) {
            Some(value) => StoredValue::new(self.compute_next_value(next_item, current_item, value)),
            None => StoredValue::new(self.compute_initial_value(next_item)),
        }
    }
}

/// Stop-condition half of a registered [`StopConditionWithContextValue`].
pub(crate) struct ValueStop<C>(pub(crate) Rc<C>);

impl<I, C> StopCondition<I> for ValueStop<C>
where
    C: StopConditionWithContextValue<I>,
{
    fn should_stop(&self, item: &I, context: &StepContext) -> bool {
        context
            .value::<C::Value>(ContextValueComputer::key(&*self.0))
            .is_some_and(|value| StopConditionWithContextValue::should_stop(&*self.0, item, context, value))
    }
}

/// Restricts a queue condition to one step type.
///
/// Steps of other types are queued without consulting the inner condition.
/// Start items are always delegated.
#[derive(Debug, Clone)]
pub struct NetworkTraceQueueCondition<C> {
    step_type: StepType,
    inner: C,
}

impl<C> NetworkTraceQueueCondition<C> {
    /// Gates `inner` to `step_type`.
    pub fn new(step_type: StepType, inner: C) -> Self {
        Self { step_type, inner }
    }

    /// The gated step type.
    pub fn step_type(&self) -> StepType {
        self.step_type
    }
}

impl<T, C> QueueCondition<NetworkTraceStep<T>> for NetworkTraceQueueCondition<C>
where
    C: QueueCondition<NetworkTraceStep<T>>,
{
    fn should_queue(
        &self,
        next_item: &NetworkTraceStep<T>,
        next_context: &StepContext,
        current_item: &NetworkTraceStep<T>,
        current_context: &StepContext,
    ) -> bool {
        let applies = self.step_type == StepType::All || next_item.step_type() == self.step_type;
        !applies || self.inner.should_queue(next_item, next_context, current_item, current_context)
    }

    fn should_queue_start_item(&self, item: &NetworkTraceStep<T>) -> bool {
        self.inner.should_queue_start_item(item)
    }
}
