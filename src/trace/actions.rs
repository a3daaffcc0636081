//! Step actions.

use serde::{Deserialize, Serialize};

use crate::error::TraceResult;

use super::context::StepContext;
use super::path::NetworkTraceStep;

/// Callback run for each actionable item, including stopped ones.
///
/// An error aborts the trace and is returned from `run` unchanged.
pub trait StepAction<I> {
    /// Runs the action.
    fn apply(&mut self, item: &I, context: &StepContext) -> TraceResult<()>;
}

impl<I, F> StepAction<I> for F
where
    F: FnMut(&I, &StepContext) -> TraceResult<()>,
{
    fn apply(&mut self, item: &I, context: &StepContext) -> TraceResult<()> {
        self(item, context)
    }
}

/// Which steps of a network trace run step actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkTraceActionType {
    /// Every processed step.
    #[default]
    AllSteps,
    /// Start items and steps arriving on new equipment.
    FirstStepOnEquipment,
}

impl NetworkTraceActionType {
    /// Returns true if actions run for `item`.
    #[must_use]
    pub fn is_actionable<T>(self, item: &NetworkTraceStep<T>, context: &StepContext) -> bool {
        match self {
            Self::AllSteps => true,
            Self::FirstStepOnEquipment => context.is_start_item() || item.path.traced_externally(),
        }
    }
}

/// Runs the inner action only for items that are not stopping.
#[derive(Debug, Clone)]
pub struct IfNotStopping<A>(A);

/// Runs the inner action only for stopping items.
#[derive(Debug, Clone)]
pub struct IfStopping<A>(A);

/// Wraps `action` so it skips stopping items.
pub fn if_not_stopping<A>(action: A) -> IfNotStopping<A> {
    IfNotStopping(action)
}

/// Wraps `action` so it only sees stopping items.
pub fn if_stopping<A>(action: A) -> IfStopping<A> {
    IfStopping(action)
}

impl<I, A: StepAction<I>> StepAction<I> for IfNotStopping<A> {
    fn apply(&mut self, item: &I, context: &StepContext) -> TraceResult<()> {
        if context.is_stopping() {
            return Ok(());
        }
        self.0.apply(item, context)
    }
}

impl<I, A: StepAction<I>> StepAction<I> for IfStopping<A> {
    fn apply(&mut self, item: &I, context: &StepContext) -> TraceResult<()> {
        if !context.is_stopping() {
            return Ok(());
        }
        self.0.apply(item, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrappers_filter_on_stopping() {
        let mut seen = Vec::new();
        {
            let mut action = if_stopping(|item: &u32, _: &StepContext| -> TraceResult<()> {
                seen.push(*item);
                Ok(())
            });
            let mut ctx = StepContext::default();
            action.apply(&1, &ctx).unwrap();
            ctx.is_stopping = true;
            action.apply(&2, &ctx).unwrap();
        }
        assert_eq!(seen, vec![2]);

        let mut count = 0;
        let mut action = if_not_stopping(|_: &u32, _: &StepContext| -> TraceResult<()> {
            count += 1;
            Ok(())
        });
        action.apply(&1, &StepContext::default()).unwrap();
        drop(action);
        assert_eq!(count, 1);
    }

    #[test]
    fn action_type_serializes_screaming() {
        let json = serde_json::to_string(&NetworkTraceActionType::FirstStepOnEquipment).unwrap();
        assert_eq!(json, "\"FIRST_STEP_ON_EQUIPMENT\"");
    }
}
