//! Generic condition-driven traversal.
//!
//! The engine knows nothing about networks. An [`ItemExpander`] produces the
//! successors of an item and the key used for visit tracking; queue and stop
//! conditions, context-value computers and step actions are plugged in by
//! the caller. A run is single-threaded and synchronous.

use std::collections::HashSet;
use std::hash::Hash;
use std::rc::Rc;

use serde::Serialize;

use crate::error::{TraceResult, ValidationError};

use super::actions::StepAction;
use super::conditions::{
    ContextValueComputer, ErasedComputer, QueueCondition, StopCondition, StopConditionWithContextValue, ValueStop,
};
use super::context::{ContextValues, StepContext};
use super::queue::{QueueStrategy, TraversalQueue};

/// Produces successors of an item.
pub trait ItemExpander<I> {
    /// Identity used, together with the context values, to detect revisits.
    type Key: Eq + Hash;

    /// Visit-tracking key for `item`.
    fn visit_key(&self, item: &I) -> Self::Key;

    /// Candidate successors of `item`.
    ///
    /// # Errors
    /// Any error aborts the run.
    fn next_items(&self, item: &I) -> TraceResult<Vec<I>>;
}

/// Counters describing a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraversalStats {
    /// Items taken off the queue.
    pub items_processed: usize,
    /// Items put on the queue, start items included.
    pub items_queued: usize,
    /// Items a stop condition matched.
    pub items_stopped: usize,
    /// Items step actions ran for.
    pub actions_applied: usize,
}

type Computer<'a, I> = (Rc<str>, Rc<dyn ErasedComputer<I> + 'a>);

/// A configurable traversal over items of type `I`.
pub struct Traversal<'a, I, E> {
    expander: E,
    strategy: QueueStrategy,
    queue_conditions: Vec<Box<dyn QueueCondition<I> + 'a>>,
    stop_conditions: Vec<Box<dyn StopCondition<I> + 'a>>,
    computers: Vec<Computer<'a, I>>,
    actions: Vec<Box<dyn StepAction<I> + 'a>>,
    actionable: Box<dyn Fn(&I, &StepContext) -> bool + 'a>,
    can_stop_on_start_item: bool,
}

impl<'a, I: 'a, E: ItemExpander<I>> Traversal<'a, I, E> {
    /// Creates a breadth-first traversal with no conditions.
    pub fn new(expander: E) -> Self {
        Self {
            expander,
            strategy: QueueStrategy::default(),
            queue_conditions: Vec::new(),
            stop_conditions: Vec::new(),
            computers: Vec::new(),
            actions: Vec::new(),
            actionable: Box::new(|_, _| true),
            can_stop_on_start_item: true,
        }
    }

    /// Sets the queue strategy.
    #[must_use]
    pub fn queue_strategy(mut self, strategy: QueueStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Adds a queue condition. All queue conditions must accept a candidate.
    #[must_use]
    pub fn add_queue_condition(mut self, condition: impl QueueCondition<I> + 'a) -> Self {
        self.queue_conditions.push(Box::new(condition));
        self
    }

    /// Adds a stop condition. Any matching stop condition stops an item.
    #[must_use]
    pub fn add_stop_condition(mut self, condition: impl StopCondition<I> + 'a) -> Self {
        self.stop_conditions.push(Box::new(condition));
        self
    }

    /// Adds a stop condition that is driven by its own context value.
    #[must_use]
    pub fn add_stop_condition_with_value<C>(mut self, condition: C) -> Self
    where
        C: StopConditionWithContextValue<I> + 'a,
    {
        let condition = Rc::new(condition);
        let key: Rc<str> = Rc::from(ContextValueComputer::key(&*condition));
        let computer: Rc<dyn ErasedComputer<I> + 'a> = condition.clone();
        self.computers.push((key, computer));
        self.stop_conditions.push(Box::new(ValueStop(condition)));
        self
    }

    /// Adds a context-value computer whose values conditions and actions can read.
    #[must_use]
    pub fn add_context_value_computer<C>(mut self, computer: C) -> Self
    where
        C: ContextValueComputer<I> + 'a,
    {
        let key: Rc<str> = Rc::from(computer.key());
        let computer: Rc<dyn ErasedComputer<I> + 'a> = Rc::new(computer);
        self.computers.push((key, computer));
        self
    }

    /// Adds a step action.
    #[must_use]
    pub fn add_step_action(mut self, action: impl StepAction<I> + 'a) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    /// Restricts which items run step actions.
    #[must_use]
    pub fn actionable_filter(mut self, filter: impl Fn(&I, &StepContext) -> bool + 'a) -> Self {
        self.actionable = Box::new(filter);
        self
    }

    /// When false, stop conditions are not consulted for start items.
    #[must_use]
    pub fn can_stop_on_start_item(mut self, can_stop: bool) -> Self {
        self.can_stop_on_start_item = can_stop;
        self
    }

    /// The expander.
    pub fn expander(&self) -> &E {
        &self.expander
    }

    /// Runs the traversal to completion from `start_items`.
    ///
    /// Every run starts from a clean visited set, so repeated runs over an
    /// unchanged graph process the same items.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] if two context values share a key, and
    /// propagates the first error from expansion or a step action.
    pub fn run(&mut self, start_items: impl IntoIterator<Item = I>) -> TraceResult<TraversalStats> {
        self.check_context_keys()?;

        let span = tracing::debug_span!(
            "traversal",
            strategy = ?self.strategy,
            queue_conditions = self.queue_conditions.len(),
            stop_conditions = self.stop_conditions.len(),
        );
        let _guard = span.enter();

        let mut queue = TraversalQueue::new(self.strategy);
        let mut visited = HashSet::new();
        let mut stats = TraversalStats::default();

        for item in start_items {
            if !self.queue_conditions.iter().all(|c| c.should_queue_start_item(&item)) {
                continue;
            }
            let context = StepContext::start(self.initial_values(&item));
            if visited.insert((self.expander.visit_key(&item), context.values.clone())) {
                stats.items_queued += 1;
                queue.push((item, context));
            }
        }

        while let Some((item, mut context)) = queue.pop() {
            stats.items_processed += 1;
            context.is_actionable_item = (self.actionable)(&item, &context);
            if !context.is_start_item || self.can_stop_on_start_item {
                context.is_stopping = self.stop_conditions.iter().any(|c| c.should_stop(&item, &context));
            }
            tracing::trace!(
                step = context.step_number,
                stopping = context.is_stopping,
                actionable = context.is_actionable_item,
                pending = queue.len(),
                "processing item"
            );

            if context.is_actionable_item && !self.actions.is_empty() {
                for action in &mut self.actions {
                    action.apply(&item, &context)?;
                }
                stats.actions_applied += 1;
            }

            if context.is_stopping {
                stats.items_stopped += 1;
                continue;
            }

            for next in self.expander.next_items(&item)? {
                let next_context = context.next(self.next_values(&next, &item, &context));
                let accepted = self
                    .queue_conditions
                    .iter()
                    .all(|c| c.should_queue(&next, &next_context, &item, &context));
                if accepted && visited.insert((self.expander.visit_key(&next), next_context.values.clone())) {
                    stats.items_queued += 1;
                    queue.push((next, next_context));
                }
            }
        }

        tracing::debug!(
            processed = stats.items_processed,
            queued = stats.items_queued,
            stopped = stats.items_stopped,
            actions = stats.actions_applied,
            "traversal complete"
        );
        Ok(stats)
    }

    fn check_context_keys(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for (key, _) in &self.computers {
            if !seen.insert(key.as_ref()) {
                return Err(ValidationError::DuplicateContextKey { key: key.to_string() });
            }
        }
        Ok(())
    }

    fn initial_values(&self, item: &I) -> ContextValues {
        let mut values = ContextValues::default();
        for (key, computer) in &self.computers {
            values.insert(key.clone(), computer.initial_value(item));
        }
        values
    }

    fn next_values(&self, next: &I, current: &I, current_context: &StepContext) -> ContextValues {
        let mut values = ContextValues::default();
        for (key, computer) in &self.computers {
            let value = computer.next_value(next, current, current_context.values.get(key));
            values.insert(key.clone(), value);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::TraceError;

    /// Integers 0..n arranged in a ring: i -> (i + 1) % n.
    struct Ring(u32);

    impl ItemExpander<u32> for Ring {
        type Key = u32;

        fn visit_key(&self, item: &u32) -> u32 {
            *item
        }

        fn next_items(&self, item: &u32) -> TraceResult<Vec<u32>> {
            Ok(vec![(item + 1) % self.0])
        }
    }

    struct Parity;

    impl ContextValueComputer<u32> for Parity {
        type Value = bool;

        fn key(&self) -> &str {
            "parity"
        }

        fn compute_initial_value(&self, _: &u32) -> bool {
            false
        }

        fn compute_next_value(&self, _: &u32, _: &u32, current: &bool) -> bool {
            !current
        }
    }

    #[test]
    fn terminates_on_cycles() {
        let seen = RefCell::new(Vec::new());
        let stats = Traversal::new(Ring(4))
            .add_step_action(|item: &u32, _: &StepContext| -> TraceResult<()> {
                seen.borrow_mut().push(*item);
                Ok(())
            })
            .run([0])
            .unwrap();
        assert_eq!(seen.into_inner(), vec![0, 1, 2, 3]);
        assert_eq!(stats.items_processed, 4);
        assert_eq!(stats.actions_applied, 4);
    }

    #[test]
    fn actions_applied_counts_only_when_actions_exist() {
        let stats = Traversal::new(Ring(4)).run([0_u32]).unwrap();
        assert_eq!(stats.items_processed, 4);
        assert_eq!(stats.actions_applied, 0);
    }

    #[test]
    fn context_values_extend_visit_key() {
        // An odd ring visited with a parity value reaches every item twice.
        let mut traversal = Traversal::new(Ring(3)).add_context_value_computer(Parity);
        let stats = traversal.run([0]).unwrap();
        assert_eq!(stats.items_processed, 6);
    }

    #[test]
    fn duplicate_keys_fail_before_running() {
        let err = Traversal::new(Ring(3))
            .add_context_value_computer(Parity)
            .add_context_value_computer(Parity)
            .run([0])
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn stop_conditions_prevent_expansion_but_not_actions() {
        let seen = RefCell::new(Vec::new());
        let stats = Traversal::new(Ring(10))
            .add_stop_condition(|item: &u32, _: &StepContext| *item == 2)
            .add_step_action(|item: &u32, ctx: &StepContext| -> TraceResult<()> {
                seen.borrow_mut().push((*item, ctx.is_stopping()));
                Ok(())
            })
            .run([0])
            .unwrap();
        assert_eq!(seen.into_inner(), vec![(0, false), (1, false), (2, true)]);
        assert_eq!(stats.items_stopped, 1);
    }

    #[test]
    fn start_items_can_be_exempt_from_stopping() {
        let stop_all = |_: &u32, _: &StepContext| true;
        let stats = Traversal::new(Ring(3)).add_stop_condition(stop_all).run([0]).unwrap();
        assert_eq!(stats.items_processed, 1);

        let stats = Traversal::new(Ring(3))
            .add_stop_condition(stop_all)
            .can_stop_on_start_item(false)
            .run([0])
            .unwrap();
        assert_eq!(stats.items_processed, 2);
    }

    #[test]
    fn queue_conditions_filter_candidates() {
        let below_two = |next: &u32, _: &StepContext, _: &u32, _: &StepContext| *next < 2;
        let stats = Traversal::new(Ring(5)).add_queue_condition(below_two).run([0, 3]).unwrap();
        assert_eq!(stats.items_processed, 3);
    }

    #[test]
    fn action_errors_abort_the_run() {
        let mut calls = 0;
        let result = Traversal::new(Ring(5))
            .add_step_action(|item: &u32, _: &StepContext| -> TraceResult<()> {
                calls += 1;
                if *item == 1 {
                    return Err(TraceError::step_action("boom"));
                }
                Ok(())
            })
            .run([0]);
        assert!(result.unwrap_err().is_execution());
        assert_eq!(calls, 2);
    }

    #[test]
    fn depth_first_follows_last_candidate() {
        struct Tree;
        impl ItemExpander<u32> for Tree {
            type Key = u32;
            fn visit_key(&self, item: &u32) -> u32 {
                *item
            }
            fn next_items(&self, item: &u32) -> TraceResult<Vec<u32>> {
                Ok(if *item < 4 { vec![item * 2 + 1, item * 2 + 2] } else { Vec::new() })
            }
        }

        let order = RefCell::new(Vec::new());
        Traversal::new(Tree)
            .queue_strategy(QueueStrategy::DepthFirst)
            .add_step_action(|item: &u32, _: &StepContext| -> TraceResult<()> {
                order.borrow_mut().push(*item);
                Ok(())
            })
            .run([0])
            .unwrap();
        assert_eq!(order.into_inner()[..3], [0, 2, 6]);
    }
}
