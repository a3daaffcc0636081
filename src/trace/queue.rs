//! Worklist used by the traversal.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Order in which queued items are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStrategy {
    /// FIFO.
    #[default]
    BreadthFirst,
    /// LIFO.
    DepthFirst,
}

/// FIFO or LIFO queue of pending items.
#[derive(Debug)]
pub struct TraversalQueue<T> {
    strategy: QueueStrategy,
    items: VecDeque<T>,
}

impl<T> TraversalQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new(strategy: QueueStrategy) -> Self {
        Self {
            strategy,
            items: VecDeque::new(),
        }
    }

    /// Adds an item.
    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Takes the next item according to the strategy.
    pub fn pop(&mut self) -> Option<T> {
        match self.strategy {
            QueueStrategy::BreadthFirst => self.items.pop_front(),
            QueueStrategy::DepthFirst => self.items.pop_back(),
        }
    }

    /// Number of pending items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategies_pop_in_order() {
        let mut fifo = TraversalQueue::new(QueueStrategy::BreadthFirst);
        let mut lifo = TraversalQueue::new(QueueStrategy::DepthFirst);
        for i in 0..3 {
            fifo.push(i);
            lifo.push(i);
        }
        assert_eq!(fifo.len(), 3);
        assert_eq!(std::iter::from_fn(|| fifo.pop()).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(std::iter::from_fn(|| lifo.pop()).collect::<Vec<_>>(), vec![2, 1, 0]);
        assert!(fifo.is_empty());
    }
}
