//! Per-path context values.
//!
//! Each queued item carries a [`StepContext`]. Its values are produced by
//! context-value computers from the path prefix alone, so two items reaching
//! the same terminal with equal values are equivalent for the rest of the
//! trace.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A value that can be stored in a [`StepContext`].
///
/// Implemented for every `'static` type that is `Eq + Hash + Debug`.
pub trait ContextValue: Any + fmt::Debug {
    /// Upcast for downcasting.
    fn as_any(&self) -> &dyn Any;
    /// Equality across erased values. Values of different types are unequal.
    fn dyn_eq(&self, other: &dyn ContextValue) -> bool;
    /// Hashes the value together with its type.
    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<V> ContextValue for V
where
    V: Any + Eq + Hash + fmt::Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn ContextValue) -> bool {
        other.as_any().downcast_ref::<V>() == Some(self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<V>().hash(&mut state);
        self.hash(&mut state);
    }
}

/// Type-erased, shared context value.
#[derive(Clone)]
pub struct StoredValue(Rc<dyn ContextValue>);

impl StoredValue {
    /// Wraps a value.
    pub fn new<V: ContextValue>(value: V) -> Self {
        Self(Rc::new(value))
    }

    /// Borrows the value if it has type `V`.
    #[must_use]
    pub fn downcast<V: 'static>(&self) -> Option<&V> {
        self.0.as_any().downcast_ref::<V>()
    }
}

impl PartialEq for StoredValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(&*other.0)
    }
}

impl Eq for StoredValue {}

impl Hash for StoredValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.dyn_hash(state);
    }
}

impl fmt::Debug for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Context values keyed by computer key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContextValues(BTreeMap<Rc<str>, StoredValue>);

impl ContextValues {
    /// Looks up a raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StoredValue> {
        self.0.get(key)
    }

    /// Stores a value under `key`.
    pub fn insert(&mut self, key: Rc<str>, value: StoredValue) {
        self.0.insert(key, value);
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// State the engine tracks for one queued item.
#[derive(Debug, Clone, Default)]
pub struct StepContext {
    pub(crate) is_start_item: bool,
    pub(crate) step_number: usize,
    pub(crate) is_stopping: bool,
    pub(crate) is_actionable_item: bool,
    pub(crate) values: ContextValues,
}

impl StepContext {
    pub(crate) fn start(values: ContextValues) -> Self {
        Self {
            is_start_item: true,
            values,
            ..Self::default()
        }
    }

    pub(crate) fn next(&self, values: ContextValues) -> Self {
        Self {
            step_number: self.step_number + 1,
            values,
            ..Self::default()
        }
    }

    /// True for items passed to `run`.
    #[must_use]
    pub fn is_start_item(&self) -> bool {
        self.is_start_item
    }

    /// Steps since the start item.
    #[must_use]
    pub fn step_number(&self) -> usize {
        self.step_number
    }

    /// True once a stop condition has matched this item.
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        self.is_stopping
    }

    /// True if step actions run for this item.
    #[must_use]
    pub fn is_actionable_item(&self) -> bool {
        self.is_actionable_item
    }

    /// Every stored value.
    #[must_use]
    pub fn values(&self) -> &ContextValues {
        &self.values
    }

    /// Typed value lookup. `None` if the key is unknown or has another type.
    #[must_use]
    pub fn value<V: 'static>(&self, key: &str) -> Option<&V> {
        self.values.get(key).and_then(StoredValue::downcast)
    }
}
