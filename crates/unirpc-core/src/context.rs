//! Identity-keyed, request-scoped context passing.
//!
//! A [`ContextKey`] is an opaque token created once at process startup.
//! Its identity - not a name - selects a slot in a per-request
//! [`ContextValues`] bag, which is how a hosting framework hands values to
//! RPC handlers without either side importing the other's types.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(0);

/// Opaque, type-parameterized handle selecting one slot in a
/// [`ContextValues`] bag.
///
/// Keys are compared by identity: no two calls to [`ContextKey::new`]
/// return equal keys, even for the same `T`. Create one per purpose at
/// startup and pass it explicitly wherever the slot is read or written.
pub struct ContextKey<T> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    /// Allocate a fresh, globally unique key.
    pub fn new() -> Self {
        Self {
            id: NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ContextKey<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

impl<T> PartialEq for ContextKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ContextKey<T> {}

impl<T> Hash for ContextKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextKey({})", self.id)
    }
}

/// Request-scoped association from key identity to value.
///
/// Built fresh for each incoming request, owned exclusively by that
/// request's task, and discarded when the request completes. Reads are
/// typed: a lookup only succeeds with the key the value was stored under.
#[derive(Default)]
pub struct ContextValues {
    values: HashMap<u64, Box<dyn Any + Send + Sync>>,
}

impl ContextValues {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Store a value, consuming and returning the bag.
    #[must_use]
    pub fn with<T: Send + Sync + 'static>(mut self, key: ContextKey<T>, value: T) -> Self {
        self.set(key, value);
        self
    }

    /// Store a value under the given key, replacing any previous one.
    pub fn set<T: Send + Sync + 'static>(&mut self, key: ContextKey<T>, value: T) {
        self.values.insert(key.id, Box::new(value));
    }

    /// Read the value stored under the given key, if any.
    pub fn get<T: Send + Sync + 'static>(&self, key: ContextKey<T>) -> Option<&T> {
        self.values.get(&key.id).and_then(|v| v.downcast_ref::<T>())
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for ContextValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextValues")
            .field("len", &self.values.len())
            .finish()
    }
}
