//! The handler map backing a registry.
//!
//! Typed handlers and wildcard handlers live in separate structures so the
//! wildcard slot can never collide with an application event type.
//!
//! A key is present iff something was ever subscribed (or seeded) under it.
//! Clearing a key leaves an empty list in place.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::handler::{Handler, WildcardHandler};

/// Event type -> ordered handler list, plus the wildcard list.
#[derive(Debug)]
pub struct HandlerMap<K, E> {
    by_type: HashMap<K, Vec<Handler<E>>>,
    wildcard: Option<Vec<WildcardHandler<K, E>>>,
}

impl<K, E> Default for HandlerMap<K, E> {
    fn default() -> Self {
        Self {
            by_type: HashMap::new(),
            wildcard: None,
        }
    }
}

impl<K, E> HandlerMap<K, E>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap this map into a shareable handle.
    pub fn into_shared(self) -> SharedHandlerMap<K, E> {
        Arc::new(RwLock::new(self))
    }

    /// Registered event types (unspecified order).
    pub fn event_types(&self) -> impl Iterator<Item = &K> {
        self.by_type.keys()
    }

    pub fn handlers(&self, event_type: &K) -> Option<&[Handler<E>]> {
        self.by_type.get(event_type).map(Vec::as_slice)
    }

    pub fn wildcard_handlers(&self) -> Option<&[WildcardHandler<K, E>]> {
        self.wildcard.as_deref()
    }

    pub fn contains(&self, event_type: &K) -> bool {
        self.by_type.contains_key(event_type)
    }

    pub fn has_wildcard(&self) -> bool {
        self.wildcard.is_some()
    }

    /// Number of handlers for `event_type` (0 when absent or cleared).
    pub fn handler_count(&self, event_type: &K) -> usize {
        self.by_type.get(event_type).map_or(0, Vec::len)
    }

    /// Number of event types present; the wildcard slot is not an event type.
    pub fn type_count(&self) -> usize {
        self.by_type.len()
    }

    /// True when neither an event type nor the wildcard slot is present.
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty() && self.wildcard.is_none()
    }

    /// Replace the whole list for `event_type`, returning the previous one.
    pub fn insert(&mut self, event_type: K, handlers: Vec<Handler<E>>) -> Option<Vec<Handler<E>>> {
        self.by_type.insert(event_type, handlers)
    }

    /// Append a handler, creating the list if absent.
    pub fn push(&mut self, event_type: K, handler: Handler<E>) -> usize {
        let list = self.by_type.entry(event_type).or_default();
        list.push(handler);
        list.len()
    }

    pub fn push_wildcard(&mut self, handler: WildcardHandler<K, E>) -> usize {
        let list = self.wildcard.get_or_insert_with(Vec::new);
        list.push(handler);
        list.len()
    }

    pub(crate) fn list_mut(&mut self, event_type: &K) -> Option<&mut Vec<Handler<E>>> {
        self.by_type.get_mut(event_type)
    }

    pub(crate) fn wildcard_mut(&mut self) -> Option<&mut Vec<WildcardHandler<K, E>>> {
        self.wildcard.as_mut()
    }

    /// Shallow copy of the list for `event_type`.
    pub(crate) fn snapshot(&self, event_type: &K) -> Vec<Handler<E>> {
        self.by_type.get(event_type).cloned().unwrap_or_default()
    }

    pub(crate) fn wildcard_snapshot(&self) -> Vec<WildcardHandler<K, E>> {
        self.wildcard.clone().unwrap_or_default()
    }
}

/// Shared ownership of a handler map; several registries may view the same one.
pub type SharedHandlerMap<K, E> = Arc<RwLock<HandlerMap<K, E>>>;

/// Read-lock a shared map.
///
/// Handlers never run under this lock, so a poisoned lock still holds a
/// consistent map and is recovered.
pub fn read<K, E>(map: &SharedHandlerMap<K, E>) -> RwLockReadGuard<'_, HandlerMap<K, E>> {
    map.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write-lock a shared map (see [`read`]).
pub fn write<K, E>(map: &SharedHandlerMap<K, E>) -> RwLockWriteGuard<'_, HandlerMap<K, E>> {
    map.write().unwrap_or_else(PoisonError::into_inner)
}
