//! In-process publish/subscribe registry.
//!
//! - No IO / no async
//! - Delivery is synchronous, on the publisher's thread, in registration order
//! - Typed handlers run before wildcard handlers
//! - Each handler list is snapshotted right before its handlers run, so a
//!   handler may subscribe/unsubscribe re-entrantly without changing who else
//!   is called from that list in the same publish
//! - A panicking handler aborts the rest of that publish (no isolation)
//!
//! The map lock is only held while a list is copied or mutated, never while a
//! handler runs.
//!
//! `subscribe` and `publish` take the event type by value (it is stored in the
//! map or handed to wildcard handlers); `unsubscribe` only looks it up and
//! takes `&K`.
//!
//! The typed list is copied before the typed handlers run; the wildcard list is
//! copied after they finish. A typed handler that adds or removes a wildcard
//! handler therefore changes the wildcard handlers of the same publish.

use core::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::config::{MissingHandlerPolicy, RegistryConfig};
use crate::event::Event;
use crate::handler::{Handler, WildcardHandler};
use crate::map::{self, HandlerMap, SharedHandlerMap};
use crate::summary::RegistrySummary;

/// Outcome of an `unsubscribe` call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Unsubscribed {
    /// The event type was never registered; nothing changed.
    UnknownType,
    /// The whole list was emptied (holding this many handlers before).
    Cleared(usize),
    /// The first matching handler was removed.
    Removed,
    /// The handler was absent and nothing changed.
    NotFound,
    /// The handler was absent and the first handler was removed instead
    /// (`MissingHandlerPolicy::RemoveFirst`).
    RemovedFirstInstead,
}

/// Publish/subscribe registry over a (possibly shared) handler map.
pub struct Registry<K, E> {
    all: SharedHandlerMap<K, E>,
    config: RegistryConfig,
}

impl<K, E> Clone for Registry<K, E> {
    fn clone(&self) -> Self {
        Self {
            all: Arc::clone(&self.all),
            config: self.config,
        }
    }
}

impl<K, E> Debug for Registry<K, E>
where
    K: Eq + Hash + Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let all = map::read(&self.all);
        f.debug_struct("Registry")
            .field("event_types", &all.event_types().collect::<Vec<_>>())
            .field("wildcard", &all.has_wildcard())
            .field("config", &self.config)
            .finish()
    }
}

impl<K, E> Default for Registry<K, E>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> Registry<K, E>
where
    K: Eq + Hash,
{
    /// Empty registry with default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            all: HandlerMap::new().into_shared(),
            config,
        }
    }

    /// Registry viewing a caller-owned map; every registry built from the same
    /// handle sees the same handlers.
    pub fn with_map(all: SharedHandlerMap<K, E>) -> Self {
        Self::builder().map(all).build()
    }

    pub fn builder() -> RegistryBuilder<K, E> {
        RegistryBuilder::default()
    }

    /// The backing map handle.
    pub fn all(&self) -> &SharedHandlerMap<K, E> {
        &self.all
    }

    pub fn config(&self) -> RegistryConfig {
        self.config
    }
}

impl<K, E> Registry<K, E>
where
    K: Eq + Hash + Debug,
{
    /// Append `handler` to the list for `event_type`. Duplicates are kept.
    pub fn subscribe(&self, event_type: K, handler: Handler<E>) {
        let mut all = map::write(&self.all);
        tracing::debug!(event_type = ?event_type, "subscribe");
        let handlers = all.push(event_type, handler);
        tracing::trace!(handlers, "handler appended");
    }

    /// Append a handler that receives every published event.
    pub fn subscribe_wildcard(&self, handler: WildcardHandler<K, E>) {
        let handlers = map::write(&self.all).push_wildcard(handler);
        tracing::debug!(handlers, "subscribe wildcard");
    }

    /// Wrap `f` into a handler, subscribe it, and return it for later removal.
    pub fn on(&self, event_type: K, f: impl Fn(&E) + Send + Sync + 'static) -> Handler<E> {
        let handler = Handler::new(f);
        self.subscribe(event_type, handler.clone());
        handler
    }

    pub fn on_any(&self, f: impl Fn(&K, &E) + Send + Sync + 'static) -> WildcardHandler<K, E> {
        let handler = WildcardHandler::new(f);
        self.subscribe_wildcard(handler.clone());
        handler
    }

    /// Remove one occurrence of `handler`, or clear the list when `handler` is `None`.
    ///
    /// A cleared type stays registered with an empty list.
    pub fn unsubscribe(&self, event_type: &K, handler: Option<&Handler<E>>) -> Unsubscribed {
        let policy = self.config.missing_handler;
        let mut all = map::write(&self.all);
        let outcome = match all.list_mut(event_type) {
            None => Unsubscribed::UnknownType,
            Some(list) => match handler {
                None => Unsubscribed::Cleared(core::mem::take(list).len()),
                Some(h) => remove_one(list, |x| x.same_as(h), policy),
            },
        };
        drop(all);

        log_unsubscribe(event_type, outcome);
        outcome
    }

    pub fn unsubscribe_wildcard(&self, handler: Option<&WildcardHandler<K, E>>) -> Unsubscribed {
        let policy = self.config.missing_handler;
        let mut all = map::write(&self.all);
        let outcome = match all.wildcard_mut() {
            None => Unsubscribed::UnknownType,
            Some(list) => match handler {
                None => Unsubscribed::Cleared(core::mem::take(list).len()),
                Some(h) => remove_one(list, |x| x.same_as(h), policy),
            },
        };
        drop(all);

        log_unsubscribe_wildcard(outcome);
        outcome
    }

    /// Invoke every handler of `event_type`, then every wildcard handler.
    pub fn publish(&self, event_type: K, payload: E) {
        let handlers = map::read(&self.all).snapshot(&event_type);
        tracing::trace!(event_type = ?event_type, handlers = handlers.len(), "publish");
        for handler in &handlers {
            handler.call(&payload);
        }

        let wildcard = map::read(&self.all).wildcard_snapshot();
        if !wildcard.is_empty() {
            tracing::trace!(event_type = ?event_type, handlers = wildcard.len(), "publish wildcard");
        }
        for handler in &wildcard {
            handler.call(&event_type, &payload);
        }
    }

    /// Publish an event with no payload (`E::default()`).
    pub fn publish_none(&self, event_type: K)
    where
        E: Default,
    {
        self.publish(event_type, E::default());
    }

    /// Publish a payload under the type it declares.
    pub fn publish_event(&self, event: E)
    where
        E: Event<Key = K>,
    {
        self.publish(event.event_type(), event);
    }

    /// Serializable overview of the current map.
    pub fn summary(&self) -> RegistrySummary {
        RegistrySummary::of(&map::read(&self.all))
    }
}

fn remove_one<T>(
    list: &mut Vec<T>,
    matches: impl Fn(&T) -> bool,
    policy: MissingHandlerPolicy,
) -> Unsubscribed {
    match list.iter().position(matches) {
        Some(idx) => {
            list.remove(idx);
            Unsubscribed::Removed
        }
        None => match policy {
            MissingHandlerPolicy::Ignore => Unsubscribed::NotFound,
            MissingHandlerPolicy::RemoveFirst if list.is_empty() => Unsubscribed::NotFound,
            MissingHandlerPolicy::RemoveFirst => {
                list.remove(0);
                Unsubscribed::RemovedFirstInstead
            }
        },
    }
}

fn log_unsubscribe<K: Debug>(event_type: &K, outcome: Unsubscribed) {
    match outcome {
        Unsubscribed::RemovedFirstInstead => tracing::warn!(
            event_type = ?event_type,
            "handler not found; removed first handler instead"
        ),
        outcome => tracing::debug!(event_type = ?event_type, ?outcome, "unsubscribe"),
    }
}

fn log_unsubscribe_wildcard(outcome: Unsubscribed) {
    match outcome {
        Unsubscribed::RemovedFirstInstead => {
            tracing::warn!("wildcard handler not found; removed first wildcard handler instead")
        }
        outcome => tracing::debug!(?outcome, "unsubscribe wildcard"),
    }
}

/// Builder for [`Registry`].
#[derive(Debug)]
pub struct RegistryBuilder<K, E> {
    map: Option<SharedHandlerMap<K, E>>,
    config: RegistryConfig,
}

impl<K, E> Default for RegistryBuilder<K, E> {
    fn default() -> Self {
        Self {
            map: None,
            config: RegistryConfig::default(),
        }
    }
}

impl<K, E> RegistryBuilder<K, E>
where
    K: Eq + Hash,
{
    /// Use a caller-owned map instead of a fresh one.
    pub fn map(mut self, map: SharedHandlerMap<K, E>) -> Self {
        self.map = Some(map);
        self
    }

    pub fn config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn missing_handler(mut self, policy: MissingHandlerPolicy) -> Self {
        self.config.missing_handler = policy;
        self
    }

    pub fn build(self) -> Registry<K, E> {
        Registry {
            all: self.map.unwrap_or_else(|| HandlerMap::new().into_shared()),
            config: self.config,
        }
    }
}
