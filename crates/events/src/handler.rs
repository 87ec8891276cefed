//! Handler types stored in the registry.
//!
//! Closures have no equality in Rust, so handlers are shared allocations
//! (`Arc<dyn Fn ...>`) and two handlers are equal when they point at the same
//! allocation. Clone a handler to keep a key for `unsubscribe`.

use std::sync::Arc;

type HandlerFn<E> = Arc<dyn Fn(&E) + Send + Sync>;
type WildcardFn<K, E> = Arc<dyn Fn(&K, &E) + Send + Sync>;

/// A handler for one concrete event type.
pub struct Handler<E> {
    f: HandlerFn<E>,
}

impl<E> Handler<E> {
    pub fn new(f: impl Fn(&E) + Send + Sync + 'static) -> Self {
        Self { f: Arc::new(f) }
    }

    /// Invoke the handler with a payload.
    pub fn call(&self, payload: &E) {
        (self.f)(payload)
    }

    /// Identity comparison (same underlying allocation).
    pub fn same_as(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Arc::as_ptr(&self.f), Arc::as_ptr(&other.f))
    }
}

impl<E> Clone for Handler<E> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

impl<E> PartialEq for Handler<E> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl<E> Eq for Handler<E> {}

impl<E> core::fmt::Debug for Handler<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Handler")
            .field(&Arc::as_ptr(&self.f).cast::<()>())
            .finish()
    }
}

/// A handler that receives every published event together with its type.
pub struct WildcardHandler<K, E> {
    f: WildcardFn<K, E>,
}

impl<K, E> WildcardHandler<K, E> {
    pub fn new(f: impl Fn(&K, &E) + Send + Sync + 'static) -> Self {
        Self { f: Arc::new(f) }
    }

    pub fn call(&self, event_type: &K, payload: &E) {
        (self.f)(event_type, payload)
    }

    pub fn same_as(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Arc::as_ptr(&self.f), Arc::as_ptr(&other.f))
    }
}

impl<K, E> Clone for WildcardHandler<K, E> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

impl<K, E> PartialEq for WildcardHandler<K, E> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl<K, E> Eq for WildcardHandler<K, E> {}

impl<K, E> core::fmt::Debug for WildcardHandler<K, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("WildcardHandler")
            .field(&Arc::as_ptr(&self.f).cast::<()>())
            .finish()
    }
}
