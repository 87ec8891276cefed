/// A payload that knows which event type it belongs to.
///
/// Implement this on a payload enum to tie each variant to its key at compile
/// time, then publish with `Registry::publish_event`.
pub trait Event: core::fmt::Debug + Send + Sync + 'static {
    type Key;

    /// Event type identifier this payload is published under.
    fn event_type(&self) -> Self::Key;
}
