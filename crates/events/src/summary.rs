//! Serializable view of a handler map, for debugging tools.

use core::fmt::Debug;
use std::hash::Hash;

use serde::Serialize;

use crate::map::HandlerMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    /// `Debug` rendering of the event type. Distinct keys with the same
    /// rendering (e.g. newtypes over the same string) show up as separate
    /// entries with identical names.
    pub event_type: String,
    pub handlers: usize,
}

/// Handler counts per event type.
///
/// Types are sorted by their rendering; the map itself has no stable key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    pub event_types: Vec<TypeSummary>,
    /// `None` when nothing was ever subscribed to the wildcard slot.
    pub wildcard_handlers: Option<usize>,
}

impl RegistrySummary {
    pub fn of<K, E>(map: &HandlerMap<K, E>) -> Self
    where
        K: Eq + Hash + Debug,
    {
        let mut event_types: Vec<TypeSummary> = map
            .event_types()
            .map(|k| TypeSummary {
                event_type: format!("{k:?}"),
                handlers: map.handler_count(k),
            })
            .collect();
        event_types.sort_by(|a, b| a.event_type.cmp(&b.event_type));

        Self {
            event_types,
            wildcard_handlers: map.wildcard_handlers().map(<[_]>::len),
        }
    }

    pub fn total_handlers(&self) -> usize {
        self.event_types.iter().map(|t| t.handlers).sum::<usize>()
            + self.wildcard_handlers.unwrap_or(0)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
