use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A notification delivered synchronously to registered listeners,
/// carrying the emitting object's name and the event name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub source: String,
    pub name: String,
}

type Listener = Box<dyn FnMut(&Notification)>;

/// Listener registry keyed by event name.
///
/// Delivery is synchronous and in subscription order; there is no queue
/// and no replay — a listener only sees events emitted after it
/// subscribed.
#[derive(Default)]
pub struct EventHub {
    listeners: BTreeMap<String, Vec<Listener>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to an event by name.
    pub fn on(&mut self, name: &str, listener: impl FnMut(&Notification) + 'static) {
        self.listeners
            .entry(name.to_string())
            .or_default()
            .push(Box::new(listener));
    }

    /// Deliver an event to every listener registered for `name`.
    pub fn emit(&mut self, source: &str, name: &str) {
        let notification = Notification {
            source: source.to_string(),
            name: name.to_string(),
        };
        if let Some(listeners) = self.listeners.get_mut(name) {
            for listener in listeners.iter_mut() {
                listener(&notification);
            }
        }
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(name, listeners)| (name.as_str(), listeners.len()))
            .collect();
        f.debug_struct("EventHub").field("listeners", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn emit_reaches_only_matching_listeners() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut hub = EventHub::new();

        let log = seen.clone();
        hub.on("save", move |n| log.borrow_mut().push(n.clone()));
        let log = seen.clone();
        hub.on("load", move |n| log.borrow_mut().push(n.clone()));

        hub.emit("panel", "save");

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            Notification {
                source: "panel".to_string(),
                name: "save".to_string(),
            }
        );
    }

    #[test]
    fn listeners_fire_in_subscription_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut hub = EventHub::new();
        for tag in ["first", "second", "third"] {
            let order = order.clone();
            hub.on("clear", move |_| order.borrow_mut().push(tag));
        }
        hub.emit("panel", "clear");
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn emit_without_listeners_is_a_noop() {
        let mut hub = EventHub::new();
        hub.emit("engine", "before_tick");
        assert_eq!(hub.listener_count("before_tick"), 0);
    }
}
