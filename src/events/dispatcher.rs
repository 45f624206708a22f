//! Typed, ordered event dispatch.
//!
//! An [`EventDispatcher`] keeps, for every event kind, the list of listeners
//! registered under it. Dispatch is synchronous and single-threaded: every
//! listener registered for the event's kind is called in registration order
//! before [`EventDispatcher::dispatch_event`] returns.
//!
//! Listeners return a [`ListenerResult`]. A failing listener is logged here and
//! counted in the returned [`Dispatched`]; the remaining listeners still run.
//!
//! # Re-entrancy
//!
//! The listener list for a kind is copied before any listener is called, and no
//! borrow is held while a listener runs. Listeners may therefore add or remove
//! listeners on the same dispatcher. Such changes take effect from the next
//! dispatch on.
//!
//! # Example
//!
//! ```ignore
//! let id = timer.add_event_listener(TimerEventKind::Timer, |event| {
//!     log::info!("tick #{}", event.timer.current_count());
//!     Ok(())
//! });
//! timer.remove_event_listener(TimerEventKind::Timer, id);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::Hash;
use std::ops::AddAssign;
use std::rc::Rc;

use log::error;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

/// Failure reported by a listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ListenerError {
    pub message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ListenerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for ListenerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Return type of every listener.
pub type ListenerResult = Result<(), ListenerError>;

/// An event that can be routed by an [`EventDispatcher`].
pub trait DispatchEvent {
    /// Key listeners are registered under.
    type Kind: Copy + Eq + Hash + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

/// Handle identifying one listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Delivery counts for one or more dispatches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatched {
    /// Listeners that returned `Ok`.
    pub delivered: usize,
    /// Listeners that returned `Err`.
    pub failed: usize,
}

impl Dispatched {
    /// `true` when no listener failed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl AddAssign for Dispatched {
    fn add_assign(&mut self, other: Self) {
        self.delivered += other.delivered;
        self.failed += other.failed;
    }
}

type Listener<E> = Rc<dyn Fn(&E) -> ListenerResult>;
type ListenerSlots<E> = SmallVec<[(ListenerId, Listener<E>); 2]>;

/// Registry of listeners keyed by event kind.
pub struct EventDispatcher<E: DispatchEvent> {
    listeners: RefCell<FxHashMap<E::Kind, ListenerSlots<E>>>,
    next_id: Cell<u64>,
}

impl<E: DispatchEvent> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(FxHashMap::default()),
            next_id: Cell::new(1),
        }
    }
}

impl<E: DispatchEvent> EventDispatcher<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `kind`. Listeners of one kind run in the order
    /// they were added.
    pub fn add_event_listener<F>(&self, kind: E::Kind, listener: F) -> ListenerId
    where
        F: Fn(&E) -> ListenerResult + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let listener: Listener<E> = Rc::new(listener);
        self.listeners
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, listener));
        id
    }

    /// Remove the registration `id` from `kind`. Returns `false` if it was not
    /// registered there.
    pub fn remove_event_listener(&self, kind: E::Kind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(slots) = listeners.get_mut(&kind) else {
            return false;
        };
        let Some(index) = slots.iter().position(|(slot_id, _)| *slot_id == id) else {
            return false;
        };
        slots.remove(index);
        if slots.is_empty() {
            listeners.remove(&kind);
        }
        true
    }

    pub fn has_event_listener(&self, kind: E::Kind) -> bool {
        self.listeners.borrow().contains_key(&kind)
    }

    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.listeners
            .borrow()
            .get(&kind)
            .map_or(0, |slots| slots.len())
    }

    /// Drop every registration of every kind.
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    /// Call every listener registered for `event.kind()`, in order.
    pub fn dispatch_event(&self, event: &E) -> Dispatched {
        let kind = event.kind();
        let snapshot: ListenerSlots<E> = match self.listeners.borrow().get(&kind) {
            Some(slots) => slots.clone(),
            None => return Dispatched::default(),
        };

        let mut dispatched = Dispatched::default();
        for (id, listener) in snapshot {
            match listener(event) {
                Ok(()) => dispatched.delivered += 1,
                Err(e) => {
                    error!("{} failed handling {:?}: {}", id, kind, e);
                    dispatched.failed += 1;
                }
            }
        }
        dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Ping,
        Pong,
    }

    struct Probe {
        kind: Kind,
        value: i32,
    }

    impl DispatchEvent for Probe {
        type Kind = Kind;
        fn kind(&self) -> Kind {
            self.kind
        }
    }

    fn ping(value: i32) -> Probe {
        Probe {
            kind: Kind::Ping,
            value,
        }
    }

    #[test]
    fn test_dispatch_without_listeners_is_empty() {
        let dispatcher = EventDispatcher::<Probe>::new();
        assert_eq!(dispatcher.dispatch_event(&ping(1)), Dispatched::default());
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let dispatcher = EventDispatcher::<Probe>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let log = log.clone();
            dispatcher.add_event_listener(Kind::Ping, move |e| {
                log.borrow_mut().push(format!("{}{}", tag, e.value));
                Ok(())
            });
        }
        let dispatched = dispatcher.dispatch_event(&ping(7));
        assert_eq!(dispatched.delivered, 3);
        assert_eq!(*log.borrow(), vec!["a7", "b7", "c7"]);
    }

    #[test]
    fn test_dispatch_only_reaches_matching_kind() {
        let dispatcher = EventDispatcher::<Probe>::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        dispatcher.add_event_listener(Kind::Pong, move |_| {
            h.set(h.get() + 1);
            Ok(())
        });
        dispatcher.dispatch_event(&ping(0));
        assert_eq!(hits.get(), 0);
        dispatcher.dispatch_event(&Probe {
            kind: Kind::Pong,
            value: 0,
        });
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_failing_listener_does_not_stop_the_rest() {
        let dispatcher = EventDispatcher::<Probe>::new();
        let hits = Rc::new(Cell::new(0));
        dispatcher.add_event_listener(Kind::Ping, |_| Err("boom".into()));
        let h = hits.clone();
        dispatcher.add_event_listener(Kind::Ping, move |_| {
            h.set(h.get() + 1);
            Ok(())
        });
        let dispatched = dispatcher.dispatch_event(&ping(0));
        assert_eq!(dispatched, Dispatched { delivered: 1, failed: 1 });
        assert!(!dispatched.is_clean());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_remove_listener() {
        let dispatcher = EventDispatcher::<Probe>::new();
        let first = dispatcher.add_event_listener(Kind::Ping, |_| Ok(()));
        let second = dispatcher.add_event_listener(Kind::Ping, |_| Ok(()));
        assert_eq!(dispatcher.listener_count(Kind::Ping), 2);

        assert!(dispatcher.remove_event_listener(Kind::Ping, first));
        assert!(!dispatcher.remove_event_listener(Kind::Ping, first));
        assert!(!dispatcher.remove_event_listener(Kind::Pong, second));
        assert_eq!(dispatcher.listener_count(Kind::Ping), 1);

        assert!(dispatcher.remove_event_listener(Kind::Ping, second));
        assert!(!dispatcher.has_event_listener(Kind::Ping));
    }

    #[test]
    fn test_listener_removed_during_dispatch_still_sees_current_event() {
        let dispatcher = Rc::new(EventDispatcher::<Probe>::new());
        let hits = Rc::new(Cell::new(0));
        let victim_slot = Rc::new(Cell::new(None));

        let d = dispatcher.clone();
        let slot = victim_slot.clone();
        dispatcher.add_event_listener(Kind::Ping, move |_| {
            if let Some(id) = slot.get() {
                d.remove_event_listener(Kind::Ping, id);
            }
            Ok(())
        });
        let h = hits.clone();
        let victim = dispatcher.add_event_listener(Kind::Ping, move |_| {
            h.set(h.get() + 1);
            Ok(())
        });
        victim_slot.set(Some(victim));

        dispatcher.dispatch_event(&ping(0));
        assert_eq!(hits.get(), 1);
        dispatcher.dispatch_event(&ping(0));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_listener_added_during_dispatch_waits_for_next_dispatch() {
        let dispatcher = Rc::new(EventDispatcher::<Probe>::new());
        let hits = Rc::new(Cell::new(0));
        let d = dispatcher.clone();
        let h = hits.clone();
        dispatcher.add_event_listener(Kind::Ping, move |_| {
            let h = h.clone();
            d.add_event_listener(Kind::Pong, move |_| {
                h.set(h.get() + 1);
                Ok(())
            });
            Ok(())
        });
        dispatcher.dispatch_event(&ping(0));
        assert_eq!(dispatcher.listener_count(Kind::Pong), 1);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_dispatched_accumulates() {
        let mut total = Dispatched::default();
        total += Dispatched { delivered: 2, failed: 0 };
        total += Dispatched { delivered: 1, failed: 3 };
        assert_eq!(total, Dispatched { delivered: 3, failed: 3 });
    }

    #[test]
    fn test_clear_drops_all_kinds() {
        let dispatcher = EventDispatcher::<Probe>::new();
        dispatcher.add_event_listener(Kind::Ping, |_| Ok(()));
        dispatcher.add_event_listener(Kind::Pong, |_| Ok(()));
        dispatcher.clear();
        assert!(!dispatcher.has_event_listener(Kind::Ping));
        assert!(!dispatcher.has_event_listener(Kind::Pong));
    }
}
