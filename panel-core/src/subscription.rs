//! Label-keyed listeners for output drivers.
//!
//! Each event kind has its own fixed-capacity list. Every listener whose
//! label matches fires, in registration order.

use heapless::Vec;

/// Listener capacity per event kind.
pub const MAX_SUBSCRIPTIONS: usize = 32;

/// Selector change as seen by listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectorChange<'s> {
    pub label: &'s str,
    pub value: u16,
    /// Position label for the value, if the tables name one.
    pub position: Option<&'s str>,
}

/// A callback for one event kind.
#[derive(Clone, Copy)]
pub enum Listener<'a> {
    /// LED, analog or gauge output: `(label, value, max_value)`.
    Led(&'a dyn Fn(&str, u16, u16)),
    Selector(&'a dyn Fn(&SelectorChange<'_>)),
    Metadata(&'a dyn Fn(&str, u16)),
    /// Display text: `(label, text)`.
    Display(&'a dyn Fn(&str, &str)),
}

impl core::fmt::Debug for Listener<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Led(_) => write!(f, "Listener::Led"),
            Self::Selector(_) => write!(f, "Listener::Selector"),
            Self::Metadata(_) => write!(f, "Listener::Metadata"),
            Self::Display(_) => write!(f, "Listener::Display"),
        }
    }
}

/// Per-kind subscription lists.
#[derive(Default)]
pub struct SubscriptionRegistry<'a> {
    led: Vec<(&'a str, &'a dyn Fn(&str, u16, u16)), MAX_SUBSCRIPTIONS>,
    selector: Vec<(&'a str, &'a dyn Fn(&SelectorChange<'_>)), MAX_SUBSCRIPTIONS>,
    metadata: Vec<(&'a str, &'a dyn Fn(&str, u16)), MAX_SUBSCRIPTIONS>,
    display: Vec<(&'a str, &'a dyn Fn(&str, &str)), MAX_SUBSCRIPTIONS>,
}

impl<'a> SubscriptionRegistry<'a> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            led: Vec::new(),
            selector: Vec::new(),
            metadata: Vec::new(),
            display: Vec::new(),
        }
    }

    /// Register `listener` for `label`.
    ///
    /// Returns `false` when that kind's list is full; treat it as a boot-time
    /// misconfiguration.
    pub fn subscribe(&mut self, label: &'a str, listener: Listener<'a>) -> bool {
        let ok = match listener {
            Listener::Led(f) => self.led.push((label, f)).is_ok(),
            Listener::Selector(f) => self.selector.push((label, f)).is_ok(),
            Listener::Metadata(f) => self.metadata.push((label, f)).is_ok(),
            Listener::Display(f) => self.display.push((label, f)).is_ok(),
        };
        if !ok {
            log::error!("subscription table full, {:?} for {} not registered", listener, label);
        }
        ok
    }

    pub fn notify_led(&self, label: &str, value: u16, max_value: u16) {
        for (_, f) in self.led.iter().filter(|(l, _)| *l == label) {
            f(label, value, max_value);
        }
    }

    pub fn notify_selector(&self, change: &SelectorChange<'_>) {
        for (_, f) in self.selector.iter().filter(|(l, _)| *l == change.label) {
            f(change);
        }
    }

    pub fn notify_metadata(&self, label: &str, value: u16) {
        for (_, f) in self.metadata.iter().filter(|(l, _)| *l == label) {
            f(label, value);
        }
    }

    pub fn notify_display(&self, label: &str, text: &str) {
        for (_, f) in self.display.iter().filter(|(l, _)| *l == label) {
            f(label, text);
        }
    }

    /// Total registered listeners across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.led.len() + self.selector.len() + self.metadata.len() + self.display.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::cell::RefCell;
    use std::string::String;
    use std::vec::Vec;

    #[test]
    fn test_all_listeners_fire_in_order() {
        let log: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let first = |label: &str, value: u16, _max: u16| {
            log.borrow_mut().push(std::format!("first {} {}", label, value));
        };
        let second = |label: &str, value: u16, _max: u16| {
            log.borrow_mut().push(std::format!("second {} {}", label, value));
        };
        let other = |_: &str, _: u16, _: u16| log.borrow_mut().push(String::from("other"));

        let mut registry = SubscriptionRegistry::new();
        assert!(registry.subscribe("APU_READY_LT", Listener::Led(&first)));
        assert!(registry.subscribe("MASTER_CAUTION_LT", Listener::Led(&other)));
        assert!(registry.subscribe("APU_READY_LT", Listener::Led(&second)));

        registry.notify_led("APU_READY_LT", 1, 1);
        assert_eq!(*log.borrow(), ["first APU_READY_LT 1", "second APU_READY_LT 1"]);
    }

    #[test]
    fn test_kinds_are_independent() {
        let hits = RefCell::new(0);
        let on_meta = |_: &str, _: u16| *hits.borrow_mut() += 1;
        let mut registry = SubscriptionRegistry::new();
        registry.subscribe("_UPDATE_COUNTER", Listener::Metadata(&on_meta));

        registry.notify_led("_UPDATE_COUNTER", 1, 1);
        registry.notify_display("_UPDATE_COUNTER", "x");
        assert_eq!(*hits.borrow(), 0);
        registry.notify_metadata("_UPDATE_COUNTER", 3);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_selector_change_carries_position() {
        let seen = RefCell::new(None);
        let on_sel = |c: &SelectorChange<'_>| *seen.borrow_mut() = c.position.map(String::from);
        let mut registry = SubscriptionRegistry::new();
        registry.subscribe("ECM_MODE_SW", Listener::Selector(&on_sel));
        registry.notify_selector(&SelectorChange {
            label: "ECM_MODE_SW",
            value: 2,
            position: Some("ECM_MODE_SW_BIT"),
        });
        assert_eq!(seen.borrow().as_deref(), Some("ECM_MODE_SW_BIT"));
    }

    #[test]
    fn test_capacity_exhausted() {
        let noop = |_: &str, _: &str| {};
        let led = |_: &str, _: u16, _: u16| {};
        let mut registry = SubscriptionRegistry::new();
        for _ in 0..MAX_SUBSCRIPTIONS {
            assert!(registry.subscribe("UFC_SCRATCHPAD", Listener::Display(&noop)));
        }
        assert!(!registry.subscribe("UFC_SCRATCHPAD", Listener::Display(&noop)));
        assert_eq!(registry.len(), MAX_SUBSCRIPTIONS);

        // Other kinds still have room
        assert!(registry.subscribe("APU_READY_LT", Listener::Led(&led)));
    }
}
