//! Visibility observer
//!
//! Tracks whether one element currently intersects the viewport, and whether
//! it ever has. Attach an element with [`VisibilityObserver::attach`]; the
//! observer holds at most one host observation at a time and releases it on
//! detach, on element change, on unmount, and (in trigger-once mode) after
//! the first visible notification.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::VisibilityConfig;
use crate::geometry::{RootMargin, Thresholds};
use crate::host::{ElementHandle, Environment, ObserveOptions, Subscription, VisibilityEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VisibilityState {
    pub is_visible: bool,
    /// Monotonic for the observer's lifetime
    pub has_been_visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityOptions {
    pub threshold: Thresholds,
    pub root_margin: RootMargin,
    pub trigger_once: bool,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self::from(&VisibilityConfig::default())
    }
}

impl From<&VisibilityConfig> for VisibilityOptions {
    fn from(config: &VisibilityConfig) -> Self {
        Self {
            threshold: config.threshold.clone(),
            root_margin: config.root_margin,
            trigger_once: config.trigger_once,
        }
    }
}

#[derive(Default)]
struct ObserverInner {
    state: VisibilityState,
    target: Option<ElementHandle>,
    subscription: Option<Subscription>,
    /// Trigger-once mode fired; visibility is frozen at true
    frozen: bool,
}

pub struct VisibilityObserver {
    env: Environment,
    options: VisibilityOptions,
    inner: Rc<RefCell<ObserverInner>>,
}

impl VisibilityObserver {
    pub fn new(env: &Environment, options: VisibilityOptions) -> Self {
        Self {
            env: env.clone(),
            options,
            inner: Rc::new(RefCell::new(ObserverInner::default())),
        }
    }

    pub fn options(&self) -> &VisibilityOptions {
        &self.options
    }

    /// Point the observer at `target`. Re-attaching the same element is a
    /// no-op; a different element replaces the observation; `None` detaches.
    pub fn attach(&mut self, target: Option<ElementHandle>) {
        let released = {
            let mut inner = self.inner.borrow_mut();
            if inner.target == target {
                return;
            }
            inner.target = target;
            inner.subscription.take()
        };
        drop(released);

        let Some(target) = target else {
            return;
        };
        if self.inner.borrow().frozen {
            trace!(target_element = target.0, "Visibility already triggered, not observing");
            return;
        }
        let Some(visibility) = self.env.visibility() else {
            trace!(target_element = target.0, "No visibility capability, observer stays inert");
            return;
        };

        let options = ObserveOptions {
            thresholds: self.options.threshold.clone(),
            root_margin: self.options.root_margin,
        };
        let weak = Rc::downgrade(&self.inner);
        let trigger_once = self.options.trigger_once;
        let subscription = visibility.observe(
            target,
            &options,
            Box::new(move |entries| on_entries(&weak, target, trigger_once, entries)),
        );
        self.inner.borrow_mut().subscription = Some(subscription);
    }

    pub fn target(&self) -> Option<ElementHandle> {
        self.inner.borrow().target
    }

    pub fn state(&self) -> VisibilityState {
        self.inner.borrow().state
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.state().is_visible
    }

    #[inline]
    pub fn has_been_visible(&self) -> bool {
        self.state().has_been_visible
    }

    /// Whether a host observation is currently held
    pub fn is_observing(&self) -> bool {
        self.inner.borrow().subscription.is_some()
    }

    /// Release any held observation. State is kept as last reported.
    pub fn unmount(&mut self) {
        let released = self.inner.borrow_mut().subscription.take();
        if released.is_some() {
            debug!("Visibility observer unmounted");
        }
    }
}

impl Drop for VisibilityObserver {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn on_entries(
    inner: &Weak<RefCell<ObserverInner>>,
    target: ElementHandle,
    trigger_once: bool,
    entries: &[VisibilityEntry],
) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let released = {
        let mut inner = inner.borrow_mut();
        // Late delivery after release or re-attach
        if inner.subscription.is_none() || inner.target != Some(target) {
            return;
        }
        let Some(entry) = entries.iter().rev().find(|entry| entry.target == target) else {
            return;
        };
        inner.state.is_visible = entry.is_intersecting;
        if entry.is_intersecting {
            inner.state.has_been_visible = true;
        }
        if trigger_once && entry.is_intersecting {
            inner.frozen = true;
            debug!(
                target_element = target.0,
                "Element visible, releasing trigger-once observation"
            );
            inner.subscription.take()
        } else {
            None
        }
    };
    drop(released);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Size};
    use crate::host::{Simulation, VisibilityCallback, VisibilityCapability};
    use std::cell::Cell;

    fn options(trigger_once: bool) -> VisibilityOptions {
        VisibilityOptions {
            threshold: Thresholds::single(0.0),
            root_margin: RootMargin::ZERO,
            trigger_once,
        }
    }

    /// Page with a 100px viewport and a target at 200..250
    fn page() -> (Simulation, ElementHandle) {
        let sim = Simulation::new(Size::new(100.0, 100.0));
        sim.add_element(Rect::new(0.0, 0.0, 100.0, 1000.0));
        let target = sim.add_element(Rect::new(0.0, 200.0, 100.0, 50.0));
        (sim, target)
    }

    /// Visibility capability that keeps delivering to callbacks even after
    /// they were released, like a misbehaving platform.
    #[derive(Default)]
    struct ScriptedVisibility {
        callbacks: RefCell<Vec<VisibilityCallback>>,
        released: Rc<Cell<usize>>,
    }

    impl ScriptedVisibility {
        fn emit(&self, entries: &[VisibilityEntry]) {
            for callback in self.callbacks.borrow_mut().iter_mut() {
                callback(entries);
            }
        }
    }

    impl VisibilityCapability for ScriptedVisibility {
        fn observe(
            &self,
            _target: ElementHandle,
            _options: &ObserveOptions,
            callback: VisibilityCallback,
        ) -> Subscription {
            self.callbacks.borrow_mut().push(callback);
            let released = Rc::clone(&self.released);
            Subscription::new(move || released.set(released.get() + 1))
        }
    }

    fn entry(target: ElementHandle, visible: bool) -> VisibilityEntry {
        VisibilityEntry {
            target,
            is_intersecting: visible,
            intersection_ratio: if visible { 1.0 } else { 0.0 },
            time: 0.0,
        }
    }

    fn scripted() -> (Environment, Rc<ScriptedVisibility>) {
        let scripted = Rc::new(ScriptedVisibility::default());
        let env = Environment::builder(Rc::new(crate::host::ManualClock::new()))
            .visibility(Rc::clone(&scripted) as Rc<dyn VisibilityCapability>)
            .build();
        (env, scripted)
    }

    #[test]
    fn test_reports_visibility_transitions() {
        let (sim, target) = page();
        let mut observer = VisibilityObserver::new(&sim.environment(), options(false));
        observer.attach(Some(target));
        sim.pump();
        assert_eq!(observer.state(), VisibilityState::default());

        sim.scroll_to(180.0);
        assert!(observer.is_visible());
        assert!(observer.has_been_visible());

        sim.scroll_to(0.0);
        assert!(!observer.is_visible());
        assert!(observer.has_been_visible());
    }

    #[test]
    fn test_has_been_visible_is_monotonic() {
        let (sim, target) = page();
        let mut observer = VisibilityObserver::new(&sim.environment(), options(false));
        observer.attach(Some(target));
        sim.pump();
        let mut seen_true = false;
        for offset in [180.0, 0.0, 190.0, 10.0, 500.0, 0.0] {
            sim.scroll_to(offset);
            seen_true |= observer.is_visible();
            assert_eq!(observer.has_been_visible(), seen_true);
        }
        assert!(observer.has_been_visible());
    }

    #[test]
    fn test_trigger_once_freezes_and_unsubscribes() {
        let (sim, target) = page();
        let mut observer = VisibilityObserver::new(&sim.environment(), options(true));
        observer.attach(Some(target));
        sim.pump();
        assert!(observer.is_observing());

        sim.scroll_to(180.0);
        assert!(observer.is_visible());
        assert!(!observer.is_observing());
        assert_eq!(sim.page().observation_count(), 0);

        sim.scroll_to(0.0);
        assert!(observer.is_visible());
    }

    #[test]
    fn test_trigger_once_ignores_late_not_visible_notification() {
        let (env, scripted) = scripted();
        let target = ElementHandle(7);
        let mut observer = VisibilityObserver::new(&env, options(true));
        observer.attach(Some(target));
        scripted.emit(&[entry(target, true)]);
        assert_eq!(scripted.released.get(), 1);
        scripted.emit(&[entry(target, false)]);
        assert!(observer.is_visible());
    }

    #[test]
    fn test_ignores_entries_for_other_elements() {
        let (env, scripted) = scripted();
        let target = ElementHandle(1);
        let mut observer = VisibilityObserver::new(&env, options(false));
        observer.attach(Some(target));
        scripted.emit(&[entry(ElementHandle(2), true), entry(ElementHandle(3), true)]);
        assert!(!observer.is_visible());
        scripted.emit(&[entry(ElementHandle(2), false), entry(target, true)]);
        assert!(observer.is_visible());
    }

    #[test]
    fn test_no_mutation_after_unmount() {
        let (env, scripted) = scripted();
        let target = ElementHandle(1);
        let mut observer = VisibilityObserver::new(&env, options(false));
        observer.attach(Some(target));
        observer.unmount();
        assert_eq!(scripted.released.get(), 1);
        scripted.emit(&[entry(target, true)]);
        assert_eq!(observer.state(), VisibilityState::default());
    }

    #[test]
    fn test_element_change_replaces_observation() {
        let (sim, first) = page();
        let second = sim.add_element(Rect::new(0.0, 20.0, 100.0, 10.0));
        let mut observer = VisibilityObserver::new(&sim.environment(), options(false));
        observer.attach(Some(first));
        observer.attach(Some(first));
        assert_eq!(sim.page().observation_count(), 1);

        observer.attach(Some(second));
        assert_eq!(sim.page().observation_count(), 1);
        sim.pump();
        assert!(observer.is_visible());

        observer.attach(None);
        assert_eq!(sim.page().observation_count(), 0);
    }

    #[test]
    fn test_drop_releases_observation() {
        let (sim, target) = page();
        {
            let mut observer = VisibilityObserver::new(&sim.environment(), options(false));
            observer.attach(Some(target));
            assert_eq!(sim.page().observation_count(), 1);
        }
        assert_eq!(sim.page().observation_count(), 0);
    }

    #[test]
    fn test_headless_stays_inert() {
        let mut observer = VisibilityObserver::new(&Environment::headless(), options(true));
        observer.attach(Some(ElementHandle(1)));
        assert!(!observer.is_observing());
        assert_eq!(observer.state(), VisibilityState::default());
    }
}
