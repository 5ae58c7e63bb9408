//! Activation wrapper
//!
//! Defers building an expensive subtree until its region first becomes
//! visible. Until then the fallback is rendered; afterwards the built content
//! stays rendered for the wrapper's lifetime, even off screen.

use serde::Serialize;
use tracing::debug;

use crate::config::ActivationConfig;
use crate::geometry::{RootMargin, Thresholds};
use crate::host::{ElementHandle, Environment};
use crate::visibility::{VisibilityObserver, VisibilityOptions};

#[derive(Debug, Clone, PartialEq)]
pub struct ActivationOptions {
    pub root_margin: RootMargin,
    pub threshold: Thresholds,
}

impl From<&ActivationConfig> for ActivationOptions {
    fn from(config: &ActivationConfig) -> Self {
        Self {
            root_margin: config.root_margin,
            threshold: config.threshold.clone(),
        }
    }
}

impl Default for ActivationOptions {
    fn default() -> Self {
        Self::from(&ActivationConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivationRecord {
    pub has_triggered: bool,
    /// Always true: activation never reverts
    pub trigger_once: bool,
}

/// What an activation region currently shows
#[derive(Debug)]
pub enum Rendered<'a, T, F> {
    Placeholder(&'a F),
    Content(&'a T),
}

impl<T, F> Rendered<'_, T, F> {
    pub fn is_content(&self) -> bool {
        matches!(self, Rendered::Content(_))
    }
}

pub struct Activation<T, F = ()> {
    observer: VisibilityObserver,
    record: ActivationRecord,
    build: Option<Box<dyn FnOnce() -> T>>,
    content: Option<T>,
    fallback: F,
}

impl<T, F> Activation<T, F> {
    pub fn new(
        env: &Environment,
        options: ActivationOptions,
        fallback: F,
        build: impl FnOnce() -> T + 'static,
    ) -> Self {
        let observer = VisibilityObserver::new(
            env,
            VisibilityOptions {
                threshold: options.threshold,
                root_margin: options.root_margin,
                trigger_once: true,
            },
        );
        Self {
            observer,
            record: ActivationRecord {
                has_triggered: false,
                trigger_once: true,
            },
            build: Some(Box::new(build)),
            content: None,
            fallback,
        }
    }

    /// Attach the region whose visibility gates the content
    pub fn attach(&mut self, region: Option<ElementHandle>) {
        self.observer.attach(region);
    }

    /// Build the content if the region has become visible. Returns whether
    /// the wrapper is active.
    pub fn poll(&mut self) -> bool {
        if self.record.has_triggered {
            return true;
        }
        if !self.observer.has_been_visible() {
            return false;
        }
        if let Some(build) = self.build.take() {
            debug!(region = ?self.observer.target(), "Region activated, building content");
            self.content = Some(build());
        }
        self.record.has_triggered = true;
        true
    }

    pub fn render(&mut self) -> Rendered<'_, T, F> {
        self.poll();
        match &self.content {
            Some(content) => Rendered::Content(content),
            None => Rendered::Placeholder(&self.fallback),
        }
    }

    pub fn is_activated(&self) -> bool {
        self.record.has_triggered
    }

    pub fn record(&self) -> ActivationRecord {
        self.record
    }

    pub fn content(&self) -> Option<&T> {
        self.content.as_ref()
    }

    pub fn content_mut(&mut self) -> Option<&mut T> {
        self.content.as_mut()
    }

    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    /// Whether the underlying visibility observation is still held
    pub fn is_observing(&self) -> bool {
        self.observer.is_observing()
    }

    pub fn unmount(&mut self) {
        self.observer.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Size};
    use crate::host::Simulation;
    use std::cell::Cell;
    use std::rc::Rc;

    fn page() -> (Simulation, ElementHandle) {
        let sim = Simulation::new(Size::new(100.0, 100.0));
        sim.add_element(Rect::new(0.0, 0.0, 100.0, 2000.0));
        let region = sim.add_element(Rect::new(0.0, 500.0, 100.0, 100.0));
        (sim, region)
    }

    fn options() -> ActivationOptions {
        ActivationOptions {
            root_margin: RootMargin::ZERO,
            threshold: Thresholds::single(0.1),
        }
    }

    #[test]
    fn test_renders_fallback_until_visible() {
        let (sim, region) = page();
        let built = Rc::new(Cell::new(0));
        let mut activation = Activation::new(&sim.environment(), options(), "loading", {
            let built = Rc::clone(&built);
            move || {
                built.set(built.get() + 1);
                vec!["feature"; 3]
            }
        });
        activation.attach(Some(region));
        sim.pump();
        assert!(matches!(activation.render(), Rendered::Placeholder(&"loading")));
        assert_eq!(built.get(), 0);

        sim.scroll_to(450.0);
        assert!(activation.render().is_content());
        assert_eq!(built.get(), 1);
        assert!(activation.record().has_triggered);
    }

    #[test]
    fn test_content_kept_after_leaving_viewport() {
        let (sim, region) = page();
        let built = Rc::new(Cell::new(0));
        let mut activation = Activation::new(&sim.environment(), options(), (), {
            let built = Rc::clone(&built);
            move || {
                built.set(built.get() + 1);
                String::from("pricing")
            }
        });
        activation.attach(Some(region));
        sim.scroll_to(500.0);
        assert!(activation.poll());

        sim.scroll_to(0.0);
        sim.scroll_to(1200.0);
        match activation.render() {
            Rendered::Content(text) => assert_eq!(text, "pricing"),
            Rendered::Placeholder(_) => panic!("content unmounted"),
        }
        assert_eq!(built.get(), 1);
    }

    #[test]
    fn test_observation_released_on_activation() {
        let (sim, region) = page();
        let mut activation = Activation::new(&sim.environment(), options(), (), || 1);
        activation.attach(Some(region));
        assert_eq!(sim.page().observation_count(), 1);
        sim.scroll_to(500.0);
        activation.poll();
        assert!(!activation.is_observing());
        assert_eq!(sim.page().observation_count(), 0);
    }

    #[test]
    fn test_unmount_before_activation_releases() {
        let (sim, region) = page();
        let mut activation = Activation::new(&sim.environment(), options(), (), || 1);
        activation.attach(Some(region));
        activation.unmount();
        assert_eq!(sim.page().observation_count(), 0);
        sim.scroll_to(500.0);
        assert!(!activation.poll());
    }

    #[test]
    fn test_headless_keeps_fallback() {
        let mut activation = Activation::new(&Environment::headless(), options(), "ssr", || 1);
        activation.attach(Some(ElementHandle(1)));
        assert!(matches!(activation.render(), Rendered::Placeholder(&"ssr")));
    }
}
