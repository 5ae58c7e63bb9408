//! Host capability seam
//!
//! The runtime never touches a platform directly. Everything it needs
//! (visibility detection, the scroll surface, frame scheduling, timers,
//! performance marks) is reached through an [`Environment`], which is built
//! once per host and handed to every unit. A capability that the host lacks
//! is simply absent, and units fall back to inert defaults.
//!
//! Every registration returns a [`Subscription`] that owns its release action.

pub mod clock;
pub mod page;
pub mod sim;

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, RootMargin, Thresholds};

pub use clock::{Clock, ManualClock, SystemClock};
pub use page::{PageHost, PerformanceMark, PerformanceMeasure};
pub use sim::Simulation;

/// Opaque handle to a host element. The runtime only observes elements,
/// it never owns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementHandle(pub u64);

/// Handle for one registration with the host.
///
/// Releasing runs the release action exactly once; dropping releases.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription with nothing to release
    pub fn inert() -> Self {
        Self { release: None }
    }

    /// Whether the release action has not run yet
    #[inline]
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Parameters of one visibility observation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObserveOptions {
    pub thresholds: Thresholds,
    pub root_margin: RootMargin,
}

/// One visibility notification for one element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityEntry {
    pub target: ElementHandle,
    pub is_intersecting: bool,
    pub intersection_ratio: f64,
    pub time: f64,
}

pub type VisibilityCallback = Box<dyn FnMut(&[VisibilityEntry])>;

/// Asynchronous element/viewport intersection reporting
pub trait VisibilityCapability {
    /// Start observing `target`. Notifications arrive in batches on later
    /// host turns, never synchronously from this call.
    fn observe(
        &self,
        target: ElementHandle,
        options: &ObserveOptions,
        callback: VisibilityCallback,
    ) -> Subscription;
}

/// The scrollable document and its viewport
pub trait ScrollCapability {
    fn scroll_offset(&self) -> f64;
    fn viewport_height(&self) -> f64;
    fn document_height(&self) -> f64;
    /// Bounding rectangle relative to the viewport's top-left corner
    fn element_rect(&self, element: ElementHandle) -> Option<Rect>;
    fn listen(&self, callback: Box<dyn FnMut()>) -> Subscription;
}

/// Per-frame scheduling; the callback receives the frame timestamp
pub trait FrameCapability {
    fn request_frame(&self, callback: Box<dyn FnOnce(f64)>) -> Subscription;
}

pub trait TimerCapability {
    fn set_timeout(&self, delay_ms: f64, callback: Box<dyn FnOnce()>) -> Subscription;
}

/// High-resolution named timing marks
pub trait PerformanceCapability {
    fn mark(&self, name: &str);
    /// Record the time between the latest marks named `start` and `end`
    fn measure(&self, name: &str, start: &str, end: &str) -> Option<f64>;
}

/// Which capabilities an environment carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Capabilities {
    pub visibility: bool,
    pub scroll: bool,
    pub frames: bool,
    pub timers: bool,
    pub performance: bool,
}

/// The capability seam handed to every unit
#[derive(Clone)]
pub struct Environment {
    clock: Rc<dyn Clock>,
    visibility: Option<Rc<dyn VisibilityCapability>>,
    scroll: Option<Rc<dyn ScrollCapability>>,
    frames: Option<Rc<dyn FrameCapability>>,
    timers: Option<Rc<dyn TimerCapability>>,
    performance: Option<Rc<dyn PerformanceCapability>>,
}

impl Environment {
    /// A non-interactive host: a clock and nothing else
    pub fn headless() -> Self {
        Self::builder(Rc::new(SystemClock::new())).build()
    }

    pub fn builder(clock: Rc<dyn Clock>) -> EnvironmentBuilder {
        EnvironmentBuilder {
            env: Environment {
                clock,
                visibility: None,
                scroll: None,
                frames: None,
                timers: None,
                performance: None,
            },
        }
    }

    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn clock(&self) -> Rc<dyn Clock> {
        Rc::clone(&self.clock)
    }

    pub fn visibility(&self) -> Option<&dyn VisibilityCapability> {
        self.visibility.as_deref()
    }

    pub fn scroll(&self) -> Option<&dyn ScrollCapability> {
        self.scroll.as_deref()
    }

    pub fn frames(&self) -> Option<&dyn FrameCapability> {
        self.frames.as_deref()
    }

    pub fn timers(&self) -> Option<&dyn TimerCapability> {
        self.timers.as_deref()
    }

    pub fn performance(&self) -> Option<&dyn PerformanceCapability> {
        self.performance.as_deref()
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            visibility: self.visibility.is_some(),
            scroll: self.scroll.is_some(),
            frames: self.frames.is_some(),
            timers: self.timers.is_some(),
            performance: self.performance.is_some(),
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

pub struct EnvironmentBuilder {
    env: Environment,
}

impl EnvironmentBuilder {
    pub fn visibility(mut self, capability: Rc<dyn VisibilityCapability>) -> Self {
        self.env.visibility = Some(capability);
        self
    }

    pub fn scroll(mut self, capability: Rc<dyn ScrollCapability>) -> Self {
        self.env.scroll = Some(capability);
        self
    }

    pub fn frames(mut self, capability: Rc<dyn FrameCapability>) -> Self {
        self.env.frames = Some(capability);
        self
    }

    pub fn timers(mut self, capability: Rc<dyn TimerCapability>) -> Self {
        self.env.timers = Some(capability);
        self
    }

    pub fn performance(mut self, capability: Rc<dyn PerformanceCapability>) -> Self {
        self.env.performance = Some(capability);
        self
    }

    pub fn build(self) -> Environment {
        self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_subscription_releases_once() {
        let count = Rc::new(Cell::new(0));
        let mut sub = Subscription::new({
            let count = Rc::clone(&count);
            move || count.set(count.get() + 1)
        });
        assert!(sub.is_active());
        sub.release();
        sub.release();
        drop(sub);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_subscription_released_on_drop() {
        let released = Rc::new(Cell::new(false));
        {
            let released = Rc::clone(&released);
            let _sub = Subscription::new(move || released.set(true));
        }
        assert!(released.get());
    }

    #[test]
    fn test_headless_has_no_capabilities() {
        let env = Environment::headless();
        assert_eq!(env.capabilities(), Capabilities::default());
        assert!(env.visibility().is_none());
        assert!(env.scroll().is_none());
    }
}
