//! Scroll tracker
//!
//! Derives offset, direction, threshold crossing and a 0..1 progress value
//! from the host's scroll surface. Each tracker owns its own rate-limited
//! listener; trackers never share one.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::ScrollConfig;
use crate::host::{ElementHandle, Environment, ScrollCapability, Subscription};
use crate::motion::Throttle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    #[default]
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScrollState {
    pub offset: f64,
    pub direction: ScrollDirection,
    /// Offset is strictly beyond the threshold; not monotonic
    pub past_threshold: bool,
    /// Document progress, or the share of the element inside the viewport
    pub progress: f64,
}

impl ScrollState {
    #[inline]
    pub fn is_scrolling_down(&self) -> bool {
        self.direction == ScrollDirection::Down
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTrackerOptions {
    pub threshold: f64,
    /// Measure progress against this element instead of the whole document
    pub element: Option<ElementHandle>,
}

impl Default for ScrollTrackerOptions {
    fn default() -> Self {
        Self::from(&ScrollConfig::default())
    }
}

impl From<&ScrollConfig> for ScrollTrackerOptions {
    fn from(config: &ScrollConfig) -> Self {
        Self {
            threshold: config.threshold,
            element: None,
        }
    }
}

#[derive(Default)]
struct TrackerInner {
    state: ScrollState,
    last_offset: f64,
    subscription: Option<Subscription>,
}

pub struct ScrollTracker {
    env: Environment,
    options: ScrollTrackerOptions,
    throttle_ms: f64,
    inner: Rc<RefCell<TrackerInner>>,
}

impl ScrollTracker {
    /// Subscribe to the scroll surface and sample the current position once
    pub fn mount(env: &Environment, options: ScrollTrackerOptions, config: &ScrollConfig) -> Self {
        let mut tracker = Self {
            env: env.clone(),
            options,
            throttle_ms: config.throttle_ms,
            inner: Rc::new(RefCell::new(TrackerInner::default())),
        };
        tracker.subscribe();
        tracker
    }

    pub fn options(&self) -> ScrollTrackerOptions {
        self.options
    }

    /// Change threshold or element. Re-subscribes only when one changed.
    pub fn set_options(&mut self, options: ScrollTrackerOptions) {
        if options == self.options {
            return;
        }
        self.release();
        self.options = options;
        self.subscribe();
    }

    pub fn state(&self) -> ScrollState {
        self.inner.borrow().state
    }

    pub fn is_listening(&self) -> bool {
        self.inner.borrow().subscription.is_some()
    }

    pub fn unmount(&mut self) {
        if self.release() {
            debug!("Scroll tracker unmounted");
        }
    }

    fn release(&mut self) -> bool {
        let released = self.inner.borrow_mut().subscription.take();
        released.is_some()
    }

    fn subscribe(&mut self) {
        let Some(scroll) = self.env.scroll() else {
            trace!("No scroll capability, tracker stays at defaults");
            return;
        };

        let weak = Rc::downgrade(&self.inner);
        let env = self.env.clone();
        let options = self.options;
        let handler: Rc<RefCell<dyn FnMut()>> = Rc::new(RefCell::new(
            Throttle::new(self.env.clock(), self.throttle_ms)
                .wrap(move || on_scroll(&weak, &env, options)),
        ));

        let listener = scroll.listen(Box::new({
            let handler = Rc::clone(&handler);
            move || (&mut *handler.borrow_mut())()
        }));
        self.inner.borrow_mut().subscription = Some(listener);
        debug!(
            threshold = options.threshold,
            element = ?options.element,
            "Scroll tracker subscribed"
        );

        // Capture the position the page already has
        (&mut *handler.borrow_mut())();
    }
}

impl Drop for ScrollTracker {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn on_scroll(
    inner: &Weak<RefCell<TrackerInner>>,
    env: &Environment,
    options: ScrollTrackerOptions,
) {
    let (Some(inner), Some(scroll)) = (inner.upgrade(), env.scroll()) else {
        return;
    };
    let mut inner = inner.borrow_mut();
    if inner.subscription.is_none() {
        return;
    }
    let state = sample(scroll, options, inner.last_offset);
    trace!(offset = state.offset, progress = state.progress, "Scroll sampled");
    inner.last_offset = state.offset;
    inner.state = state;
}

fn sample(
    scroll: &dyn ScrollCapability,
    options: ScrollTrackerOptions,
    last_offset: f64,
) -> ScrollState {
    let offset = scroll.scroll_offset();
    // Equal offsets resolve to Up
    let direction = if offset > last_offset {
        ScrollDirection::Down
    } else {
        ScrollDirection::Up
    };
    let viewport = scroll.viewport_height();

    let progress = match options.element {
        Some(element) => match scroll.element_rect(element) {
            Some(rect) if rect.height > 0.0 => {
                let visible = rect.bottom().min(viewport) - rect.y.max(0.0);
                visible.max(0.0) / rect.height
            }
            _ => 0.0,
        },
        None => {
            let range = scroll.document_height() - viewport;
            if range > 0.0 {
                offset / range
            } else {
                0.0
            }
        }
    };

    ScrollState {
        offset,
        direction,
        past_threshold: offset > options.threshold,
        progress: progress.clamp(0.0, 1.0),
    }
}
