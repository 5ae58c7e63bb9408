//! In-process page host
//!
//! A document of element rectangles behind a scrollable viewport, plus the
//! scheduler that drives it: scroll listeners, timers, frame callbacks,
//! visibility observations and a performance-mark log. One [`PageHost::pump`]
//! is one turn of the host's event loop.
//!
//! User callbacks always run with the page state unborrowed, so they are free
//! to register or release subscriptions while being invoked.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use serde::Serialize;
use tracing::{debug, trace};

use super::{
    Clock, ElementHandle, Environment, FrameCapability, ObserveOptions, PerformanceCapability,
    ScrollCapability, Subscription, TimerCapability, VisibilityCallback, VisibilityCapability,
    VisibilityEntry,
};
use crate::geometry::{Rect, Size};

/// A named point in time recorded by the host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMark {
    pub name: String,
    pub time: f64,
}

/// Duration between two marks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMeasure {
    pub name: String,
    pub start: f64,
    pub duration: f64,
}

type SharedListener = Rc<RefCell<Box<dyn FnMut()>>>;
type SharedVisibilityCallback = Rc<RefCell<VisibilityCallback>>;

struct PendingTimer {
    due: f64,
    callback: Box<dyn FnOnce()>,
}

struct Observation {
    target: ElementHandle,
    options: ObserveOptions,
    /// Threshold index and intersecting flag last delivered
    last: Option<(usize, bool)>,
    callback: SharedVisibilityCallback,
}

#[derive(Default)]
struct PageState {
    viewport: Size,
    scroll_offset: f64,
    scroll_pending: bool,
    elements: BTreeMap<ElementHandle, Rect>,
    next_element: u64,
    next_id: u64,
    listeners: BTreeMap<u64, SharedListener>,
    timers: BTreeMap<u64, PendingTimer>,
    frames: BTreeMap<u64, Box<dyn FnOnce(f64)>>,
    observations: BTreeMap<u64, Observation>,
    marks: Vec<PerformanceMark>,
    measures: Vec<PerformanceMeasure>,
}

impl PageState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn document_height(&self) -> f64 {
        self.elements
            .values()
            .map(Rect::bottom)
            .fold(self.viewport.height, f64::max)
    }

    fn max_scroll(&self) -> f64 {
        (self.document_height() - self.viewport.height).max(0.0)
    }

    fn set_scroll(&mut self, offset: f64) -> f64 {
        let clamped = offset.clamp(0.0, self.max_scroll());
        if clamped != self.scroll_offset {
            self.scroll_offset = clamped;
            self.scroll_pending = true;
        }
        clamped
    }
}

/// Handle to a page; clones share the same page
#[derive(Clone)]
pub struct PageHost {
    clock: Rc<dyn Clock>,
    state: Rc<RefCell<PageState>>,
}

impl PageHost {
    pub fn new(clock: Rc<dyn Clock>, viewport: Size) -> Self {
        Self {
            clock,
            state: Rc::new(RefCell::new(PageState {
                viewport,
                ..PageState::default()
            })),
        }
    }

    /// An environment carrying every capability of this page
    pub fn environment(&self) -> Environment {
        Environment::builder(Rc::clone(&self.clock))
            .visibility(Rc::new(self.clone()))
            .scroll(Rc::new(self.clone()))
            .frames(Rc::new(self.clone()))
            .timers(Rc::new(self.clone()))
            .performance(Rc::new(self.clone()))
            .build()
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    /// Add an element at `rect` (document coordinates)
    pub fn add_element(&self, rect: Rect) -> ElementHandle {
        let mut state = self.state.borrow_mut();
        state.next_element += 1;
        let handle = ElementHandle(state.next_element);
        state.elements.insert(handle, rect);
        handle
    }

    pub fn set_element_rect(&self, element: ElementHandle, rect: Rect) {
        let mut state = self.state.borrow_mut();
        state.elements.insert(element, rect);
        let offset = state.scroll_offset;
        state.set_scroll(offset);
    }

    pub fn remove_element(&self, element: ElementHandle) {
        let mut state = self.state.borrow_mut();
        state.elements.remove(&element);
        let offset = state.scroll_offset;
        state.set_scroll(offset);
    }

    /// Element rectangle in document coordinates
    pub fn document_rect(&self, element: ElementHandle) -> Option<Rect> {
        self.state.borrow().elements.get(&element).copied()
    }

    pub fn viewport(&self) -> Size {
        self.state.borrow().viewport
    }

    pub fn set_viewport(&self, viewport: Size) {
        let mut state = self.state.borrow_mut();
        state.viewport = viewport;
        let offset = state.scroll_offset;
        state.set_scroll(offset);
    }

    /// Scroll to `offset`, clamped to the scrollable range. Listeners are
    /// notified on the next turn if the offset changed.
    pub fn scroll_to(&self, offset: f64) -> f64 {
        self.state.borrow_mut().set_scroll(offset)
    }

    pub fn scroll_by(&self, delta: f64) -> f64 {
        let mut state = self.state.borrow_mut();
        let target = state.scroll_offset + delta;
        state.set_scroll(target)
    }

    pub fn max_scroll(&self) -> f64 {
        self.state.borrow().max_scroll()
    }

    pub fn marks(&self) -> Vec<PerformanceMark> {
        self.state.borrow().marks.clone()
    }

    pub fn measures(&self) -> Vec<PerformanceMeasure> {
        self.state.borrow().measures.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn observation_count(&self) -> usize {
        self.state.borrow().observations.len()
    }

    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Run one host turn at the clock's current time
    pub fn pump(&self) {
        let now = self.clock.now_ms();
        self.dispatch_scroll();
        self.run_timers(now);
        self.run_frames(now);
        self.update_intersections(now);
    }

    fn dispatch_scroll(&self) {
        let listeners: Vec<(u64, SharedListener)> = {
            let mut state = self.state.borrow_mut();
            if !std::mem::take(&mut state.scroll_pending) {
                return;
            }
            state
                .listeners
                .iter()
                .map(|(id, listener)| (*id, Rc::clone(listener)))
                .collect()
        };
        for (id, listener) in listeners {
            // An earlier listener may have released this one
            if !self.state.borrow().listeners.contains_key(&id) {
                continue;
            }
            let mut callback = listener.borrow_mut();
            (&mut **callback)();
        }
    }

    fn run_timers(&self, now: f64) {
        loop {
            let timer = {
                let mut state = self.state.borrow_mut();
                let next = state
                    .timers
                    .iter()
                    .filter(|(_, timer)| timer.due <= now)
                    .min_by(|a, b| a.1.due.total_cmp(&b.1.due).then(a.0.cmp(b.0)))
                    .map(|(id, _)| *id);
                next.and_then(|id| state.timers.remove(&id))
            };
            match timer {
                Some(timer) => (timer.callback)(),
                None => break,
            }
        }
    }

    fn run_frames(&self, now: f64) {
        // Frames requested while running belong to the next turn
        let ids: Vec<u64> = self.state.borrow().frames.keys().copied().collect();
        for id in ids {
            let callback = self.state.borrow_mut().frames.remove(&id);
            if let Some(callback) = callback {
                callback(now);
            }
        }
    }

    fn update_intersections(&self, now: f64) {
        let batches: Vec<(u64, SharedVisibilityCallback, VisibilityEntry)> = {
            let mut state = self.state.borrow_mut();
            let PageState {
                viewport,
                scroll_offset,
                elements,
                observations,
                ..
            } = &mut *state;
            let root = Rect::new(0.0, *scroll_offset, viewport.width, viewport.height);

            let mut batches = Vec::new();
            for (id, observation) in observations.iter_mut() {
                let bounds = root.expand(observation.options.root_margin.resolve(*viewport));
                let overlap = elements.get(&observation.target).and_then(|rect| {
                    rect.intersection(&bounds).map(|overlap| {
                        if rect.area() > 0.0 {
                            overlap.area() / rect.area()
                        } else {
                            1.0
                        }
                    })
                });
                let (index, is_intersecting, ratio) = match overlap {
                    Some(ratio) => {
                        let index = observation.options.thresholds.index_for(ratio);
                        (index, index > 0, ratio)
                    }
                    None => (0, false, 0.0),
                };
                if observation.last != Some((index, is_intersecting)) {
                    observation.last = Some((index, is_intersecting));
                    batches.push((
                        *id,
                        Rc::clone(&observation.callback),
                        VisibilityEntry {
                            target: observation.target,
                            is_intersecting,
                            intersection_ratio: ratio,
                            time: now,
                        },
                    ));
                }
            }
            batches
        };

        for (id, callback, entry) in batches {
            if !self.state.borrow().observations.contains_key(&id) {
                continue;
            }
            trace!(
                target_element = entry.target.0,
                visible = entry.is_intersecting,
                ratio = entry.intersection_ratio,
                "Delivering visibility entry"
            );
            let mut callback = callback.borrow_mut();
            (&mut **callback)(&[entry]);
        }
    }

    fn release_with(&self, release: impl FnOnce(&mut PageState) + 'static) -> Subscription {
        let weak: Weak<RefCell<PageState>> = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                release(&mut state.borrow_mut());
            }
        })
    }
}

impl VisibilityCapability for PageHost {
    fn observe(
        &self,
        target: ElementHandle,
        options: &ObserveOptions,
        callback: VisibilityCallback,
    ) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.allocate_id();
            state.observations.insert(
                id,
                Observation {
                    target,
                    options: options.clone(),
                    last: None,
                    callback: Rc::new(RefCell::new(callback)),
                },
            );
            id
        };
        debug!(observation = id, target_element = target.0, "Observing element");
        self.release_with(move |state| {
            if state.observations.remove(&id).is_some() {
                debug!(observation = id, "Observation released");
            }
        })
    }
}

impl ScrollCapability for PageHost {
    fn scroll_offset(&self) -> f64 {
        self.state.borrow().scroll_offset
    }

    fn viewport_height(&self) -> f64 {
        self.state.borrow().viewport.height
    }

    fn document_height(&self) -> f64 {
        self.state.borrow().document_height()
    }

    fn element_rect(&self, element: ElementHandle) -> Option<Rect> {
        let state = self.state.borrow();
        let offset = state.scroll_offset;
        state
            .elements
            .get(&element)
            .map(|rect| rect.translate(0.0, -offset))
    }

    fn listen(&self, callback: Box<dyn FnMut()>) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.allocate_id();
            state.listeners.insert(id, Rc::new(RefCell::new(callback)));
            id
        };
        debug!(listener = id, "Scroll listener registered");
        self.release_with(move |state| {
            if state.listeners.remove(&id).is_some() {
                debug!(listener = id, "Scroll listener removed");
            }
        })
    }
}

impl FrameCapability for PageHost {
    fn request_frame(&self, callback: Box<dyn FnOnce(f64)>) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.allocate_id();
            state.frames.insert(id, callback);
            id
        };
        self.release_with(move |state| {
            state.frames.remove(&id);
        })
    }
}

impl TimerCapability for PageHost {
    fn set_timeout(&self, delay_ms: f64, callback: Box<dyn FnOnce()>) -> Subscription {
        let due = self.clock.now_ms() + delay_ms.max(0.0);
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.allocate_id();
            state.timers.insert(id, PendingTimer { due, callback });
            id
        };
        self.release_with(move |state| {
            state.timers.remove(&id);
        })
    }
}

impl PerformanceCapability for PageHost {
    fn mark(&self, name: &str) {
        let time = self.clock.now_ms();
        self.state.borrow_mut().marks.push(PerformanceMark {
            name: name.to_string(),
            time,
        });
    }

    fn measure(&self, name: &str, start: &str, end: &str) -> Option<f64> {
        let mut state = self.state.borrow_mut();
        let latest = |mark: &str| {
            state
                .marks
                .iter()
                .rev()
                .find(|m| m.name == mark)
                .map(|m| m.time)
        };
        let (start, end) = (latest(start)?, latest(end)?);
        let duration = end - start;
        state.measures.push(PerformanceMeasure {
            name: name.to_string(),
            start,
            duration,
        });
        Some(duration)
    }
}
