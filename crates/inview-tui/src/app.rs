use std::rc::Rc;

use tracing::{debug, info};

use inview_core::geometry::{Rect, Size};
use inview_core::host::{Clock, ElementHandle, ScrollCapability, SystemClock};
use inview_core::{
    Activation, ActivationOptions, AppConfig, CountUp, CountUpOptions, Environment, PageHost,
    ScrollState, ScrollTracker, ScrollTrackerOptions, SectionMark, VisibilityObserver,
    VisibilityOptions,
};

use crate::content::{self, Feature, Plan};
use crate::theme::Theme;

/// Document pixels per terminal row
pub const ROW_HEIGHT: f64 = 16.0;

/// Host viewport for a content area of `cols` x `rows` cells
pub fn viewport_size(cols: u16, rows: u16) -> Size {
    Size::new(cols as f64, rows as f64 * ROW_HEIGHT)
}

fn section_rect(width: f64, top: u16, height: u16) -> Rect {
    Rect::new(0.0, top as f64 * ROW_HEIGHT, width, height as f64 * ROW_HEIGHT)
}

/// Sections of the demo page, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Hero,
    Stats,
    Features,
    Testimonials,
    Pricing,
    Faq,
    Footer,
}

impl SectionKind {
    pub const ALL: [SectionKind; 7] = [
        SectionKind::Hero,
        SectionKind::Stats,
        SectionKind::Features,
        SectionKind::Testimonials,
        SectionKind::Pricing,
        SectionKind::Faq,
        SectionKind::Footer,
    ];

    /// Name used for timing marks
    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Hero => "hero",
            SectionKind::Stats => "stats",
            SectionKind::Features => "features",
            SectionKind::Testimonials => "testimonials",
            SectionKind::Pricing => "pricing",
            SectionKind::Faq => "faq",
            SectionKind::Footer => "footer",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Hero => "Home",
            SectionKind::Stats => "Numbers",
            SectionKind::Features => "Features",
            SectionKind::Testimonials => "Voices",
            SectionKind::Pricing => "Pricing",
            SectionKind::Faq => "FAQ",
            SectionKind::Footer => "About",
        }
    }

    /// Height in rows
    pub fn height(&self) -> u16 {
        match self {
            SectionKind::Hero => 12,
            SectionKind::Stats => 9,
            SectionKind::Features => 14,
            SectionKind::Testimonials => 12,
            SectionKind::Pricing => 14,
            SectionKind::Faq => 14,
            SectionKind::Footer => 5,
        }
    }
}

/// A laid out section of the page, in rows
#[derive(Debug, Clone, Copy)]
pub struct Section {
    pub kind: SectionKind,
    pub element: ElementHandle,
    pub top: u16,
    pub height: u16,
}

pub struct Stat {
    pub label: &'static str,
    pub suffix: &'static str,
    pub counter: CountUp,
}

/// Entrance reveal: a 0 to 100 count-up started on first sight
pub struct Reveal {
    observer: VisibilityObserver,
    progress: CountUp,
}

impl Reveal {
    fn new(env: &Environment, config: &AppConfig, element: Option<ElementHandle>) -> Self {
        let mut observer =
            VisibilityObserver::new(env, VisibilityOptions::from(&config.visibility));
        observer.attach(element);
        let progress = CountUp::new(
            env,
            100.0,
            CountUpOptions {
                duration_ms: config.ui.reveal_duration_ms,
                easing: Some("ease-out-cubic".to_string()),
                ..CountUpOptions::from(&config.animation)
            },
            &config.animation,
        );
        Self { observer, progress }
    }

    fn settle(&self) {
        if self.observer.is_visible() {
            self.progress.start();
        }
    }

    /// Share of the section currently revealed, 0..=1
    pub fn fraction(&self) -> f64 {
        self.progress.count() / 100.0
    }

    fn unmount(&mut self) {
        self.observer.unmount();
        self.progress.unmount();
    }
}

/// Application state for the demo page
pub struct App {
    pub config: AppConfig,
    pub theme: Theme,
    pub page: PageHost,
    pub sections: Vec<SectionMark<Section>>,
    pub nav: ScrollTracker,
    pub stats: Vec<Stat>,
    stats_seen: VisibilityObserver,
    pub features: Activation<Vec<Feature>>,
    pub pricing: Activation<Vec<Plan>>,
    pub testimonials: Reveal,
    pub faq: Reveal,
    pub should_quit: bool,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(config: AppConfig, theme: Theme, cols: u16, rows: u16) -> Self {
        Self::with_clock(config, theme, cols, rows, Rc::new(SystemClock::new()))
    }

    pub fn with_clock(
        config: AppConfig,
        theme: Theme,
        cols: u16,
        rows: u16,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let viewport = viewport_size(cols, rows);
        let page = PageHost::new(clock, viewport);
        let env = page.environment();

        let mut top = 0u16;
        let sections: Vec<SectionMark<Section>> = SectionKind::ALL
            .iter()
            .map(|&kind| {
                let height = kind.height();
                let element = page.add_element(section_rect(viewport.width, top, height));
                let section = Section {
                    kind,
                    element,
                    top,
                    height,
                };
                top += height;
                SectionMark::begin(&env, &config.performance, kind.name(), section)
            })
            .collect();
        let element = |kind: SectionKind| {
            sections
                .iter()
                .find(|s| s.kind == kind)
                .map(|s| s.element)
        };

        let nav =
            ScrollTracker::mount(&env, ScrollTrackerOptions::from(&config.scroll), &config.scroll);

        // Keeps tracking after the first sighting so a reset waits for the section
        let mut stats_seen = VisibilityObserver::new(
            &env,
            VisibilityOptions {
                trigger_once: false,
                ..VisibilityOptions::from(&config.visibility)
            },
        );
        stats_seen.attach(element(SectionKind::Stats));
        let stats = content::STATS
            .iter()
            .map(|&(label, target, suffix)| Stat {
                label,
                suffix,
                counter: CountUp::new(
                    &env,
                    target,
                    CountUpOptions::from(&config.animation),
                    &config.animation,
                ),
            })
            .collect();

        let activation = ActivationOptions::from(&config.activation);
        let mut features = Activation::new(&env, activation.clone(), (), content::build_features);
        features.attach(element(SectionKind::Features));
        let mut pricing = Activation::new(&env, activation, (), content::build_plans);
        pricing.attach(element(SectionKind::Pricing));

        let testimonials = Reveal::new(&env, &config, element(SectionKind::Testimonials));
        let faq = Reveal::new(&env, &config, element(SectionKind::Faq));

        debug!(sections = sections.len(), document_rows = top, "Demo page laid out");

        Self {
            config,
            theme,
            page,
            sections,
            nav,
            stats,
            stats_seen,
            features,
            pricing,
            testimonials,
            faq,
            should_quit: false,
            status_message: None,
        }
    }

    /// Run one host turn and apply visibility gating
    pub fn tick(&mut self) {
        self.page.pump();
        if self.stats_seen.is_visible() {
            for stat in &self.stats {
                stat.counter.start();
            }
        }
        self.testimonials.settle();
        self.faq.settle();
        self.features.poll();
        self.pricing.poll();
    }

    /// Current scroll offset in rows
    pub fn offset(&self) -> u16 {
        (self.page.scroll_offset() / ROW_HEIGHT).floor() as u16
    }

    /// Content area height in rows
    pub fn viewport_rows(&self) -> u16 {
        (self.page.viewport().height / ROW_HEIGHT).floor() as u16
    }

    /// Document height in rows
    pub fn document_rows(&self) -> u16 {
        self.sections.iter().map(|s| s.height).sum()
    }

    pub fn nav_state(&self) -> ScrollState {
        self.nav.state()
    }

    pub fn scroll_by(&mut self, rows: i32) {
        self.page.scroll_by(rows as f64 * ROW_HEIGHT);
        self.status_message = None;
    }

    pub fn scroll_to(&mut self, row: u16) {
        self.page.scroll_to(row as f64 * ROW_HEIGHT);
        self.status_message = None;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.page.scroll_to(self.page.max_scroll());
        self.status_message = None;
    }

    pub fn half_page(&self) -> i32 {
        (self.viewport_rows() / 2).max(1) as i32
    }

    pub fn full_page(&self) -> i32 {
        self.viewport_rows().max(1) as i32
    }

    /// Section under the top edge of the viewport
    pub fn current_section(&self) -> SectionKind {
        let offset = self.offset();
        self.sections
            .iter()
            .rev()
            .find(|s| s.top <= offset)
            .map(|s| s.kind)
            .unwrap_or(SectionKind::Hero)
    }

    /// Reset the statistics; they count again while their section is visible
    pub fn reset_stats(&mut self) {
        for stat in &self.stats {
            stat.counter.reset();
        }
        self.status_message = Some("Stats reset".to_string());
    }

    /// Resize the content area and stretch sections to the new width
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let viewport = viewport_size(cols, rows);
        self.page.set_viewport(viewport);
        for section in &self.sections {
            let rect = section_rect(viewport.width, section.top, section.height);
            self.page.set_element_rect(section.element, rect);
        }
    }

    /// Close every section's timing and release all subscriptions
    pub fn shutdown(&mut self) {
        for section in &self.sections {
            if let Some(duration_ms) = section.finish() {
                info!(section = section.kind.name(), duration_ms, "Section lifetime");
            }
        }
        self.nav.unmount();
        self.stats_seen.unmount();
        for stat in &mut self.stats {
            stat.counter.unmount();
        }
        self.features.unmount();
        self.pricing.unmount();
        self.testimonials.unmount();
        self.faq.unmount();
        debug!(
            listeners = self.page.listener_count(),
            observations = self.page.observation_count(),
            "Demo page torn down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inview_core::host::ManualClock;

    fn app() -> (App, ManualClock) {
        let clock = ManualClock::new();
        let app = App::with_clock(
            AppConfig::default(),
            Theme::default(),
            80,
            16,
            Rc::new(clock.clone()),
        );
        (app, clock)
    }

    fn run(app: &mut App, clock: &ManualClock, ms: f64) {
        let mut elapsed = 0.0;
        while elapsed < ms {
            clock.advance(16.0);
            elapsed += 16.0;
            app.tick();
        }
    }

    #[test]
    fn test_sections_stacked() {
        let (app, _) = app();
        let mut expected = 0;
        for section in &app.sections {
            assert_eq!(section.top, expected);
            expected += section.height;
        }
        assert_eq!(app.document_rows(), expected);
        assert_eq!(app.page.max_scroll(), (expected - 16) as f64 * ROW_HEIGHT);
        assert_eq!(app.page.marks().len(), SectionKind::ALL.len());
    }

    #[test]
    fn test_stats_count_after_scrolling_into_view() {
        let (mut app, clock) = app();
        // Stats start at row 12; the 16-row viewport already reaches them
        run(&mut app, &clock, 16.0);
        assert!(app.stats.iter().all(|s| s.counter.is_animating()));

        run(&mut app, &clock, 2100.0);
        let counts: Vec<f64> = app.stats.iter().map(|s| s.counter.count()).collect();
        assert_eq!(counts, vec![12840.0, 342.0, 99.0]);
    }

    #[test]
    fn test_reset_stats_waits_for_section() {
        let (mut app, clock) = app();
        run(&mut app, &clock, 16.0);
        assert!(app.stats.iter().all(|s| s.counter.is_animating()));

        app.scroll_to(60);
        run(&mut app, &clock, 32.0);
        app.reset_stats();
        run(&mut app, &clock, 500.0);
        assert!(app.stats.iter().all(|s| !s.counter.is_animating()));
        assert!(app.stats.iter().all(|s| s.counter.count() == 0.0));

        app.scroll_to(SectionKind::Hero.height());
        run(&mut app, &clock, 32.0);
        assert!(app.stats.iter().all(|s| s.counter.is_animating()));
    }

    #[test]
    fn test_features_deferred_until_visible() {
        let (mut app, clock) = app();
        run(&mut app, &clock, 32.0);
        assert!(app.features.content().is_none());
        assert!(app.pricing.content().is_none());

        app.scroll_to(SectionKind::Hero.height() + SectionKind::Stats.height());
        run(&mut app, &clock, 32.0);
        assert_eq!(app.features.content().map(Vec::len), Some(5));
        assert!(app.pricing.content().is_none());

        // Content survives scrolling back to the top
        app.scroll_to(0);
        run(&mut app, &clock, 32.0);
        assert!(app.features.is_activated());
    }

    #[test]
    fn test_nav_follows_scroll() {
        let (mut app, clock) = app();
        run(&mut app, &clock, 32.0);
        assert!(!app.nav_state().past_threshold);

        app.scroll_by(30);
        run(&mut app, &clock, 32.0);
        let state = app.nav_state();
        assert!(state.past_threshold);
        assert!(state.is_scrolling_down());
        assert_eq!(app.current_section(), SectionKind::Features);
    }

    #[test]
    fn test_reveal_progresses() {
        let (mut app, clock) = app();
        assert_eq!(app.testimonials.fraction(), 0.0);
        app.scroll_to(40);
        run(&mut app, &clock, 1000.0);
        assert_eq!(app.testimonials.fraction(), 1.0);
        assert_eq!(app.faq.fraction(), 0.0);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let (mut app, clock) = app();
        run(&mut app, &clock, 48.0);
        app.shutdown();
        assert_eq!(app.page.listener_count(), 0);
        assert_eq!(app.page.observation_count(), 0);
        assert_eq!(app.page.measures().len(), SectionKind::ALL.len());
    }
}
