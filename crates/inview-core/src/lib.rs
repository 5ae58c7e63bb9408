pub mod activation;
pub mod config;
pub mod count_up;
pub mod error;
pub mod geometry;
pub mod host;
pub mod motion;
pub mod perf;
pub mod scenario;
pub mod scroll;
pub mod visibility;

pub use activation::{Activation, ActivationOptions, Rendered};
pub use config::{AppConfig, EasingType};
pub use count_up::{CountUp, CountUpOptions, CountUpState};
pub use error::{Error, Result};
pub use host::{Environment, PageHost, Simulation};
pub use perf::SectionMark;
pub use scenario::{Scenario, TraceRecord};
pub use scroll::{ScrollDirection, ScrollState, ScrollTracker, ScrollTrackerOptions};
pub use visibility::{VisibilityObserver, VisibilityOptions, VisibilityState};
