//! Motion primitives shared by the runtime units
//!
//! # Layers
//!
//! ## Atoms
//! - `easing` - Pure easing curves and name resolution
//! - `timing` - Progress and interpolation helpers
//! - `throttle` - Fixed-interval rate limiter
//!
//! The units in the crate root (`count_up`, `scroll`) combine these atoms
//! with host capabilities.

pub mod easing;
pub mod throttle;
pub mod timing;

pub use easing::EasingType;
pub use throttle::Throttle;
