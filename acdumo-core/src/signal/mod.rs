//! Signal computation, strategy selection and change detection.
//!
//! All three stages are pure functions of their arguments.

pub mod detector;
pub mod momentum;
pub mod selector;

pub use detector::{detect_notification, DEFAULT_TOLERANCE};
pub use momentum::{compute_signal, momentum_breakdown, HorizonReturn, MomentumBreakdown, HORIZON_MONTHS};
pub use selector::decide_strategy;
