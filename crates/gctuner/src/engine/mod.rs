//! The decision engine
//!
//! Pure functions over the current sample and the history rings: the
//! control law that proposes a target ratio, the confidence estimator
//! that scores the evidence behind it, and the oscillation guard that
//! suppresses direction-flapping.

pub mod confidence;
pub mod control;
pub mod oscillation;
