//! Deterministic fixed-point mathematics.
//!
//! Agent positions, waypoints and timers all use fixed-point arithmetic so a
//! simulation replays identically on every platform. Grid costs stay integer
//! (`u32`) and never pass through this module.

use fixed::types::I48F16;

pub use vec2::FixedVec2;

mod vec2;

/// Fixed-point number type used throughout the navigation layer.
///
/// I48F16: 48 integer bits, 16 fractional bits (precision ~0.000015).
pub type FixedNum = I48F16;

/// Convert seconds-per-tick from a tick rate without going through floats twice.
pub fn tick_delta(tick_rate: f64) -> FixedNum {
    if tick_rate <= 0.0 {
        return FixedNum::ZERO;
    }
    FixedNum::ONE / FixedNum::from_num(tick_rate)
}
