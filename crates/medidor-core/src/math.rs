//! Level conversion math for the measurement path.
//!
//! All functions are allocation-free and `no_std`-compatible. The floored
//! conversion is the one the analysis pipeline leans on: spectrum bins use
//! a −120 dB floor, RMS level tracking uses −100 dB, and a degenerate
//! magnitude (NaN/Inf from a zero-energy transform) is coerced to the floor
//! before any consumer can see it.

use libm::{expf, logf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use medidor_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Inputs at or below 1e-10 are clamped, bottoming out near −200 dB.
///
/// # Example
/// ```rust
/// use medidor_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    // 20 * log10(linear) = 20 * ln(linear) / ln(10)
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Convert linear gain to decibels with an explicit floor.
///
/// Gains at or below the floor's linear equivalent return exactly
/// `floor_db`. Non-finite gains (NaN, ±Inf) are treated as zero gain and
/// also return the floor, so degenerate transform output can never leak
/// into a display or a metric.
///
/// # Example
/// ```rust
/// use medidor_core::linear_to_db_floor;
///
/// assert_eq!(linear_to_db_floor(0.0, -120.0), -120.0);
/// assert_eq!(linear_to_db_floor(f32::NAN, -120.0), -120.0);
/// assert!((linear_to_db_floor(1.0, -120.0)).abs() < 0.001);
/// ```
#[inline]
pub fn linear_to_db_floor(linear: f32, floor_db: f32) -> f32 {
    let gain = if linear.is_finite() { linear } else { 0.0 };
    let db = linear_to_db(gain);
    if db < floor_db { floor_db } else { db }
}
