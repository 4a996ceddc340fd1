//! Gas-dynamic calculation over a single well-state snapshot
//!
//! Pure arithmetic over depth and pressure. No state, no I/O, no error paths:
//! a missing measurement is treated as `0.0`.
//!
//! ## Formulas
//! - effective pressure = pressure × 0.9
//! - required charges   = ⌊depth × pressure / 1000⌋ (0 when pressure ≤ 0)
//! - gas volume         = depth × 0.5
//! - impact duration    = pressure / 2 (0 when pressure ≤ 0)

use serde::{Deserialize, Serialize};

use crate::types::WellState;

/// Effective-to-formation pressure ratio.
pub const EFFECTIVE_PRESSURE_FACTOR: f64 = 0.9;

/// Depth-pressure product covered by one charge.
pub const CHARGE_DIVISOR: f64 = 1000.0;

/// Gas volume per metre of depth.
pub const GAS_VOLUME_PER_DEPTH: f64 = 0.5;

/// Derived metrics for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculatedMetrics {
    pub effective_pressure: f64,
    pub required_charges: i64,
    pub gas_volume: f64,
    pub impact_duration: f64,
}

/// Compute derived metrics from depth and pressure.
#[allow(clippy::cast_possible_truncation)]
pub fn compute(depth: f64, pressure: f64) -> CalculatedMetrics {
    let pressurised = pressure > 0.0;

    let required_charges = if pressurised {
        (depth * pressure / CHARGE_DIVISOR).floor() as i64
    } else {
        0
    };

    let impact_duration = if pressurised { pressure / 2.0 } else { 0.0 };

    CalculatedMetrics {
        effective_pressure: pressure * EFFECTIVE_PRESSURE_FACTOR,
        required_charges,
        gas_volume: depth * GAS_VOLUME_PER_DEPTH,
        impact_duration,
    }
}

/// Compute derived metrics for a stored snapshot.
pub fn calculate_from_well_state(state: &WellState) -> CalculatedMetrics {
    compute(state.depth.unwrap_or(0.0), state.pressure.unwrap_or(0.0))
}
