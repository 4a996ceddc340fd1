//! Well-state reconciliation
//!
//! An incoming measurement either matches the well's newest snapshot, in
//! which case that snapshot is reused, or it does not, in which case a new
//! snapshot is appended. History is never rewritten.

use tracing::debug;
use uuid::Uuid;

use crate::error::HubResult;
use crate::store::StoreTx;
use crate::types::WellState;

/// Outcome of reconciling one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct StateDecision {
    /// Snapshot the caller should reference.
    pub state: WellState,
    /// Whether `state` was inserted by this call.
    pub created: bool,
}

impl StateDecision {
    pub const fn state_id(&self) -> Uuid {
        self.state.id
    }
}

/// Compare one stored measurement against an incoming one.
///
/// Both absent counts as equal, one absent as different. Present values are
/// equal when they differ by at most `tolerance`; with `tolerance == 0.0`
/// this is exact equality. NaN never matches.
pub fn measurement_matches(stored: Option<f64>, incoming: Option<f64>, tolerance: f64) -> bool {
    match (stored, incoming) {
        (None, None) => true,
        (Some(a), Some(b)) => (a - b).abs() <= tolerance,
        _ => false,
    }
}

/// Whether `latest` already records the incoming depth and pressure.
pub fn is_duplicate(
    latest: &WellState,
    depth: Option<f64>,
    pressure: Option<f64>,
    tolerance: f64,
) -> bool {
    measurement_matches(latest.depth, depth, tolerance)
        && measurement_matches(latest.pressure, pressure, tolerance)
}

/// Reuse the newest snapshot for `well_id` if it matches, else append one.
pub async fn reconcile<T: StoreTx>(
    tx: &mut T,
    well_id: Uuid,
    depth: Option<f64>,
    pressure: Option<f64>,
    tolerance: f64,
) -> HubResult<StateDecision> {
    if let Some(latest) = tx.find_latest_well_state(well_id).await? {
        if is_duplicate(&latest, depth, pressure, tolerance) {
            debug!(well_id = %well_id, state_id = %latest.id, "Reusing latest well state");
            return Ok(StateDecision {
                state: latest,
                created: false,
            });
        }
    }

    let state = tx.insert_well_state(well_id, depth, pressure).await?;
    debug!(well_id = %well_id, state_id = %state.id, "Appended well state");
    Ok(StateDecision {
        state,
        created: true,
    })
}
