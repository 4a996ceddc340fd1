//! Report workflows
//!
//! Every public workflow takes ownership of one open transaction, performs
//! all of its reads and writes through it, and ends it exactly once via
//! [`finish`]: commit on success, rollback on any error. A failed workflow
//! therefore never leaves partial rows behind (a new well state without its
//! report, a report without its calculation or owner record).
//!
//! ## Modules
//!
//! - `reconcile`   — reuse or append a well-state snapshot
//! - `permissions` — ownership / edit-right checks, share and revoke
//! - `reports`     — apply (create or update), copy, get, list, delete
//! - `catalog`     — users, locations, clusters, wells, raw well states

pub mod catalog;
pub mod permissions;
pub mod reconcile;
pub mod reports;

pub use permissions::{can_edit, grant, is_owner, revoke, revoke_access, share_report};
pub use reconcile::{reconcile, StateDecision};
pub use reports::{
    apply_report, copy_report, delete_report, get_report, list_all_reports, list_reports,
};

use tracing::warn;

use crate::error::HubResult;
use crate::store::StoreTx;

/// End a transaction according to the workflow outcome.
pub async fn finish<T: StoreTx, R>(tx: T, result: HubResult<R>) -> HubResult<R> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}
