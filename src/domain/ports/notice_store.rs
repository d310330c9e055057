//! Notice Store Port
//!
//! Per-session customer notices. A session holds the latest delivery
//! notice only.

use crate::domain::entities::DeliveryNotice;

/// Store for notices shown to a customer session.
pub trait NoticeStore: Send + Sync {
    /// Record a notice for the session.
    ///
    /// Returns false if the session already holds this exact notice. Any
    /// other notice held for the session is replaced.
    fn add_unique(&self, session_id: &str, notice: DeliveryNotice) -> bool;

    /// All notices for a session, oldest first.
    fn list(&self, session_id: &str) -> Vec<DeliveryNotice>;

    /// Drop all notices for a session. Returns how many were removed.
    fn clear(&self, session_id: &str) -> usize;
}
