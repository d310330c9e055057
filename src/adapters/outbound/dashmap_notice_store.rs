//! DashMap Notice Store
//!
//! Implements NoticeStore using DashMap for concurrent access across sessions.
//! Sessions that go quiet are dropped by a background GC task.

use crate::domain::entities::DeliveryNotice;
use crate::domain::ports::NoticeStore;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Notices held for one session.
#[derive(Debug, Clone)]
struct SessionNotices {
    notices: Vec<DeliveryNotice>,
    stored_at: Instant,
}

/// DashMap-backed notice store keyed by session id.
pub struct DashMapNoticeStore {
    sessions: Arc<DashMap<String, SessionNotices>>,
}

impl DashMapNoticeStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Start the background garbage collection task.
    ///
    /// Removes sessions whose notice was stored more than `ttl` ago.
    pub fn start_gc(&self, ttl: Duration, interval: Duration) {
        let sessions = self.sessions.clone();

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let removed = Self::remove_expired(&sessions, ttl);
                if removed > 0 {
                    tracing::debug!("notice GC removed {} expired sessions", removed);
                }
            }
        });
    }

    /// Remove sessions older than `ttl` now. Returns how many were removed.
    pub fn cleanup_expired(&self, ttl: Duration) -> usize {
        Self::remove_expired(&self.sessions, ttl)
    }

    /// Number of sessions holding at least one notice.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn remove_expired(sessions: &DashMap<String, SessionNotices>, ttl: Duration) -> usize {
        let before = sessions.len();
        sessions.retain(|_, session| session.stored_at.elapsed() < ttl);
        before.saturating_sub(sessions.len())
    }
}

impl Default for DashMapNoticeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NoticeStore for DashMapNoticeStore {
    fn add_unique(&self, session_id: &str, notice: DeliveryNotice) -> bool {
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionNotices {
                notices: Vec::new(),
                stored_at: Instant::now(),
            });

        entry.stored_at = Instant::now();
        if entry.notices.iter().any(|existing| *existing == notice) {
            return false;
        }

        // A new product list supersedes the previous notice
        entry.notices.clear();
        entry.notices.push(notice);
        true
    }

    fn list(&self, session_id: &str) -> Vec<DeliveryNotice> {
        self.sessions
            .get(session_id)
            .map(|e| e.value().notices.clone())
            .unwrap_or_default()
    }

    fn clear(&self, session_id: &str) -> usize {
        self.sessions
            .remove(session_id)
            .map(|(_, session)| session.notices.len())
            .unwrap_or(0)
    }
}
