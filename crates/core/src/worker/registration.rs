//! Page-side registration: scope, periodic update checks and the update notice.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::lifecycle::WorkerState;
use crate::config::AppConfig;

/// Registration scope.
pub const SCOPE: &str = "/";

pub const NOTICE_TITLE: &str = "🔄 新しいコンテンツが利用可能です";

pub const NOTICE_MESSAGE: &str = "最新の記事やコンテンツを表示するには、ページを更新してください。";

/// Buttons offered by the update notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UpdateAction {
    /// Reload the page.
    UpdateNow,
    /// Dismiss the notice.
    Later,
}

/// A dismissible, auto-expiring "new content available" notice.
#[derive(Debug, Clone)]
pub struct UpdateNotice {
    pub title: &'static str,
    pub message: &'static str,
    shown_at: Instant,
    ttl: Duration,
}

impl UpdateNotice {
    fn new(ttl: Duration) -> Self {
        Self { title: NOTICE_TITLE, message: NOTICE_MESSAGE, shown_at: Instant::now(), ttl }
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= self.ttl
    }

    pub fn remaining(&self) -> Duration {
        self.ttl.saturating_sub(self.shown_at.elapsed())
    }
}

pub struct Registration {
    check_interval: Duration,
    notice_ttl: Duration,
    notice: Mutex<Option<UpdateNotice>>,
}

impl Registration {
    pub fn new(check_interval: Duration, notice_ttl: Duration) -> Self {
        Self { check_interval, notice_ttl, notice: Mutex::new(None) }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.update_check_interval(), config.update_notice_ttl())
    }

    pub fn scope(&self) -> &'static str {
        SCOPE
    }

    /// Track a state change of a newly found worker.
    ///
    /// A worker reaching `Installed` while another one already controls the
    /// page means an update is waiting; the notice is shown. Returns whether
    /// a notice was raised.
    pub async fn on_worker_state(&self, state: WorkerState, has_controller: bool) -> bool {
        if state != WorkerState::Installed || !has_controller {
            return false;
        }
        tracing::info!("new worker installed, showing update notice");
        *self.notice.lock().await = Some(UpdateNotice::new(self.notice_ttl));
        true
    }

    /// The visible notice, if any. Expired notices are removed.
    pub async fn notice(&self) -> Option<UpdateNotice> {
        let mut notice = self.notice.lock().await;
        if notice.as_ref().is_some_and(UpdateNotice::is_expired) {
            tracing::debug!("update notice expired");
            *notice = None;
        }
        notice.clone()
    }

    /// Apply a notice button. Returns `None` when no notice was visible.
    pub async fn respond(&self, action: UpdateAction) -> Option<UpdateAction> {
        self.notice().await?;
        *self.notice.lock().await = None;
        tracing::debug!(?action, "update notice answered");
        Some(action)
    }

    /// Run `check` every check interval, starting one interval from now.
    pub fn spawn_update_checks<F, Fut>(&self, check: F) -> JoinHandle<()>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = self.check_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                tracing::debug!(every_secs = period.as_secs(), "checking for update");
                check().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registration() -> Registration {
        Registration::from_config(&AppConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_notice_only_for_waiting_update() {
        let reg = registration();
        assert_eq!(reg.scope(), "/");
        assert!(!reg.on_worker_state(WorkerState::Installed, false).await);
        assert!(!reg.on_worker_state(WorkerState::Activated, true).await);
        assert!(reg.notice().await.is_none());

        assert!(reg.on_worker_state(WorkerState::Installed, true).await);
        let notice = reg.notice().await.unwrap();
        assert_eq!(notice.title, NOTICE_TITLE);
        assert_eq!(notice.remaining(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_notice_expires_after_ttl() {
        let reg = registration();
        reg.on_worker_state(WorkerState::Installed, true).await;

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(reg.notice().await.is_some());
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(reg.notice().await.is_none());
        assert_eq!(reg.respond(UpdateAction::UpdateNow).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_respond_clears_notice() {
        let reg = registration();
        reg.on_worker_state(WorkerState::Installed, true).await;
        assert_eq!(reg.respond(UpdateAction::Later).await, Some(UpdateAction::Later));
        assert!(reg.notice().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_checks_run_hourly() {
        let reg = registration();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let handle = reg.spawn_update_checks(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(60 * 60 * 2 + 1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        handle.abort();
    }
}
