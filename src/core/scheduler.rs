//! Activation scheduler - Time-triggered enable/disable transitions.
//!
//! Each pending transition is a row in `scheduled_transitions` keyed by its
//! kind, so there is at most one pending activation and one pending
//! deactivation. Rows are the source of truth: an armed Tokio timer only fires
//! if the row it was armed for is still there with the same instant, which
//! makes rescheduling a plain "replace the row, re-arm the timer". The
//! matching `activation_from`/`activation_until` setting is written in the
//! same transaction as the row, so the two never disagree.
//!
//! On startup [`ActivationScheduler::restore`] re-arms every persisted row;
//! instants already in the past fire immediately.

use crate::{
    core::{
        settings::{self, SettingKey},
        store::ConfigStore,
    },
    entities::{ScheduledTransition, scheduled_transition},
    errors::Result,
};
use chrono::{DateTime, SubsecRound, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::OnConflict};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// The two transitions the scheduler knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    /// Switch the autoresponder on
    Activate,
    /// Switch the autoresponder off
    Deactivate,
}

impl TransitionKind {
    /// Row id in `scheduled_transitions`.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
        }
    }

    /// Inverse of [`TransitionKind::id`].
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "activate" => Some(Self::Activate),
            "deactivate" => Some(Self::Deactivate),
            _ => None,
        }
    }

    /// Value written to `enabled` when the transition fires.
    #[must_use]
    pub const fn target_enabled(self) -> bool {
        matches!(self, Self::Activate)
    }

    /// Informational setting mirroring the scheduled instant.
    #[must_use]
    pub const fn window_key(self) -> SettingKey {
        match self {
            Self::Activate => SettingKey::ActivationFrom,
            Self::Deactivate => SettingKey::ActivationUntil,
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Result of scheduling a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// The instant had already passed; the transition was applied right away
    Fired,
    /// A timer is armed for the instant
    Pending {
        /// When the transition will fire
        effective_at: DateTime<Utc>,
    },
}

/// Owns the lifecycle of scheduled transitions.
#[derive(Debug)]
pub struct ActivationScheduler {
    store: ConfigStore,
    timers: Mutex<HashMap<TransitionKind, JoinHandle<()>>>,
}

impl ActivationScheduler {
    /// Creates a scheduler with no armed timers. Call [`Self::restore`] to
    /// pick up persisted transitions.
    #[must_use]
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Schedules the autoresponder to switch on at `at`.
    pub async fn schedule_activate_at(&self, at: DateTime<Utc>) -> Result<ScheduleOutcome> {
        self.schedule(TransitionKind::Activate, at).await
    }

    /// Schedules the autoresponder to switch off at `at`.
    pub async fn schedule_deactivate_at(&self, at: DateTime<Utc>) -> Result<ScheduleOutcome> {
        self.schedule(TransitionKind::Deactivate, at).await
    }

    /// Persists the transition, replacing any pending one of the same kind,
    /// and arms its timer.
    pub async fn schedule(
        &self,
        kind: TransitionKind,
        at: DateTime<Utc>,
    ) -> Result<ScheduleOutcome> {
        let effective_at = at.trunc_subsecs(0);
        {
            let _guard = self.store.lock_writes().await;
            let txn = self.store.database().begin().await?;
            let row = scheduled_transition::ActiveModel {
                id: Set(kind.id().to_string()),
                effective_at: Set(effective_at),
                target_enabled: Set(kind.target_enabled()),
                created_at: Set(Utc::now()),
            };
            ScheduledTransition::insert(row)
                .on_conflict(
                    OnConflict::column(scheduled_transition::Column::Id)
                        .update_columns([
                            scheduled_transition::Column::EffectiveAt,
                            scheduled_transition::Column::TargetEnabled,
                            scheduled_transition::Column::CreatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
            settings::set_setting(&txn, kind.window_key(), &settings::format_local(effective_at))
                .await?;
            txn.commit().await?;
        }
        info!(%kind, %effective_at, "Transition scheduled");
        self.arm(kind, effective_at).await
    }

    /// Re-arms every persisted transition. Returns how many were restored.
    pub async fn restore(&self) -> Result<usize> {
        let rows = self.pending().await?;
        let mut restored = 0;
        for row in rows {
            let Some(kind) = TransitionKind::from_id(&row.id) else {
                warn!(id = %row.id, "Ignoring scheduled transition with unknown id");
                continue;
            };
            self.arm(kind, row.effective_at).await?;
            restored += 1;
        }
        if restored > 0 {
            info!("Restored {} scheduled transition(s)", restored);
        }
        Ok(restored)
    }

    /// Cancels and deletes every pending transition and blanks both activation
    /// window settings in one transaction. Returns how many rows were removed.
    pub async fn clear(&self) -> Result<u64> {
        let removed = {
            let _guard = self.store.lock_writes().await;
            let txn = self.store.database().begin().await?;
            let removed = ScheduledTransition::delete_many()
                .exec(&txn)
                .await?
                .rows_affected;
            settings::set_setting(&txn, SettingKey::ActivationFrom, "").await?;
            settings::set_setting(&txn, SettingKey::ActivationUntil, "").await?;
            txn.commit().await?;
            removed
        };
        for (_, handle) in self.lock_timers().drain() {
            handle.abort();
        }
        info!("Cleared {} scheduled transition(s)", removed);
        Ok(removed)
    }

    /// Pending transitions, soonest first.
    pub async fn pending(&self) -> Result<Vec<scheduled_transition::Model>> {
        ScheduledTransition::find()
            .order_by_asc(scheduled_transition::Column::EffectiveAt)
            .all(self.store.database())
            .await
            .map_err(Into::into)
    }

    async fn arm(&self, kind: TransitionKind, effective_at: DateTime<Utc>) -> Result<ScheduleOutcome> {
        self.cancel_timer(kind);

        let now = Utc::now();
        if effective_at <= now {
            fire_transition(&self.store, kind, effective_at).await?;
            return Ok(ScheduleOutcome::Fired);
        }

        let delay = (effective_at - now).to_std().unwrap_or_default();
        let store = self.store.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = fire_transition(&store, kind, effective_at).await {
                error!(%kind, "Failed to apply scheduled transition: {}", e);
            }
        });
        self.lock_timers().insert(kind, handle);
        Ok(ScheduleOutcome::Pending { effective_at })
    }

    fn cancel_timer(&self, kind: TransitionKind) {
        if let Some(handle) = self.lock_timers().remove(&kind) {
            handle.abort();
        }
    }

    fn lock_timers(&self) -> std::sync::MutexGuard<'_, HashMap<TransitionKind, JoinHandle<()>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ActivationScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.lock_timers().drain() {
            handle.abort();
        }
    }
}

/// Applies the transition of `kind` if its row still holds `expected_at`:
/// writes `enabled` and deletes the row in one transaction under the store's
/// write lock. Returns `false` when the row was replaced or removed meanwhile.
pub async fn fire_transition(
    store: &ConfigStore,
    kind: TransitionKind,
    expected_at: DateTime<Utc>,
) -> Result<bool> {
    let _guard = store.lock_writes().await;

    let Some(row) = ScheduledTransition::find_by_id(kind.id().to_string())
        .one(store.database())
        .await?
    else {
        return Ok(false);
    };
    if row.effective_at != expected_at {
        return Ok(false);
    }

    let txn = store.database().begin().await?;
    let enabled = if row.target_enabled { "true" } else { "false" };
    settings::set_setting(&txn, SettingKey::Enabled, enabled).await?;
    ScheduledTransition::delete_by_id(kind.id().to_string())
        .exec(&txn)
        .await?;
    txn.commit().await?;

    info!(%kind, "Scheduled transition fired, enabled = {}", enabled);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{at, setup_test_store};
    use chrono::Duration;

    async fn enabled(store: &ConfigStore) -> Result<Option<String>> {
        store.get(SettingKey::Enabled).await
    }

    #[tokio::test]
    async fn test_past_activation_fires_immediately() -> Result<()> {
        let store = setup_test_store().await?;
        let scheduler = ActivationScheduler::new(store.clone());

        let outcome = scheduler
            .schedule_activate_at(at("2020-01-01T00:00:00Z"))
            .await?;

        assert_eq!(outcome, ScheduleOutcome::Fired);
        assert_eq!(enabled(&store).await?.as_deref(), Some("true"));
        assert!(scheduler.pending().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_past_deactivation_fires_immediately() -> Result<()> {
        let store = setup_test_store().await?;
        store.set(SettingKey::Enabled, "true").await?;
        let scheduler = ActivationScheduler::new(store.clone());

        let outcome = scheduler
            .schedule_deactivate_at(Utc::now() - Duration::minutes(5))
            .await?;

        assert_eq!(outcome, ScheduleOutcome::Fired);
        assert_eq!(enabled(&store).await?.as_deref(), Some("false"));
        Ok(())
    }

    #[tokio::test]
    async fn test_future_transition_stays_pending() -> Result<()> {
        let store = setup_test_store().await?;
        let scheduler = ActivationScheduler::new(store.clone());
        let when = at("2999-01-01T08:00:00Z");

        let outcome = scheduler.schedule_activate_at(when).await?;

        assert_eq!(outcome, ScheduleOutcome::Pending { effective_at: when });
        assert_eq!(enabled(&store).await?.as_deref(), Some("false"));
        let pending = scheduler.pending().await?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "activate");
        assert_eq!(pending[0].effective_at, when);
        assert!(pending[0].target_enabled);
        Ok(())
    }

    /// A whole-second instant at least one second from now.
    fn whole_second_ahead() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(0) + Duration::seconds(2)
    }

    /// Polls until `enabled` reads `expected` or `deadline` passes.
    async fn wait_for_enabled(
        store: &ConfigStore,
        expected: &str,
        deadline: DateTime<Utc>,
    ) -> Result<bool> {
        while Utc::now() < deadline {
            if enabled(store).await?.as_deref() == Some(expected) {
                return Ok(true);
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }
        Ok(enabled(store).await?.as_deref() == Some(expected))
    }

    // The timer tests run on the real clock: a paused Tokio clock auto-advances
    // while the test awaits the SQLite worker thread, which would fire armed
    // timers early and can trip the connection pool's acquire timeout.

    #[tokio::test]
    async fn test_timer_fires_at_effective_time() -> Result<()> {
        let store = setup_test_store().await?;
        let scheduler = ActivationScheduler::new(store.clone());

        let when = whole_second_ahead();
        let outcome = scheduler.schedule_activate_at(when).await?;
        assert_eq!(outcome, ScheduleOutcome::Pending { effective_at: when });
        assert_eq!(enabled(&store).await?.as_deref(), Some("false"));

        assert!(wait_for_enabled(&store, "true", when + Duration::seconds(10)).await?);
        assert!(Utc::now() >= when);
        assert!(scheduler.pending().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reschedule_cancels_previous_timer() -> Result<()> {
        let store = setup_test_store().await?;
        let scheduler = ActivationScheduler::new(store.clone());

        let soon = whole_second_ahead();
        let later = at("2999-01-01T00:00:00Z");
        scheduler.schedule_activate_at(soon).await?;
        scheduler.schedule_activate_at(later).await?;
        assert_eq!(scheduler.lock_timers().len(), 1);

        // Give the cancelled timer a chance to run past its instant
        assert!(!wait_for_enabled(&store, "true", soon + Duration::milliseconds(500)).await?);

        assert_eq!(enabled(&store).await?.as_deref(), Some("false"));
        let pending = scheduler.pending().await?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].effective_at, later);
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_fire_is_ignored() -> Result<()> {
        let store = setup_test_store().await?;
        let scheduler = ActivationScheduler::new(store.clone());
        let when = at("2999-01-01T00:00:00Z");
        scheduler.schedule_activate_at(when).await?;

        let stale = fire_transition(&store, TransitionKind::Activate, at("2998-01-01T00:00:00Z")).await?;
        assert!(!stale);
        assert_eq!(enabled(&store).await?.as_deref(), Some("false"));

        let current = fire_transition(&store, TransitionKind::Activate, when).await?;
        assert!(current);
        assert_eq!(enabled(&store).await?.as_deref(), Some("true"));

        // Nothing left to fire
        assert!(!fire_transition(&store, TransitionKind::Activate, when).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_restore_rearms_persisted_transitions() -> Result<()> {
        let store = setup_test_store().await?;
        {
            let first_run = ActivationScheduler::new(store.clone());
            first_run
                .schedule_deactivate_at(at("2999-06-01T00:00:00Z"))
                .await?;
        }
        // A row whose instant passed while the process was down
        ScheduledTransition::insert(scheduled_transition::ActiveModel {
            id: Set("activate".to_string()),
            effective_at: Set(at("2021-01-01T00:00:00Z")),
            target_enabled: Set(true),
            created_at: Set(at("2020-12-31T00:00:00Z")),
        })
        .exec_without_returning(store.database())
        .await?;

        let second_run = ActivationScheduler::new(store.clone());
        assert_eq!(second_run.restore().await?, 2);

        assert_eq!(enabled(&store).await?.as_deref(), Some("true"));
        let pending = second_run.pending().await?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "deactivate");
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_removes_everything() -> Result<()> {
        let store = setup_test_store().await?;
        let scheduler = ActivationScheduler::new(store.clone());
        scheduler.schedule_activate_at(at("2999-01-01T00:00:00Z")).await?;
        scheduler.schedule_deactivate_at(at("2999-02-01T00:00:00Z")).await?;

        assert!(!store.get(SettingKey::ActivationFrom).await?.unwrap_or_default().is_empty());
        assert!(!store.get(SettingKey::ActivationUntil).await?.unwrap_or_default().is_empty());

        assert_eq!(scheduler.clear().await?, 2);
        assert!(scheduler.pending().await?.is_empty());
        assert_eq!(store.get(SettingKey::ActivationFrom).await?.as_deref(), Some(""));
        assert_eq!(store.get(SettingKey::ActivationUntil).await?.as_deref(), Some(""));
        Ok(())
    }
}
