use navsync_config::ToastConfig;
use serde::Serialize;

use super::traits::ToastDisplay;
use super::types::{ToastId, ToastKey, ToastKind, ToastRecord};
use crate::clock::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SuppressReason {
    /// Another toast was shown less than the minimum spacing ago.
    Spacing { remaining_ms: u64 },
    /// A toast with the same key is still active.
    Duplicate,
}

impl std::fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuppressReason::Spacing { remaining_ms } => {
                write!(f, "spacing, {remaining_ms}ms remaining")
            }
            SuppressReason::Duplicate => write!(f, "duplicate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Shown {
        id: ToastId,
        key: ToastKey,
        /// When the auto-dismiss timer should fire.
        expire_at: Option<Millis>,
    },
    Suppressed {
        key: ToastKey,
        reason: SuppressReason,
    },
}

impl NotifyOutcome {
    pub fn is_shown(&self) -> bool {
        matches!(self, NotifyOutcome::Shown { .. })
    }
}

/// Decides whether a toast is shown, suppressed, updated or dismissed.
///
/// Owns the records; the host display is passed in per call. Scheduling of
/// auto-dismiss timers is left to the caller, which gets the deadline back.
#[derive(Debug, Clone)]
pub struct NotificationCoordinator {
    config: ToastConfig,
    records: Vec<ToastRecord>,
    last_shown_at: Option<Millis>,
    next_id: u64,
}

impl NotificationCoordinator {
    pub fn new(config: ToastConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
            last_shown_at: None,
            next_id: 0,
        }
    }

    /// Auto-dismiss delay for `kind`; `None` means persistent.
    pub fn ttl_for(&self, kind: ToastKind) -> Option<u64> {
        match kind {
            ToastKind::Info => Some(self.config.info_ttl_ms()),
            ToastKind::Success => Some(self.config.success_ttl_ms()),
            ToastKind::Warning => Some(self.config.warning_ttl_ms()),
            ToastKind::Error => Some(self.config.error_ttl_ms()),
            ToastKind::Loading => None,
        }
    }

    pub fn notify(
        &mut self,
        message: &str,
        kind: ToastKind,
        now: Millis,
        display: &mut dyn ToastDisplay,
    ) -> NotifyOutcome {
        let key = ToastKey::new(message, kind);
        self.sweep(now, display);

        if let Some(last) = self.last_shown_at {
            let elapsed = now.saturating_sub(last);
            let spacing = self.config.min_spacing_ms();
            if elapsed < spacing {
                return NotifyOutcome::Suppressed {
                    key,
                    reason: SuppressReason::Spacing {
                        remaining_ms: spacing - elapsed,
                    },
                };
            }
        }

        if self.records.iter().any(|r| r.key == key && r.is_active(now)) {
            return NotifyOutcome::Suppressed {
                key,
                reason: SuppressReason::Duplicate,
            };
        }

        self.next_id += 1;
        let id = ToastId(self.next_id);
        let expire_at = self.ttl_for(kind).map(|ttl| now.saturating_add(ttl));
        self.records.push(ToastRecord {
            key: key.clone(),
            id,
            message: message.to_string(),
            kind,
            shown_at: now,
            auto_expire_at: expire_at,
            dismissed: false,
        });
        self.last_shown_at = Some(now);
        display.show(id, message, kind);

        NotifyOutcome::Shown { id, key, expire_at }
    }

    /// Replace an active toast's content in place, typically a loading toast
    /// becoming its success or error result. Does not count as a new show for
    /// spacing purposes.
    ///
    /// Returns the new auto-dismiss deadline, or `None` if the toast is gone,
    /// was dismissed because another toast already shows the new content, or
    /// the new kind is persistent.
    pub fn resolve(
        &mut self,
        id: ToastId,
        message: &str,
        kind: ToastKind,
        now: Millis,
        display: &mut dyn ToastDisplay,
    ) -> Option<Millis> {
        let key = ToastKey::new(message, kind);
        let duplicate = self
            .records
            .iter()
            .any(|r| r.id != id && r.key == key && r.is_active(now));
        let expire_at = self.ttl_for(kind).map(|ttl| now.saturating_add(ttl));

        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id && r.is_active(now))?;

        if duplicate {
            record.dismissed = true;
            display.dismiss(id);
            return None;
        }

        record.key = key;
        record.message = message.to_string();
        record.kind = kind;
        record.auto_expire_at = expire_at;
        display.update(id, message, kind);
        expire_at
    }

    /// Dismiss the active toast with `key`. Returns whether one was found.
    pub fn dismiss(&mut self, key: &ToastKey, display: &mut dyn ToastDisplay) -> bool {
        match self.records.iter_mut().find(|r| &r.key == key && !r.dismissed) {
            Some(record) => {
                record.dismissed = true;
                display.dismiss(record.id);
                true
            }
            None => false,
        }
    }

    pub fn dismiss_id(&mut self, id: ToastId, display: &mut dyn ToastDisplay) -> bool {
        match self.records.iter_mut().find(|r| r.id == id && !r.dismissed) {
            Some(record) => {
                record.dismissed = true;
                display.dismiss(id);
                true
            }
            None => false,
        }
    }

    /// Auto-dismiss timer callback. Ignores toasts that were resolved to a
    /// later deadline or already dismissed.
    pub fn expire(&mut self, id: ToastId, now: Millis, display: &mut dyn ToastDisplay) -> bool {
        let due = self.records.iter().any(|r| {
            r.id == id && !r.dismissed && r.auto_expire_at.is_some_and(|at| at <= now)
        });
        due && self.dismiss_id(id, display)
    }

    /// Force-dismiss everything still on screen. Returns how many toasts
    /// were removed from the display.
    pub fn dismiss_all(&mut self, display: &mut dyn ToastDisplay) -> usize {
        let mut dismissed = 0;
        for record in self.records.iter_mut().filter(|r| !r.dismissed) {
            record.dismissed = true;
            display.dismiss(record.id);
            dismissed += 1;
        }
        self.records.clear();
        dismissed
    }

    pub fn active(&self, now: Millis) -> impl Iterator<Item = &ToastRecord> {
        self.records.iter().filter(move |r| r.is_active(now))
    }

    pub fn get(&self, id: ToastId) -> Option<&ToastRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Take expired-but-undismissed toasts off the display and forget
    /// dismissed records.
    fn sweep(&mut self, now: Millis, display: &mut dyn ToastDisplay) {
        for record in self.records.iter_mut() {
            if !record.dismissed && !record.is_active(now) {
                record.dismissed = true;
                display.dismiss(record.id);
            }
        }
        self.records.retain(|r| !r.dismissed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RecordingDisplay;

    fn coordinator() -> NotificationCoordinator {
        NotificationCoordinator::new(ToastConfig::default())
    }

    #[test]
    fn test_first_notify_is_shown() {
        let mut toasts = coordinator();
        let mut display = RecordingDisplay::default();
        let outcome = toasts.notify("Refreshing data...", ToastKind::Info, 0, &mut display);

        assert!(outcome.is_shown());
        assert_eq!(display.visible_count(), 1);
        assert_eq!(toasts.active(0).count(), 1);
    }

    #[test]
    fn test_second_notify_within_spacing_suppressed() {
        let mut toasts = coordinator();
        let mut display = RecordingDisplay::default();
        toasts.notify("Refreshing data...", ToastKind::Info, 0, &mut display);

        let outcome = toasts.notify("Refreshing data...", ToastKind::Info, 4_000, &mut display);
        assert_eq!(
            outcome,
            NotifyOutcome::Suppressed {
                key: ToastKey::new("Refreshing data...", ToastKind::Info),
                reason: SuppressReason::Spacing { remaining_ms: 6_000 },
            }
        );
        assert_eq!(display.shown_count(), 1);
    }

    #[test]
    fn test_spacing_applies_across_keys() {
        let mut toasts = coordinator();
        let mut display = RecordingDisplay::default();
        toasts.notify("Saved", ToastKind::Success, 0, &mut display);
        assert!(!toasts.notify("Other", ToastKind::Info, 9_999, &mut display).is_shown());
        assert!(toasts.notify("Other", ToastKind::Info, 10_000, &mut display).is_shown());
    }

    #[test]
    fn test_active_duplicate_suppressed_after_spacing() {
        let mut toasts = coordinator();
        let mut display = RecordingDisplay::default();
        toasts.notify("Loading schedule", ToastKind::Loading, 0, &mut display);

        let outcome = toasts.notify("Loading schedule", ToastKind::Loading, 20_000, &mut display);
        assert!(matches!(
            outcome,
            NotifyOutcome::Suppressed {
                reason: SuppressReason::Duplicate,
                ..
            }
        ));
    }

    #[test]
    fn test_new_record_after_spacing_and_expiry() {
        let mut toasts = coordinator();
        let mut display = RecordingDisplay::default();
        toasts.notify("Refreshing data...", ToastKind::Info, 0, &mut display);
        toasts.notify("Refreshing data...", ToastKind::Info, 5_000, &mut display);

        let third = toasts.notify("Refreshing data...", ToastKind::Info, 13_000, &mut display);
        assert!(third.is_shown());
        assert_eq!(display.shown_count(), 2);
        assert_eq!(
            display.visible_count(),
            1,
            "the expired first toast is swept off the display"
        );
    }

    #[test]
    fn test_resolve_updates_loading_toast_in_place() {
        let mut toasts = coordinator();
        let mut display = RecordingDisplay::default();
        let NotifyOutcome::Shown { id, expire_at, .. } =
            toasts.notify("Refreshing data...", ToastKind::Loading, 0, &mut display)
        else {
            panic!("loading toast should be shown");
        };
        assert_eq!(expire_at, None);

        let deadline = toasts.resolve(id, "Data refreshed", ToastKind::Success, 1_200, &mut display);
        assert_eq!(deadline, Some(4_200));
        assert_eq!(display.updated_count(), 1);
        assert_eq!(toasts.get(id).unwrap().kind, ToastKind::Success);

        // Resolving is not a new show: spacing still measures from t=0.
        assert!(toasts.notify("Other", ToastKind::Info, 10_000, &mut display).is_shown());
    }

    #[test]
    fn test_resolve_missing_toast_returns_none() {
        let mut toasts = coordinator();
        let mut display = RecordingDisplay::default();
        assert!(toasts
            .resolve(ToastId(42), "Done", ToastKind::Success, 0, &mut display)
            .is_none());
    }

    #[test]
    fn test_expire_ignores_extended_deadline() {
        let mut toasts = coordinator();
        let mut display = RecordingDisplay::default();
        let NotifyOutcome::Shown { id, .. } =
            toasts.notify("Saving", ToastKind::Loading, 0, &mut display)
        else {
            panic!("expected shown");
        };
        toasts.resolve(id, "Saved", ToastKind::Success, 1_000, &mut display);

        assert!(!toasts.expire(id, 2_000, &mut display));
        assert!(toasts.expire(id, 4_000, &mut display));
        assert_eq!(display.visible_count(), 0);
    }

    #[test]
    fn test_dismiss_by_key() {
        let mut toasts = coordinator();
        let mut display = RecordingDisplay::default();
        toasts.notify("Loading", ToastKind::Loading, 0, &mut display);

        assert!(toasts.dismiss(&ToastKey::new("Loading", ToastKind::Loading), &mut display));
        assert!(!toasts.dismiss(&ToastKey::new("Loading", ToastKind::Loading), &mut display));
        assert_eq!(display.visible_count(), 0);
    }

    #[test]
    fn test_dismiss_all_clears_display() {
        let mut toasts = NotificationCoordinator::new(ToastConfig {
            min_spacing_ms: Some(0),
            ..Default::default()
        });
        let mut display = RecordingDisplay::default();
        toasts.notify("One", ToastKind::Loading, 0, &mut display);
        toasts.notify("Two", ToastKind::Info, 0, &mut display);

        assert_eq!(toasts.dismiss_all(&mut display), 2);
        assert_eq!(display.visible_count(), 0);
        assert_eq!(toasts.active(0).count(), 0);
    }
}
