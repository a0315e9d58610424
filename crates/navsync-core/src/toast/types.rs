use serde::{Deserialize, Serialize};

use crate::clock::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
    /// Persistent until resolved or dismissed.
    Loading,
}

impl std::fmt::Display for ToastKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToastKind::Info => write!(f, "info"),
            ToastKind::Success => write!(f, "success"),
            ToastKind::Warning => write!(f, "warning"),
            ToastKind::Error => write!(f, "error"),
            ToastKind::Loading => write!(f, "loading"),
        }
    }
}

/// Display handle for one shown toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastId(pub u64);

impl std::fmt::Display for ToastId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "toast-{}", self.0)
    }
}

/// Deduplication key derived from message and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToastKey(String);

impl ToastKey {
    pub fn new(message: &str, kind: ToastKind) -> Self {
        Self(format!("{kind}:{message}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ToastKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToastRecord {
    pub key: ToastKey,
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    pub shown_at: Millis,
    /// `None` for persistent toasts.
    pub auto_expire_at: Option<Millis>,
    pub dismissed: bool,
}

impl ToastRecord {
    pub fn is_active(&self, now: Millis) -> bool {
        !self.dismissed && self.auto_expire_at.is_none_or(|at| now < at)
    }
}
