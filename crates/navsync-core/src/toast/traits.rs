use super::types::{ToastId, ToastKind};

/// Host notification primitive (toast stack, status bar, desktop banner).
///
/// Calls are fire-and-forget; display failures are the host's concern.
pub trait ToastDisplay {
    fn show(&mut self, id: ToastId, message: &str, kind: ToastKind);
    fn update(&mut self, id: ToastId, message: &str, kind: ToastKind);
    fn dismiss(&mut self, id: ToastId);
}
