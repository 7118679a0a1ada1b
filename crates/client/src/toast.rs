use crate::store::ClientNotification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warning,
    Info,
}

impl ToastKind {
    pub fn for_type(notification_type: &str) -> Self {
        match notification_type {
            "booking_confirmed" | "booking_completed" | "payment_received" => ToastKind::Success,
            "booking_rejected" | "booking_cancelled" => ToastKind::Warning,
            _ => ToastKind::Info,
        }
    }
}

/// A transient alert raised for a freshly pushed notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub message: String,
}

impl From<&ClientNotification> for Toast {
    fn from(n: &ClientNotification) -> Self {
        Self {
            kind: ToastKind::for_type(&n.notification_type),
            title: n.title.clone(),
            message: n.message.clone(),
        }
    }
}
