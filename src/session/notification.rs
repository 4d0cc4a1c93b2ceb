use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// 一条面向用户的离散通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn info(title: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, title, message)
    }

    pub fn warning(title: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, title, message)
    }

    pub fn error(title: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, title, message)
    }

    fn new(severity: Severity, title: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.to_string(),
            message: message.into(),
            at: Utc::now(),
        }
    }
}

pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// 通知发送端；接收端关闭后改为写入日志，不静默丢弃
#[derive(Clone)]
pub struct Notifier {
    sender: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Self, NotificationReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn send(&self, notification: Notification) {
        if let Err(mpsc::error::SendError(undelivered)) = self.sender.send(notification) {
            tracing::warn!(
                title = %undelivered.title,
                "notification receiver closed: {}",
                undelivered.message
            );
        }
    }
}
