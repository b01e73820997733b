//! Toast notifications
//!
//! Short-lived status lines; one toast is visible at a time and a newer one
//! replaces it.

use std::time::Duration;

use tokio::time::Instant;

use crate::features::{StatusLevel, StatusMessage};

/// How long a toast stays up
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Toast notification style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastStyle {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastStyle {
    pub fn icon(&self) -> &'static str {
        match self {
            ToastStyle::Success => "✓",
            ToastStyle::Error => "✗",
            ToastStyle::Warning => "⚠",
            ToastStyle::Info => "ℹ",
        }
    }

    /// ANSI color used for the icon only
    pub fn ansi_color(&self) -> &'static str {
        match self {
            ToastStyle::Success => "\x1b[32m",
            ToastStyle::Error => "\x1b[31m",
            ToastStyle::Warning => "\x1b[33m",
            ToastStyle::Info => "\x1b[36m",
        }
    }
}

impl From<StatusLevel> for ToastStyle {
    fn from(level: StatusLevel) -> Self {
        match level {
            StatusLevel::Success => ToastStyle::Success,
            StatusLevel::Error => ToastStyle::Error,
            StatusLevel::Warning => ToastStyle::Warning,
            StatusLevel::Info => ToastStyle::Info,
        }
    }
}

/// Toast notification data
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub style: ToastStyle,
    shown_at: Instant,
}

impl Toast {
    pub fn new(message: impl Into<String>, style: ToastStyle) -> Self {
        Self {
            message: message.into(),
            style,
            shown_at: Instant::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, ToastStyle::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, ToastStyle::Error)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, ToastStyle::Info)
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= TOAST_DURATION
    }

    /// Single-line rendering, colored when `ansi` is set
    pub fn line(&self, ansi: bool) -> String {
        if ansi {
            format!(
                "{}{}\x1b[0m {}",
                self.style.ansi_color(),
                self.style.icon(),
                self.message
            )
        } else {
            format!("{} {}", self.style.icon(), self.message)
        }
    }
}

impl From<StatusMessage> for Toast {
    fn from(status: StatusMessage) -> Self {
        Self::new(status.text, status.level.into())
    }
}
