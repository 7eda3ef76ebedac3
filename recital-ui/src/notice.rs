//! Transient status notices
//!
//! One notice at a time, visible for a fixed duration after it is posted.
//! Posting replaces whatever was showing.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

impl NoticeKind {
    pub fn label(self) -> &'static str {
        match self {
            NoticeKind::Info => "info",
            NoticeKind::Success => "ok",
            NoticeKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub posted_at: Instant,
}

#[derive(Debug, Clone)]
pub struct NoticeBoard {
    current: Option<Notice>,
    duration: Duration,
}

impl NoticeBoard {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            duration,
        }
    }

    pub fn post(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.post_at(kind, message, Instant::now());
    }

    pub fn post_at(&mut self, kind: NoticeKind, message: impl Into<String>, at: Instant) {
        self.current = Some(Notice {
            kind,
            message: message.into(),
            posted_at: at,
        });
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Notice still within its display window
    pub fn active(&self) -> Option<&Notice> {
        self.active_at(Instant::now())
    }

    pub fn active_at(&self, now: Instant) -> Option<&Notice> {
        self.current
            .as_ref()
            .filter(|notice| now.saturating_duration_since(notice.posted_at) < self.duration)
    }
}
