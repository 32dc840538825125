use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const MAX_NOTICES: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// An inline message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct NoticeLog {
    buffer: VecDeque<Notice>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(NoticeLevel::Info, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.record(NoticeLevel::Error, message.into());
    }

    fn record(&mut self, level: NoticeLevel, message: String) {
        if self.buffer.len() >= MAX_NOTICES {
            self.buffer.pop_front();
        }
        self.buffer.push_back(Notice { level, message });
    }

    /// Hands out everything recorded since the last drain.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.buffer.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.buffer.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Notice> {
        self.buffer.iter().filter(|n| n.level == NoticeLevel::Error)
    }
}
