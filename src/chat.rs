//! Floating chat windows popped out of stream slots.
//!
//! Windows are keyed by `(channel, platform)` but live independently of the
//! slot model: closing or retargeting a slot leaves its popped-out chat alone.

use serde::Serialize;

use crate::arrange::Framed;
use crate::layout::{Frame, Point, Size};
use crate::platform::{chat_url, EmbedOptions, Platform};

/// Size of a freshly opened chat window.
pub const CHAT_DEFAULT_SIZE: Size = Size::new(400.0, 500.0);
/// Smallest size a chat window may be resized to.
pub const CHAT_MIN_SIZE: Size = Size::new(300.0, 300.0);
/// Origin of the first window; each further window cascades by `CHAT_CASCADE`.
pub const CHAT_FIRST_ORIGIN: f64 = 100.0;
pub const CHAT_CASCADE: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatWindow {
    pub channel: String,
    pub platform: Platform,
    pub position: Point,
    pub size: Size,
}

impl ChatWindow {
    pub fn embed_url(&self, opts: &EmbedOptions) -> String {
        chat_url(self.platform, &self.channel, opts)
    }
}

impl Framed for ChatWindow {
    fn frame(&self) -> Frame {
        Frame {
            origin: self.position,
            size: self.size,
        }
    }

    fn set_frame(&mut self, frame: Frame) {
        self.position = frame.origin;
        self.size = frame.size;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatPopouts {
    windows: Vec<ChatWindow>,
}

impl ChatPopouts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn windows(&self) -> &[ChatWindow] {
        &self.windows
    }

    pub(crate) fn windows_mut(&mut self) -> &mut [ChatWindow] {
        &mut self.windows
    }

    pub fn find(&self, channel: &str, platform: Platform) -> Option<usize> {
        self.windows
            .iter()
            .position(|w| w.channel == channel && w.platform == platform)
    }

    /// Pop out the chat for `(channel, platform)`. Returns the index of the
    /// new window, or `None` when one is already open.
    pub fn open(&mut self, channel: &str, platform: Platform) -> Option<usize> {
        if self.find(channel, platform).is_some() {
            tracing::debug!(channel, %platform, "chat already popped out");
            return None;
        }
        let offset = CHAT_FIRST_ORIGIN + CHAT_CASCADE * self.windows.len() as f64;
        self.windows.push(ChatWindow {
            channel: channel.to_string(),
            platform,
            position: Point::new(offset, offset),
            size: CHAT_DEFAULT_SIZE,
        });
        Some(self.windows.len() - 1)
    }

    pub fn close(&mut self, index: usize) -> Option<ChatWindow> {
        if index < self.windows.len() {
            Some(self.windows.remove(index))
        } else {
            None
        }
    }
}
