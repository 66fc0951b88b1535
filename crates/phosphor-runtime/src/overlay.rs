#![forbid(unsafe_code)]

//! Text drawn by the console itself, on top of the engine's display list.

use crate::fonts::FontSet;
use phosphor_core::command_queue::FontSize;
use phosphor_core::geometry::{PenPosition, YOffsetMap};
use phosphor_core::link::DisplayLink;
use phosphor_render::gamma::GammaTable;
use phosphor_render::image::LogicalImage;
use phosphor_render::raster::draw_string;

pub const PAUSED_MESSAGE: &str = "Emulation paused";
pub const REMOTE_MESSAGE: &str = "Remote console active";
pub const CLOSE_NOTICE: [&str; 2] = [
    "Please don't just close the window, but instead first cleanly halt the operating system and",
    "then use the 'shutdown' command in the operator interface to terminate the emulation.",
];

const MESSAGE_X: i32 = 20;
const MESSAGE_ROW: u16 = 256;
const NOTICE_SECOND_ROW: u16 = 275;
const STATUS_ROW: u16 = 10;

/// Whether the engine's display list should be drawn this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPass {
    DrawList,
    /// The close notice covers the screen; pending commands are dropped.
    SkipList,
}

/// Overlay state carried across frames.
#[derive(Debug, Clone)]
pub struct Overlays {
    notice_frames: u32,
    notice_left: u32,
    show_trace_status: bool,
}

impl Overlays {
    #[must_use]
    pub fn new(notice_frames: u32, show_trace_status: bool) -> Self {
        Self {
            notice_frames,
            notice_left: 0,
            show_trace_status,
        }
    }

    /// The user asked to close the window: show the usage notice.
    pub fn on_close_request(&mut self) {
        self.notice_left = self.notice_frames;
        tracing::info!(frames = self.notice_frames, "close requested, showing notice");
    }

    #[inline]
    pub fn notice_active(&self) -> bool {
        self.notice_left > 0
    }

    /// Status line text for `frame`.
    pub fn status_line(frame: u64, link: &DisplayLink) -> String {
        format!(
            "Refresh: {frame:<10}  Trace: {}",
            link.trace_mask().status_string()
        )
    }

    /// Draw this frame's overlays.
    pub fn draw(
        &mut self,
        image: &mut LogicalImage,
        gamma: &GammaTable,
        fonts: &mut FontSet,
        y_map: &YOffsetMap,
        link: &DisplayLink,
        frame: u64,
    ) -> OverlayPass {
        let at = |x: i32, row: u16| PenPosition::from_pixels(x, i32::from(y_map.row(row)));

        if self.show_trace_status
            && let Some(font) = fonts.get_mut(FontSize::Small)
        {
            let line = Self::status_line(frame, link);
            draw_string(image, gamma, font, line.as_bytes(), at(0, STATUS_ROW));
        }

        let status = if link.is_paused() {
            Some(PAUSED_MESSAGE)
        } else if link.is_remote_active() {
            Some(REMOTE_MESSAGE)
        } else {
            None
        };
        if let Some(message) = status
            && let Some(font) = fonts.get_mut(FontSize::Large)
        {
            draw_string(image, gamma, font, message.as_bytes(), at(MESSAGE_X, MESSAGE_ROW));
        }

        if self.notice_left == 0 {
            return OverlayPass::DrawList;
        }
        if let Some(font) = fonts.get_mut(FontSize::Medium) {
            for (line, row) in CLOSE_NOTICE.iter().zip([MESSAGE_ROW, NOTICE_SECOND_ROW]) {
                draw_string(image, gamma, font, line.as_bytes(), at(MESSAGE_X, row));
            }
        }
        self.notice_left -= 1;
        OverlayPass::SkipList
    }
}
