#![forbid(unsafe_code)]

//! Test card drawn by the demo engine.
//!
//! The phosphor fades within a few frames, so the card is redrawn before
//! every frame just like a real display program would refresh its screen.

use phosphor_core::command_queue::FontSize;
use phosphor_core::geometry::LOGICAL_MAX;
use phosphor_core::link::DisplayLink;
use std::f32::consts::TAU;

const MAX_TYPED: usize = 56;
const BORDER_STEP: usize = 4;

/// The demo's stand-in for an emulation engine.
#[derive(Debug, Default)]
pub struct TestCard {
    typed: Vec<u8>,
    keys: u64,
}

impl TestCard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Characters echoed on the prompt line.
    pub fn typed(&self) -> &[u8] {
        &self.typed
    }

    pub fn keys_seen(&self) -> u64 {
        self.keys
    }

    /// Consume the key register, if anything arrived.
    pub fn poll_key(&mut self, link: &DisplayLink) {
        let key = link.take_key();
        if key == 0 {
            return;
        }
        self.keys += 1;
        match key {
            b'\r' => self.typed.clear(),
            0x08 | 0x7f => {
                self.typed.pop();
            }
            k if k.is_ascii_graphic() || k == b' ' => {
                if self.typed.len() == MAX_TYPED {
                    self.typed.remove(0);
                }
                self.typed.push(k);
            }
            _ => {}
        }
    }

    /// Queue one full card for `frame`.
    pub fn draw(&self, link: &DisplayLink, frame: u64) {
        link.set_font(FontSize::Dot);
        for i in (0..=LOGICAL_MAX).step_by(BORDER_STEP) {
            for (x, y) in [(i, 0), (i, LOGICAL_MAX), (0, i), (LOGICAL_MAX, i)] {
                dot(link, x, y);
            }
        }

        let phase = (frame % 128) as f32 / 128.0;
        for x in (8..LOGICAL_MAX - 8).step_by(2) {
            let t = f32::from(x) / f32::from(LOGICAL_MAX) + phase;
            let y = 200.0 + 60.0 * (t * TAU).sin();
            dot(link, x, y as u16);
        }

        text(link, FontSize::Large, 128, 440, b"PHOSPHOR");
        text(link, FontSize::Medium, 160, 390, b"TEST CARD");
        text(link, FontSize::Small, 16, 40, format!("FRAME {frame:>6}").as_bytes());
        link.set_font(FontSize::Small);
        link.set_x(16);
        link.set_y(20);
        link.queue_char(b'>');
        link.queue_char(b' ');
        for &ch in &self.typed {
            link.queue_char(ch);
        }
    }
}

fn dot(link: &DisplayLink, x: u16, y: u16) {
    link.set_x(x);
    link.set_y(y);
    link.queue_char(1);
}

fn text(link: &DisplayLink, font: FontSize, x: u16, y: u16, s: &[u8]) {
    link.set_font(font);
    link.set_x(x);
    link.set_y(y);
    for &ch in s {
        link.queue_char(ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_fits_in_the_default_queue() {
        let link = DisplayLink::new(10_000);
        TestCard::new().draw(&link, 3);
        assert!(link.pending() > 512);
        assert_eq!(link.dropped(), 0);
    }

    #[test]
    fn keys_edit_the_prompt() {
        let link = DisplayLink::new(16);
        let mut card = TestCard::new();
        for k in [b'h', b'i', b'!', 0x7f] {
            link.post_key(k);
            card.poll_key(&link);
        }
        assert_eq!(card.typed(), b"hi");
        card.poll_key(&link);
        assert_eq!(card.keys_seen(), 4);

        link.post_key(b'\r');
        card.poll_key(&link);
        assert!(card.typed().is_empty());
    }

    #[test]
    fn prompt_keeps_the_latest_characters() {
        let link = DisplayLink::new(16);
        let mut card = TestCard::new();
        for i in 0..MAX_TYPED + 4 {
            link.post_key(b'a' + (i % 26) as u8);
            card.poll_key(&link);
        }
        assert_eq!(card.typed().len(), MAX_TYPED);
        assert_eq!(card.typed()[0], b'e');
    }
}
