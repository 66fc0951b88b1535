//! End-to-end sessions against the headless display.

use phosphor_core::command_queue::FontSize;
use phosphor_core::config::ConsoleConfig;
use phosphor_core::event::DisplayEvent;
use phosphor_core::geometry::{LOGICAL_MAX, Size};
use phosphor_core::link::DisplayLink;
use phosphor_runtime::headless::ServerCall;
use phosphor_runtime::pacing::ManualClock;
use phosphor_runtime::resize::ResizeState;
use phosphor_runtime::{Console, ConsoleWindow, DisplayServer, HeadlessDisplay};

fn console(size: Size) -> Console<HeadlessDisplay> {
    let clock = ManualClock::new(1_000);
    let config = ConsoleConfig::default()
        .with_size(size.width, size.height)
        .with_builtin_font(true);
    let link = DisplayLink::new(config.command_capacity);
    Console::new(config, HeadlessDisplay::new(clock.clone()), link)
        .unwrap()
        .with_sleeper(Box::new(clock))
}

fn pump_until_frame(console: &mut Console<HeadlessDisplay>) {
    loop {
        let event = console
            .server_mut()
            .next_event()
            .unwrap()
            .expect("session ended");
        let done = matches!(event, DisplayEvent::FrameDone { .. });
        console.handle_event(event).unwrap();
        if done {
            return;
        }
    }
}

#[test]
fn dot_and_character_are_visible_after_one_frame() {
    let mut c = console(Size::new(200, 150));
    c.start().unwrap();
    let link = c.link().clone();

    link.set_font(FontSize::Dot);
    link.set_x(0);
    link.set_y(LOGICAL_MAX);
    link.queue_char(1);
    link.set_font(FontSize::Small);
    link.set_x(8);
    link.set_y(LOGICAL_MAX);
    link.queue_char(b'A');
    pump_until_frame(&mut c);

    let frame = c.server().last_frame().unwrap();
    assert_eq!(frame.size, Size::new(200, 150));
    assert_eq!(frame.pixel(0, 0), Some(0xFF00_FF00));
    let lit_in_cell = (8..16)
        .flat_map(|x| (0..8).map(move |y| (x, y)))
        .filter(|&(x, y)| frame.pixel(x, y).is_some_and(|p| p & 0x0000_ff00 != 0))
        .count();
    assert!(lit_in_cell > 4, "glyph 'A' drawn in its cell");

    let in_glyph_cell = |x: u32, y: u32| (8..16).contains(&x) && y < 8;
    for y in 0..frame.size.height {
        for x in 0..frame.size.width {
            if (x, y) == (0, 0) || in_glyph_cell(x, y) {
                continue;
            }
            assert_eq!(frame.pixel(x, y), Some(0xFF00_0000), "stray pixel at ({x}, {y})");
        }
    }
}

#[test]
fn presented_frames_follow_the_protocol_order() {
    let mut c = console(Size::new(32, 32));
    c.start().unwrap();
    let calls = c.server().calls().to_vec();
    let tail: Vec<_> = calls
        .iter()
        .skip_while(|call| !matches!(call, ServerCall::Attach(_)))
        .cloned()
        .collect();
    assert!(matches!(tail[0], ServerCall::Attach(_)));
    assert_eq!(tail[1], ServerCall::Damage(Size::new(32, 32)));
    assert_eq!(tail[2], ServerCall::RequestFrame);
    assert_eq!(tail[3], ServerCall::Commit);
}

#[test]
fn resize_defers_frames_until_configured() {
    let mut c = console(Size::new(100, 80));
    c.start().unwrap();
    pump_until_frame(&mut c);

    c.handle_event(DisplayEvent::Configure {
        width: 160,
        height: 120,
    })
    .unwrap();
    assert_eq!(c.resize_state(), ResizeState::Pending(Size::new(160, 120)));

    // A frame-done while pending draws nothing new.
    let presented = c.server().presented();
    pump_until_frame(&mut c);
    assert_eq!(c.server().presented(), presented);
    assert_eq!(c.stats().deferred, 1);
    assert_eq!(c.server_mut().next_event().unwrap(), None);

    c.handle_event(DisplayEvent::SurfaceConfigure { serial: 7 })
        .unwrap();
    assert_eq!(c.resize_state(), ResizeState::Idle);
    assert!(c.server().calls().contains(&ServerCall::AckConfigure(7)));
    assert_eq!(c.image().size(), Size::new(160, 120));
    assert_eq!(c.y_map().height(), 120);

    // The frame loop restarts and presents at the new size.
    pump_until_frame(&mut c);
    assert_eq!(c.server().last_frame().unwrap().size, Size::new(160, 120));
    assert_eq!(c.stats().resizes, 1);
}

#[test]
fn scheduled_resize_round_trips_content() {
    let mut c = console(Size::new(64, 64));
    c.start().unwrap();
    c.link().set_font(FontSize::Dot);
    c.link().set_x(5);
    c.link().set_y(LOGICAL_MAX);
    c.link().queue_char(1);
    pump_until_frame(&mut c);
    let before = c.image().get(5, 0).unwrap();

    c.server_mut().schedule_resize(0, 32, 96);
    pump_until_frame(&mut c);
    assert_eq!(c.image().size(), Size::new(32, 96));
    // One decay per presented frame since the dot was drawn.
    assert_eq!(c.image().get(5, 0).unwrap().green(), before.green() >> 2);
}

#[test]
fn zero_size_hints_are_ignored() {
    let mut c = console(Size::new(40, 40));
    c.handle_event(DisplayEvent::Configure {
        width: 0,
        height: 0,
    })
    .unwrap();
    assert_eq!(c.resize_state(), ResizeState::Idle);
}

#[test]
fn threaded_session_shuts_down_cleanly() {
    let link = DisplayLink::new(256);
    let window = ConsoleWindow::spawn(link.clone(), |link| {
        let clock = ManualClock::new(0);
        let config = ConsoleConfig::default()
            .with_size(80, 60)
            .with_builtin_font(true);
        let display = HeadlessDisplay::new(clock.clone()).with_frame_limit(20);
        Ok(Console::new(config, display, link)?.with_sleeper(Box::new(clock)))
    })
    .unwrap();
    for (i, ch) in b"READY".iter().enumerate() {
        link.set_x(i as u16 * 8);
        link.set_y(LOGICAL_MAX);
        link.queue_char(*ch);
    }
    let stats = window.wait().unwrap();
    assert_eq!(stats.frames, 20);
    assert_eq!(stats.skipped, 0);
}
