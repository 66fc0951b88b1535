#![forbid(unsafe_code)]

//! Phosphor demo binary entry point.
//!
//! Runs the console against a headless display, redraws a test card before
//! every frame and optionally saves the final frame as a PPM image.

mod card;
mod cli;

use card::TestCard;
use phosphor_core::event::{DisplayEvent, KeyEvent};
use phosphor_core::keysym::KeySym;
use phosphor_core::link::DisplayLink;
use phosphor_runtime::clipboard::{Clipboard, CommandClipboard};
use phosphor_runtime::pacing::ManualClock;
use phosphor_runtime::{Console, ConsoleError, DisplayServer, HeadlessDisplay};
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let opts = cli::Opts::parse();
    init_logging();

    if let Err(err) = run(opts) {
        eprintln!("phosphor-demo: {err}");
        process::exit(1);
    }
}

/// `RUST_LOG` filters, defaulting to `info`; `PHOSPHOR_LOG_JSON=1` switches
/// to JSON lines.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("PHOSPHOR_LOG_JSON").is_ok_and(|v| v == "1");
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn run(opts: cli::Opts) -> Result<(), Box<dyn Error>> {
    let clock = ManualClock::new(0);
    let clipboard = Box::new(CommandClipboard::wl_paste());
    let (mut console, link) = build_console(&opts, &clock, clipboard)?;

    link.set_active(true);
    let mut card = TestCard::new();
    let result = drive(&mut console, &link, &mut card);
    console.teardown();
    link.set_active(false);
    result?;

    let stats = console.stats();
    tracing::info!(
        frames = stats.frames,
        skipped = stats.skipped,
        slept_ms = stats.slept_ms,
        keys = card.keys_seen(),
        "demo finished"
    );

    if let Some(path) = &opts.snapshot {
        let frame = console
            .server()
            .last_frame()
            .ok_or("no frame was presented")?;
        frame.write_ppm(BufWriter::new(File::create(path)?))?;
        tracing::info!(
            path = %path.display(),
            width = frame.size.width,
            height = frame.size.height,
            "snapshot written"
        );
    }
    Ok(())
}

/// Headless display, typed keys and console as `opts` describe.
fn build_console(
    opts: &cli::Opts,
    clock: &ManualClock,
    clipboard: Box<dyn Clipboard>,
) -> Result<(Console<HeadlessDisplay>, DisplayLink), ConsoleError> {
    let mut display = if opts.realtime {
        HeadlessDisplay::real_time()
    } else {
        HeadlessDisplay::new(clock.clone())
    }
    .without_call_log();
    if opts.frames > 0 {
        display = display.with_frame_limit(opts.frames);
    }
    for ch in opts.typed.chars() {
        display.push_key(key_event(ch));
    }

    let link = DisplayLink::new(opts.config.command_capacity);
    let mut console =
        Console::new(opts.config.clone(), display, link.clone())?.with_clipboard(clipboard);
    if !opts.realtime {
        console = console.with_sleeper(Box::new(clock.clone()));
    }
    Ok((console, link))
}

/// The console's own loop, with the test card redrawn ahead of each frame.
fn drive(
    console: &mut Console<HeadlessDisplay>,
    link: &DisplayLink,
    card: &mut TestCard,
) -> Result<(), ConsoleError> {
    console.start()?;
    let mut frame = 0u64;
    while link.is_active()
        && let Some(event) = console.server_mut().next_event()?
    {
        if matches!(event, DisplayEvent::FrameDone { .. }) {
            card.poll_key(link);
            card.draw(link, frame);
            frame += 1;
        }
        console.handle_event(event)?;
    }
    Ok(())
}

fn key_event(ch: char) -> KeyEvent {
    match ch {
        '\n' => KeyEvent::released(KeySym::RETURN),
        _ => KeyEvent::char(ch),
    }
}
