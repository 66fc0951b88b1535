#![forbid(unsafe_code)]

//! Command-line argument parsing for the phosphor demo.
//!
//! Parses args manually to keep the binary lean. Console settings start from
//! `ConsoleConfig::from_env()` (`PHOSPHOR_*`); demo-only settings accept
//! `PHOSPHOR_DEMO_*` overrides. Explicit flags win over both.

use phosphor_core::config::ConsoleConfig;
use std::env;
use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
Phosphor Demo: draws a test card on a headless console

USAGE:
    phosphor-demo [OPTIONS]

OPTIONS:
    --width=N            Window width in pixels (default: 1100)
    --height=N           Window height in pixels (default: 750)
    --frames=N           Stop after N frames, on a simulated clock (default: 60)
    --realtime           Pace frames on the wall clock instead
    --snapshot=PATH      Write the last presented frame as a PPM image
    --type=TEXT          Keystrokes fed to the console, echoed by the card
    --font=PATH          Load glyphs from this font file
    --builtin-font       Use the built-in bitmap font
    --help, -h           Show this help message
    --version, -V        Show version

ENVIRONMENT VARIABLES:
    PHOSPHOR_*                 Console settings (size, fonts, frame interval)
    PHOSPHOR_DEMO_FRAMES       Override --frames
    PHOSPHOR_DEMO_SNAPSHOT     Override --snapshot
    PHOSPHOR_DEMO_TYPE         Override --type
    PHOSPHOR_LOG_JSON          Emit logs as JSON lines when set to 1
    RUST_LOG                   Log filter (default: info)";

/// Parsed command-line options.
pub struct Opts {
    pub config: ConsoleConfig,
    /// Frames to present before exiting; zero runs until the window closes.
    pub frames: u64,
    /// Use the wall clock rather than a simulated one.
    pub realtime: bool,
    pub snapshot: Option<PathBuf>,
    /// Text typed into the console once it starts.
    pub typed: String,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            config: ConsoleConfig::default(),
            frames: 60,
            realtime: false,
            snapshot: None,
            typed: String::new(),
        }
    }
}

impl Opts {
    /// Parse command-line arguments and environment variables.
    pub fn parse() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        match Self::parse_from(ConsoleConfig::from_env(), |name| env::var(name).ok(), &args) {
            Ok(Parsed::Run(opts)) => opts,
            Ok(Parsed::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Parsed::Version) => {
                println!("phosphor-demo {VERSION}");
                process::exit(0);
            }
            Err(msg) => {
                eprintln!("{msg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    fn parse_from<F>(config: ConsoleConfig, lookup: F, args: &[String]) -> Result<Parsed, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self {
            config,
            ..Self::default()
        };

        // Environment first
        if let Some(val) = lookup("PHOSPHOR_DEMO_FRAMES")
            && let Ok(n) = val.trim().parse()
        {
            opts.frames = n;
        }
        if let Some(val) = lookup("PHOSPHOR_DEMO_SNAPSHOT")
            && !val.is_empty()
        {
            opts.snapshot = Some(PathBuf::from(val));
        }
        if let Some(val) = lookup("PHOSPHOR_DEMO_TYPE") {
            opts.typed = val;
        }

        // Flags override env vars
        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Parsed::Help),
                "--version" | "-V" => return Ok(Parsed::Version),
                "--realtime" => opts.realtime = true,
                "--builtin-font" => opts.config.builtin_font = true,
                other => {
                    if let Some(val) = other.strip_prefix("--width=") {
                        opts.config.size.width = positive(val, "--width")?;
                    } else if let Some(val) = other.strip_prefix("--height=") {
                        opts.config.size.height = positive(val, "--height")?;
                    } else if let Some(val) = other.strip_prefix("--frames=") {
                        opts.frames = val
                            .parse()
                            .map_err(|_| format!("Invalid --frames value: {val}"))?;
                    } else if let Some(val) = other.strip_prefix("--snapshot=") {
                        opts.snapshot = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--type=") {
                        opts.typed = val.to_string();
                    } else if let Some(val) = other.strip_prefix("--font=") {
                        opts.config.font_path = Some(PathBuf::from(val));
                    } else {
                        return Err(format!("Unknown argument: {other}"));
                    }
                }
            }
        }

        Ok(Parsed::Run(opts))
    }
}

enum Parsed {
    Run(Opts),
    Help,
    Version,
}

fn positive(val: &str, flag: &str) -> Result<u32, String> {
    match val.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("Invalid {flag} value: {val}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phosphor_core::geometry::Size;

    fn parse(env: &[(&str, &str)], args: &[&str]) -> Result<Opts, String> {
        let env: Vec<(String, String)> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let lookup = |name: &str| {
            env.iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        match Opts::parse_from(ConsoleConfig::default(), lookup, &args)? {
            Parsed::Run(opts) => Ok(opts),
            Parsed::Help => Err("help".into()),
            Parsed::Version => Err("version".into()),
        }
    }

    #[test]
    fn default_opts() {
        let opts = parse(&[], &[]).unwrap();
        assert_eq!(opts.frames, 60);
        assert!(!opts.realtime);
        assert!(opts.snapshot.is_none());
        assert!(opts.typed.is_empty());
        assert_eq!(opts.config.size, Size::new(1100, 750));
    }

    #[test]
    fn flags_set_console_fields() {
        let opts = parse(
            &[],
            &["--width=320", "--height=200", "--builtin-font", "--font=/tmp/x.ttf"],
        )
        .unwrap();
        assert_eq!(opts.config.size, Size::new(320, 200));
        assert!(opts.config.builtin_font);
        assert_eq!(opts.config.font_path, Some(PathBuf::from("/tmp/x.ttf")));
    }

    #[test]
    fn flags_override_env() {
        let opts = parse(
            &[("PHOSPHOR_DEMO_FRAMES", "5"), ("PHOSPHOR_DEMO_TYPE", "ab")],
            &["--frames=9"],
        )
        .unwrap();
        assert_eq!(opts.frames, 9);
        assert_eq!(opts.typed, "ab");
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(parse(&[], &["--width=0"]).is_err());
        assert!(parse(&[], &["--frames=lots"]).is_err());
        assert_eq!(
            parse(&[], &["--bogus"]).err().as_deref(),
            Some("Unknown argument: --bogus")
        );
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(parse(&[], &["-h", "--bogus"]).err().as_deref(), Some("help"));
        assert_eq!(parse(&[], &["-V"]).err().as_deref(), Some("version"));
    }

    #[test]
    fn help_text_lists_flags() {
        assert!(HELP_TEXT.contains("--snapshot"));
        assert!(HELP_TEXT.contains("PHOSPHOR_DEMO_FRAMES"));
        assert!(!VERSION.is_empty());
    }
}
