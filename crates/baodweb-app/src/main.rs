//! BaodWeb terminal entry point.
//!
//! Takes over the screen, opens the start page (or `--open <path>`) and
//! runs the command loop: lines typed at the prompt are dispatched to the
//! command registry, and between lines the loop applies finished page
//! loads and follows terminal resizes. Logs go to `baodweb.log` in the
//! data directory so they never land on the painted screen.

mod terminal;

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;

use anyhow::{Context, Result};

use baodweb_browser::loader::{DEFAULT_TIMEOUT, HOME_URL, local};
use baodweb_browser::session::POLL_INTERVAL;
use baodweb_browser::{CommandOutput, CommandRegistry, Config, ConfigStore, Loader, Session};
use baodweb_types::ColorMode;

use terminal::TerminalGuard;

const LOG_FILE: &str = "baodweb.log";

const USAGE: &str = "\
Usage: baodweb [OPTIONS]

Options:
  --open <path>   Start on a local HTML file instead of the start page
  --debug         Write debug-level logs to baodweb.log
  -v, --version   Print version and exit
  -h, --help      Print this help and exit

Environment:
  BAODWEB_HOME    Data directory (start pages, test-pages/, config)
  RUST_LOG        Log filter, overrides --debug
";

/// What the command line asks for.
#[derive(Debug, PartialEq, Eq)]
enum Cli {
    Run { debug: bool, open: Option<String> },
    Version,
    Help,
    Invalid(String),
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Cli {
    let mut debug = false;
    let mut open = None;
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" | "--version" => return Cli::Version,
            "-h" | "--help" => return Cli::Help,
            "--debug" => debug = true,
            "--open" => match args.next() {
                Some(path) => open = Some(path),
                None => return Cli::Invalid(arg),
            },
            _ => return Cli::Invalid(arg),
        }
    }
    Cli::Run { debug, open }
}

/// Send logs to the log file. Without one, logging stays off rather than
/// writing over the screen.
fn init_logging(data_dir: &Path, debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    let path = data_dir.join(LOG_FILE);
    match File::create(&path) {
        Ok(file) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        },
        Err(e) => eprintln!("baodweb: cannot open {}: {e}; logging disabled", path.display()),
    }
}

fn detect_color_mode() -> ColorMode {
    let colorterm = std::env::var("COLORTERM").ok();
    let term = std::env::var("TERM").ok();
    let no_color = std::env::var_os("NO_COLOR").is_some();
    ColorMode::detect(colorterm.as_deref(), term.as_deref(), no_color)
}

/// Lines from stdin, read on their own thread.
fn spawn_reader() -> Result<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("cannot start the input reader")?;
    Ok(rx)
}

fn run(term: &mut TerminalGuard, session: &mut Session, registry: &CommandRegistry) -> Result<()> {
    let lines = spawn_reader()?;
    let mut dirty = true;
    loop {
        // Load failures are already in the status line.
        if session.poll().is_some() {
            dirty = true;
        }
        let (width, height) = term.size()?;
        if (width, height) != session.size() {
            session.resize(width, height);
            dirty = true;
        }
        if dirty {
            term.draw(&session.frame(""))?;
            dirty = false;
        }
        match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                dirty = true;
                if registry.execute(&line, session) == CommandOutput::Quit {
                    break;
                }
            },
            Err(RecvTimeoutError::Timeout) => {},
            Err(RecvTimeoutError::Disconnected) => {
                log::info!("input closed");
                break;
            },
        }
    }
    session.cancel();
    Ok(())
}

fn main() -> Result<()> {
    let (debug, open) = match parse_args(std::env::args().skip(1)) {
        Cli::Run { debug, open } => (debug, open),
        Cli::Version => {
            println!("baodweb {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        },
        Cli::Help => {
            print!("{USAGE}");
            return Ok(());
        },
        Cli::Invalid(arg) => {
            eprintln!("baodweb: unexpected argument '{arg}'\n\n{USAGE}");
            std::process::exit(2);
        },
    };

    let data_dir = local::data_dir();
    init_logging(&data_dir, debug);
    log::info!("starting BaodWeb {} in {}", env!("CARGO_PKG_VERSION"), data_dir.display());

    let store = ConfigStore::in_dir(&data_dir);
    let config = store.load().unwrap_or_else(|e| {
        log::warn!("{}: {e}; using defaults", store.path().display());
        Config::default()
    });
    let color_mode = detect_color_mode();
    log::debug!("color mode {color_mode:?}");

    let mut term = TerminalGuard::enter().context("cannot initialise the terminal")?;
    let (width, height) = term.size().context("cannot read the terminal size")?;

    let loader = Loader::new(&data_dir, DEFAULT_TIMEOUT);
    let mut session = Session::new(Arc::new(loader), config, width, height)
        .with_store(store)
        .with_color_mode(color_mode);
    let registry = CommandRegistry::with_browser_commands();

    let start = open.as_deref().unwrap_or(HOME_URL);
    if let Err(e) = session.go(start) {
        session.set_status(e.to_string());
    }

    run(&mut term, &mut session, &registry)?;
    log::info!("exiting");
    Ok(())
}
