use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{poll, read, Event, KeyCode, KeyModifiers};
use crossterm::terminal;
use log::LevelFilter;
use simple_logger::SimpleLogger;

use chip8vm::display::{Display, DummyDisplay, TermDisplay};
use chip8vm::{CancelToken, Machine, MachineConfig, RunOutcome};

/// Run a CHIP-8 program. Esc, q or Ctrl-C stops it.
#[derive(Parser, Debug)]
#[command(name = "chip8vm", version)]
struct Args {
    /// program image, loaded at 0x200
    program: PathBuf,

    /// don't take over the terminal
    #[arg(long)]
    headless: bool,

    /// stop after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,

    /// instructions per second; 0 runs flat out
    #[arg(long, default_value_t = 500)]
    clock_hz: u32,

    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

/// watch the keyboard for a quit key; raw mode must already be on
fn spawn_quit_watcher(cancel: CancelToken) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !cancel.is_cancelled() {
            match poll(Duration::from_millis(50)) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(_) => break,
            }
            if let Ok(Event::Key(evt)) = read() {
                match evt.code {
                    KeyCode::Esc | KeyCode::Char('q') => cancel.cancel(),
                    KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                        cancel.cancel()
                    }
                    _ => {}
                }
            }
        }
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    SimpleLogger::new().with_level(args.log_level).init()?;

    let mut config = MachineConfig::default().with_clock_hz(args.clock_hz);
    if let Some(steps) = args.max_steps {
        config = config.with_max_steps(steps);
    }

    // initialise
    let mut f = File::open(&args.program)?;
    let cancel = CancelToken::new();

    let outcome = if args.headless {
        let mut display = DummyDisplay::new();
        run(&mut f, &mut display, config, &cancel)
    } else {
        terminal::enable_raw_mode()?;
        let watcher = spawn_quit_watcher(cancel.clone());
        let outcome = match TermDisplay::new(64, 32) {
            Ok(mut display) => run(&mut f, &mut display, config, &cancel),
            Err(e) => Err(e.into()),
        };
        cancel.cancel();
        if watcher.join().is_err() {
            log::warn!("quit watcher thread panicked");
        }
        terminal::disable_raw_mode()?;
        // shove some junk on stdout to stop the cli messing up the last frame
        for _ in 0..4 {
            println!();
        }
        outcome
    };

    match outcome? {
        RunOutcome::Cancelled => log::info!("stopped"),
        RunOutcome::StepLimit => log::info!("step limit reached"),
    }
    Ok(())
}

fn run(
    f: &mut File,
    display: &mut dyn Display,
    config: MachineConfig,
    cancel: &CancelToken,
) -> Result<RunOutcome, Box<dyn Error>> {
    let mut machine = Machine::empty(display).with_config(config);
    let summary = machine.load_from(f)?;
    log::info!("loaded {} bytes", summary.loaded);
    let outcome = machine.run(cancel)?;
    machine.close();
    Ok(outcome)
}
