//! Entrypoint for CLI
use std::{
    env,
    error::Error,
    sync::mpsc,
    thread::JoinHandle,
    time::{Duration, Instant},
};

use chip8::{prelude::*, rom};
use log::{error, info, LevelFilter};

mod config;
mod error;
mod input;
mod machine;
mod terminal;

use self::{
    config::HostConf,
    error::{CliError, ErrorKind},
    input::KeyLatch,
    machine::{Command, Event, Machine},
    terminal::{TermInput, Terminal},
};

static USAGE: &str = r#"
usage: chip8 CMD FILE [OPTIONS]

commands:
    run     Run the target hex image file
    dis     Disassemble the target hex image into readable assembly

options:
    --config PATH   Host settings in YAML (run only)

keys:
    1 2 3 4
    q w e r     mapped to the keypad by default
    a s d f
    z x c v     Esc or Ctrl-C quits

examples:
    chip8 run breakout.hex
    chip8 run breakout.hex --config chip8.yaml
    chip8 dis breakout.hex
"#;

/// Interval between terminal redraws.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

fn run_rom(filepath: &str, config: Option<&str>) -> Result<(), CliError> {
    let conf = match config {
        Some(path) => HostConf::from_file(path)?,
        None => HostConf::default(),
    };

    let bytecode = rom::load_hex_file(filepath)?;

    let mut vm = Chip8Vm::with_conf(conf.vm_conf());
    vm.load_builtin_font()?;
    vm.load_bytecode(&bytecode)?;
    info!("loaded {} bytes from {filepath}", bytecode.len());

    let frames = FrameHandoff::new();
    let (tx, rx) = mpsc::channel();
    let (event_tx, events) = mpsc::channel();
    let handle = Machine::new(vm, frames.clone(), rx, event_tx).spawn();

    let bindings = conf.key_bindings();
    let mut latch = KeyLatch::new(Duration::from_millis(conf.key_hold_ms));

    {
        let mut term = Terminal::new()?;

        while !handle.is_finished() {
            let now = Instant::now();
            for key in latch.expire(now) {
                let _ = tx.send(Command::Key(key, false));
            }

            match term.poll_input(FRAME_INTERVAL)? {
                Some(TermInput::Quit) => break,
                Some(TermInput::Char(c)) => match bindings.map_char(c) {
                    Some(key) => {
                        if latch.press(key, now) {
                            let _ = tx.send(Command::Key(key, true));
                        }
                    }
                    None => log::trace!("no keypad mapping for {c:?}"),
                },
                None => {}
            }

            for event in events.try_iter() {
                match event {
                    Event::Beep => term.bell()?,
                }
            }

            if let Some(frame) = frames.take() {
                term.draw(&frame)?;
            }
        }
    }

    // The machine thread may have stopped already, in which case nobody is listening.
    let _ = tx.send(Command::Quit);

    join_machine(handle)
}

/// Wait for the machine thread, turning its fault or panic into an error.
fn join_machine(handle: JoinHandle<Chip8Result<()>>) -> Result<(), CliError> {
    match handle.join() {
        Ok(result) => result.map_err(CliError::from),
        Err(_) => Err(CliError {
            kind: ErrorKind::MachinePanic,
        }),
    }
}

fn run_disassembler(filepath: &str) -> Result<(), CliError> {
    let bytecode = rom::load_hex_file(filepath)?;
    let listing = Disassembler::new(&bytecode)
        .to_listing()
        .map_err(Chip8Error::from)?;
    print!("{listing}");
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    // The terminal renderer owns stdout, so only warnings are shown unless RUST_LOG says otherwise.
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .env()
        .init()?;

    let result = match parse_args(env::args().skip(1)) {
        Some(Cmd::Run { filepath, config }) => run_rom(&filepath, config.as_deref()),
        Some(Cmd::Dis { filepath }) => run_disassembler(&filepath),
        None => Err(CliError {
            kind: ErrorKind::Usage,
        }),
    };

    match result {
        Ok(()) => Ok(()),
        Err(CliError {
            kind: ErrorKind::Usage,
        }) => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
        Err(err) => {
            error!("{err}");
            std::process::exit(1)
        }
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Cmd> {
    let cmd = args.next()?;
    let filepath = args.next()?;

    match cmd.as_str() {
        "run" => {
            let mut config = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--config" => config = Some(args.next()?),
                    _ => return None,
                }
            }
            Some(Cmd::Run { filepath, config })
        }
        "dis" => match args.next() {
            Some(_) => None,
            None => Some(Cmd::Dis { filepath }),
        },
        _ => None,
    }
}

fn print_usage() {
    println!("chip8 v{}", env!("CARGO_PKG_VERSION"));
    println!("{USAGE}");
}

#[derive(Debug, PartialEq, Eq)]
enum Cmd {
    /// Run file
    Run {
        filepath: String,
        config: Option<String>,
    },
    /// Disassemble
    Dis { filepath: String },
}
