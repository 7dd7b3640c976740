//! Machine thread.
//!
//! The virtual machine is owned by a single thread, which is the only place
//! it is stepped or ticked. The terminal thread talks to it through a
//! command channel, and receives frames through a [`FrameHandoff`] and
//! events through a second channel.
use std::{
    sync::mpsc::{Receiver, Sender, TryRecvError},
    thread::{self, JoinHandle},
    time::Duration,
};

use chip8::prelude::*;

/// Message from the terminal thread to the machine thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Key(KeyCode, bool),
    Quit,
}

/// Message from the machine thread to the terminal thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The sound timer expired.
    Beep,
}

/// Upper bound on how long the machine thread sleeps between checks.
const MAX_IDLE: Duration = Duration::from_millis(2);

/// Most clock cycles run before commands are checked again.
///
/// Keeps the thread responsive when the clock interval is shorter than a step.
const MAX_CYCLES_PER_UPDATE: usize = 1024;

pub struct Machine {
    vm: Chip8Vm,
    cpu_clock: Clock,
    timer_clock: Clock,
    frames: FrameHandoff,
    commands: Receiver<Command>,
    events: Sender<Event>,
}

impl Machine {
    pub fn new(
        vm: Chip8Vm,
        frames: FrameHandoff,
        commands: Receiver<Command>,
        events: Sender<Event>,
    ) -> Self {
        let conf = vm.config();
        let cpu_clock = Clock::new(conf.clock_interval());
        let timer_clock = Clock::new(conf.timer_interval());

        Self {
            vm,
            cpu_clock,
            timer_clock,
            frames,
            commands,
            events,
        }
    }

    pub fn spawn(self) -> JoinHandle<Chip8Result<()>> {
        thread::spawn(move || self.run())
    }

    /// Run until told to quit, or until the program faults.
    pub fn run(mut self) -> Chip8Result<()> {
        log::info!(
            "machine running at {:?} per step",
            self.cpu_clock.interval()
        );

        self.cpu_clock.reset();
        self.timer_clock.reset();

        loop {
            if !self.handle_commands() {
                log::info!("machine stopped");
                return Ok(());
            }

            self.update()?;

            let idle = self
                .cpu_clock
                .remaining()
                .min(self.timer_clock.remaining())
                .min(MAX_IDLE);
            thread::sleep(idle);
        }
    }

    /// Apply pending commands. Returns `false` when the machine must stop.
    fn handle_commands(&mut self) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(Command::Key(key, pressed)) => self.vm.set_key(key, pressed),
                Ok(Command::Quit) | Err(TryRecvError::Disconnected) => return false,
                Err(TryRecvError::Empty) => return true,
            }
        }
    }

    /// Step and tick for the cycles that came due, then publish the display.
    ///
    /// Faults are returned to the caller, which reports them once the
    /// terminal is restored.
    fn update(&mut self) -> Chip8Result<()> {
        for _ in 0..MAX_CYCLES_PER_UPDATE {
            if !self.cpu_clock.tick() {
                break;
            }
            self.vm.step()?;
        }

        for _ in 0..MAX_CYCLES_PER_UPDATE {
            if !self.timer_clock.tick() {
                break;
            }
            if self.vm.tick_timers() {
                log::debug!("beep");
                // The terminal may already be gone while shutting down.
                let _ = self.events.send(Event::Beep);
            }
        }

        if let Some(frame) = self.vm.take_frame() {
            self.frames.publish(frame);
        }

        Ok(())
    }
}
