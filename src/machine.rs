/// # machine
///
/// Glues a memory image to an interpreter and drives it. This is the bit
/// a host talks to: load a program, run it (or single-step it), close it.
///
/// The run loop steps as fast as possible, optionally sleeps between steps
/// to approximate a real clock, and checks the cancel token between
/// instructions (never in the middle of one).
use crate::config::MachineConfig;
use crate::display::Display;
use crate::error::{Result, VmError};
use crate::instruction::Instruction;
use crate::interpreter::Chip8Interpreter;
use crate::memory::{Chip8MemoryMap, LoadSummary};
use crate::registers::RegisterFile;
use log::{debug, info};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where a machine is in its life. Every public entry point checks this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// constructed, but nothing loaded yet
    Uninitialized,
    Ready,
    /// memory has been released; the machine can't be used again
    Closed,
}

/// Why `run` came back without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Cancelled,
    StepLimit,
}

/// Shared flag for stopping a running machine from elsewhere, e.g. a
/// keyboard thread or a signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct Machine<'a> {
    memory: Option<Chip8MemoryMap>,
    interpreter: Chip8Interpreter<'a>,
    config: MachineConfig,
    state: Lifecycle,
    steps: u64,
}

impl<'a> Machine<'a> {
    /// a machine with nothing loaded; `load` it before running
    pub fn empty(display: &'a mut dyn Display) -> Machine<'a> {
        Machine {
            memory: Some(Chip8MemoryMap::new()),
            interpreter: Chip8Interpreter::new(display),
            config: MachineConfig::default(),
            state: Lifecycle::Uninitialized,
            steps: 0,
        }
    }

    /// a machine with `program` loaded at 0x200, ready to run
    pub fn new(program: &[u8], display: &'a mut dyn Display) -> Machine<'a> {
        let mut m = Machine::empty(display);
        if let Some(memory) = m.memory.as_mut() {
            memory.load(program);
        }
        m.state = Lifecycle::Ready;
        m
    }

    pub fn with_config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// (re)load a program; registers and the stack start over too
    pub fn load(&mut self, program: &[u8]) -> Result<LoadSummary> {
        let summary = self.loadable_memory()?.load(program);
        self.restart();
        Ok(summary)
    }

    /// load a program of unknown length from a reader
    pub fn load_from(&mut self, reader: &mut impl io::Read) -> Result<LoadSummary> {
        let summary = self.loadable_memory()?.load_from(reader)?;
        self.restart();
        Ok(summary)
    }

    fn loadable_memory(&mut self) -> Result<&mut Chip8MemoryMap> {
        match self.state {
            Lifecycle::Closed => Err(VmError::Closed),
            _ => self.memory.as_mut().ok_or(VmError::Closed),
        }
    }

    fn restart(&mut self) {
        self.interpreter.reset();
        self.steps = 0;
        self.state = Lifecycle::Ready;
    }

    fn check_ready(&self) -> Result<()> {
        match self.state {
            Lifecycle::Uninitialized => Err(VmError::Uninitialized),
            Lifecycle::Closed => Err(VmError::Closed),
            Lifecycle::Ready => Ok(()),
        }
    }

    /// execute exactly one instruction
    pub fn step(&mut self) -> Result<Instruction> {
        self.check_ready()?;
        let memory = self.memory.as_mut().ok_or(VmError::Closed)?;
        let instruction = self.interpreter.step(memory)?;
        self.steps += 1;
        Ok(instruction)
    }

    /// step until cancelled, out of steps, or the program crashes
    pub fn run(&mut self, cancel: &CancelToken) -> Result<RunOutcome> {
        self.check_ready()?;
        info!("running from 0x{:03x}", self.cursor()?);
        let mut ran: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                debug!("cancelled after {} steps", ran);
                return Ok(RunOutcome::Cancelled);
            }
            if let Some(max) = self.config.max_steps {
                if ran >= max {
                    debug!("step limit of {} reached", max);
                    return Ok(RunOutcome::StepLimit);
                }
            }
            self.step()?;
            ran += 1;
            if let Some(interval) = self.config.step_interval {
                spin_sleep::sleep(interval);
            }
        }
    }

    /// release memory. safe to call any number of times, and from drop
    pub fn close(&mut self) {
        if self.state == Lifecycle::Closed {
            return;
        }
        self.memory = None;
        self.state = Lifecycle::Closed;
        debug!("machine closed after {} steps", self.steps);
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    pub fn memory(&self) -> Result<&Chip8MemoryMap> {
        self.memory.as_ref().ok_or(VmError::Closed)
    }

    pub fn cursor(&self) -> Result<u16> {
        Ok(self.memory()?.cursor())
    }

    pub fn registers(&self) -> &RegisterFile {
        self.interpreter.registers()
    }

    pub fn interpreter(&self) -> &Chip8Interpreter<'a> {
        &self.interpreter
    }

    /// steps executed since the program was loaded
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }
}

impl Drop for Machine<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_new_is_ready() -> Result<()> {
        let mut display = DummyDisplay::new();
        let m = Machine::new(&[0x60, 0x05], &mut display);
        assert_eq!(m.state(), Lifecycle::Ready);
        assert_eq!(m.cursor()?, 0x200);
        assert_eq!(m.registers(), &RegisterFile::new());
        Ok(())
    }

    #[test]
    fn test_empty_refuses_to_run() {
        let mut display = DummyDisplay::new();
        let mut m = Machine::empty(&mut display);
        assert_eq!(m.state(), Lifecycle::Uninitialized);
        assert!(matches!(m.step(), Err(VmError::Uninitialized)));
        assert!(matches!(m.run(&CancelToken::new()), Err(VmError::Uninitialized)));
    }

    #[test]
    fn test_load_makes_ready() -> Result<()> {
        let mut display = DummyDisplay::new();
        let mut m = Machine::empty(&mut display);
        let summary = m.load(&[0x61, 0x09])?;
        assert_eq!(summary.loaded, 2);
        assert_eq!(m.state(), Lifecycle::Ready);
        m.step()?;
        assert_eq!(m.registers().get(1)?, 9);
        Ok(())
    }

    #[test]
    fn test_load_from_reader() -> Result<()> {
        let mut display = DummyDisplay::new();
        let mut m = Machine::empty(&mut display);
        let mut prog: &[u8] = &[0x6f, 0x10];
        m.load_from(&mut prog)?;
        m.step()?;
        assert_eq!(m.registers().get(0xf)?, 0x10);
        Ok(())
    }

    #[test]
    fn test_reload_resets_registers() -> Result<()> {
        let mut display = DummyDisplay::new();
        let mut m = Machine::new(&[0x60, 0x05, 0x22, 0x00], &mut display);
        m.step()?;
        m.step()?;
        m.load(&[0x00, 0xee])?;
        assert_eq!(m.registers().get(0)?, 0);
        assert_eq!(m.steps(), 0);
        assert!(m.interpreter().stack().is_empty());
        Ok(())
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut display = DummyDisplay::new();
        let mut m = Machine::new(&[0x12, 0x00], &mut display);
        m.close();
        m.close();
        assert_eq!(m.state(), Lifecycle::Closed);
        assert!(matches!(m.step(), Err(VmError::Closed)));
        assert!(matches!(m.memory(), Err(VmError::Closed)));
        assert!(matches!(m.load(&[0x00]), Err(VmError::Closed)));
        let mut prog: &[u8] = &[0x00];
        assert!(matches!(m.load_from(&mut prog), Err(VmError::Closed)));
        assert!(matches!(m.run(&CancelToken::new()), Err(VmError::Closed)));
    }

    #[test]
    fn test_run_honours_step_limit() -> Result<()> {
        let mut display = DummyDisplay::new();
        // jump to self forever
        let mut m = Machine::new(&[0x12, 0x00], &mut display)
            .with_config(MachineConfig::default().with_max_steps(100));
        assert_eq!(m.run(&CancelToken::new())?, RunOutcome::StepLimit);
        assert_eq!(m.steps(), 100);
        assert_eq!(m.cursor()?, 0x200);
        Ok(())
    }

    #[test]
    fn test_run_stops_when_already_cancelled() -> Result<()> {
        let mut display = DummyDisplay::new();
        let mut m = Machine::new(&[0x12, 0x00], &mut display);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(m.run(&cancel)?, RunOutcome::Cancelled);
        assert_eq!(m.steps(), 0);
        Ok(())
    }

    #[test]
    fn test_run_cancelled_from_another_thread() -> Result<()> {
        let mut display = DummyDisplay::new();
        let mut m = Machine::new(&[0x12, 0x00], &mut display)
            .with_config(MachineConfig::default().with_clock_hz(10_000));
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });
        assert_eq!(m.run(&cancel)?, RunOutcome::Cancelled);
        handle.join().expect("cancel thread panicked");
        assert!(m.steps() > 0);
        Ok(())
    }

    #[test]
    fn test_run_propagates_crash() {
        let mut display = DummyDisplay::new();
        // jump to the last byte; the second half of the fetch falls off the end
        let mut m = Machine::new(&[0x1f, 0xff], &mut display);
        assert!(matches!(
            m.run(&CancelToken::new()),
            Err(VmError::OutOfBounds(0x1000))
        ));
        assert_eq!(m.steps(), 1);
        // the crashed fetch doesn't move the program counter
        assert!(matches!(m.cursor(), Ok(0xfff)));
    }
}
