//! Supervision of external diagnostic programs.
//!
//! A [`ManagedProcess`] runs one program with its stdout and stderr merged
//! into a non-blocking [`PipeChannel`]. The owner calls
//! [`ManagedProcess::poll`] on every tick to collect fresh output and learn
//! whether the program has exited; nothing here ever blocks that tick.
//! [`ManagedProcess::stop`] terminates and reaps the program.
//!
//! [`ProcessSupervisor`] is the slot a console mode keeps its process in: it
//! owns at most one process at a time.

mod pipe;

use std::process::{Child, Command, Stdio};

use netdeck_common::error::ProcessError;
use tracing::{debug, warn};

pub use pipe::{ChannelStatus, Drained, PipeChannel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessState {
    /// The child has not been created yet.
    Spawning,
    Running,
    /// The child was reaped. The code is `None` when a signal ended it.
    Exited(Option<i32>),
    /// Supervision broke down; the reason is kept for display.
    Failed(String),
}

impl ProcessState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exited(_) | Self::Failed(_))
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Result of one [`ManagedProcess::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    /// Output produced since the previous poll.
    pub chunk: Vec<u8>,
    pub state: ProcessState,
}

#[derive(Debug)]
pub struct ManagedProcess {
    program: String,
    child: Child,
    channel: Option<PipeChannel>,
    state: ProcessState,
    reaped: bool,
}

impl ManagedProcess {
    /// Starts `program` with `args`, passed as-is (no shell involved).
    pub fn spawn<S: AsRef<str>>(program: &str, args: &[S]) -> Result<Self, ProcessError> {
        let args: Vec<String> = args.iter().map(|arg| arg.as_ref().to_string()).collect();
        let mut state = ProcessState::Spawning;

        let (channel, stdout_end) = PipeChannel::open().map_err(ProcessError::Resource)?;
        let stderr_end = stdout_end.try_clone().map_err(ProcessError::Resource)?;

        // The command holds our copies of the write end; it is dropped at the
        // end of this statement so the channel sees end-of-stream once the
        // child and its descendants are gone.
        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout_end))
            .stderr(Stdio::from(stderr_end))
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: program.to_string(),
                source,
            })?;

        advance(&mut state, ProcessState::Running);
        debug!(pid = child.id(), "spawned {program} {}", args.join(" "));

        Ok(Self {
            program: program.to_string(),
            child,
            channel: Some(channel),
            state,
            reaped: false,
        })
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn state(&self) -> &ProcessState {
        &self.state
    }

    /// Collects new output and checks for exit, without blocking.
    ///
    /// Once the exit is observed the channel is drained one last time, so
    /// output written right before exiting is part of the same outcome.
    pub fn poll(&mut self) -> PollOutcome {
        let mut chunk = Vec::new();
        if self.state.is_terminal() {
            return PollOutcome {
                chunk,
                state: self.state.clone(),
            };
        }

        if let Err(fault) = self.drain_into(&mut chunk) {
            self.fail(fault);
            return PollOutcome {
                chunk,
                state: self.state.clone(),
            };
        }

        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.reaped = true;
                match self.drain_into(&mut chunk) {
                    Ok(()) => {
                        debug!(pid = self.pid(), "{} exited with {status}", self.program);
                        advance(&mut self.state, ProcessState::Exited(status.code()));
                        self.channel = None;
                    }
                    Err(fault) => self.fail(fault),
                }
            }
            Ok(None) => {}
            Err(source) => {
                let pid = self.pid();
                self.fail(ProcessError::Reap { pid, source });
            }
        }

        PollOutcome {
            chunk,
            state: self.state.clone(),
        }
    }

    /// Sends SIGTERM if the child is still around and waits until it is reaped.
    ///
    /// There is no timeout: a program that ignores SIGTERM keeps this call
    /// waiting. Stopping an already finished process only releases the channel.
    pub fn stop(&mut self) -> Result<ProcessState, ProcessError> {
        if !self.reaped {
            self.terminate();
            let pid = self.pid();
            let status = self
                .child
                .wait()
                .map_err(|source| ProcessError::Reap { pid, source })?;
            self.reaped = true;
            debug!(pid, "{} stopped with {status}", self.program);
            advance(&mut self.state, ProcessState::Exited(status.code()));
        }
        self.channel = None;
        Ok(self.state.clone())
    }

    fn terminate(&self) {
        let Ok(pid) = libc::pid_t::try_from(self.child.id()) else {
            return;
        };
        // SAFETY: the child has not been reaped yet, so the pid still names it.
        if unsafe { libc::kill(pid, libc::SIGTERM) } == -1 {
            debug!(pid, "SIGTERM failed: {}", std::io::Error::last_os_error());
        }
    }

    fn drain_into(&mut self, out: &mut Vec<u8>) -> Result<(), ProcessError> {
        let Some(channel) = self.channel.as_mut() else {
            return Ok(());
        };
        let drained = channel.read().map_err(ProcessError::ReadFault)?;
        out.extend(drained.bytes);
        Ok(())
    }

    fn fail(&mut self, fault: ProcessError) {
        warn!(pid = self.pid(), "{}: {fault}", self.program);
        advance(&mut self.state, ProcessState::Failed(fault.to_string()));
        self.channel = None;
    }
}

impl Drop for ManagedProcess {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }
        // Best effort: a process dropped while running is killed so it can be reaped.
        if let Err(e) = self.child.kill() {
            debug!(pid = self.pid(), "kill on drop failed: {e}");
        }
        let _ = self.child.wait();
    }
}

/// Terminal states are final.
fn advance(state: &mut ProcessState, next: ProcessState) {
    if !state.is_terminal() {
        *state = next;
    }
}

/// Holds the process of one console mode.
#[derive(Debug, Default)]
pub struct ProcessSupervisor {
    process: Option<ManagedProcess>,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new process unless one is still running.
    ///
    /// A finished process still held by the supervisor is dropped (and
    /// reaped) in favour of the new one.
    pub fn start<S: AsRef<str>>(
        &mut self,
        program: &str,
        args: &[S],
    ) -> Result<&ManagedProcess, ProcessError> {
        if let Some(current) = &self.process {
            if !current.state().is_terminal() {
                return Err(ProcessError::AlreadyRunning { pid: current.pid() });
            }
        }
        self.process = None;
        let process = ManagedProcess::spawn(program, args)?;
        Ok(self.process.insert(process))
    }

    pub fn poll(&mut self) -> Option<PollOutcome> {
        self.process.as_mut().map(ManagedProcess::poll)
    }

    pub fn stop(&mut self) -> Result<Option<ProcessState>, ProcessError> {
        match self.process.as_mut() {
            Some(process) => process.stop().map(Some),
            None => Ok(None),
        }
    }

    pub fn state(&self) -> Option<&ProcessState> {
        self.process.as_ref().map(ManagedProcess::state)
    }

    pub fn is_running(&self) -> bool {
        self.state().is_some_and(ProcessState::is_running)
    }

    pub fn process(&self) -> Option<&ManagedProcess> {
        self.process.as_ref()
    }

    /// Hands the process over to the caller, leaving the slot empty.
    pub fn release(&mut self) -> Option<ManagedProcess> {
        self.process.take()
    }
}
