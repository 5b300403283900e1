use std::{
    fmt,
    fs::File,
    io,
    os::fd::AsFd,
    process::{Command, Stdio},
};

use log::{debug, info, warn};
use nix::{
    errno::Errno,
    fcntl::OFlag,
    poll::{poll, PollFd, PollFlags, PollTimeout},
    sys::{
        signal::{kill, Signal},
        wait::{waitpid, WaitPidFlag, WaitStatus},
    },
    unistd::{pipe2, Pid},
};

use crate::{
    catalog::describe,
    cli::TraceConfig,
    decoder::{render, Phase},
    errors::TraceError,
    event::{EventReader, Fill, TraceEvent},
    facility::{KernelFacility, TraceFacility},
    summary::Summary,
    threads::PhaseRegistry,
    writer::TraceWriter,
};

/// Launches one program under the kernel's tracer and prints its syscalls
/// until it exits.
pub struct TraceSession<F = KernelFacility> {
    config: TraceConfig,
    facility: F,
}

impl TraceSession<KernelFacility> {
    pub fn new(config: TraceConfig) -> Self {
        TraceSession::with_facility(config, KernelFacility)
    }
}

impl<F: TraceFacility> TraceSession<F> {
    pub fn with_facility(config: TraceConfig, facility: F) -> Self {
        TraceSession { config, facility }
    }

    /// Runs the session to completion and returns the traced program's
    /// exit status.
    pub fn run(self) -> Result<i32, TraceError> {
        let TraceSession { config, facility } = self;
        let Some((program, args)) = config.command.split_first() else {
            return Err(TraceError::EmptyCommand);
        };

        // open the sink first so a bad -o never leaves a half-started trace
        let writer = TraceWriter::open(config.output.as_deref())?;

        let (read_end, write_end) = pipe2(OFlag::O_CLOEXEC).map_err(TraceError::Pipe)?;
        debug!("trace pipe created");

        let mut command = Command::new(program);
        command.args(args);
        if config.mute_stdout {
            command.stdout(Stdio::null());
        }
        let child = command.spawn().map_err(|source| TraceError::Launch {
            program: program.clone(),
            source,
        })?;
        let child = Pid::from_raw(child.id() as i32);
        debug!("launched {program} as {child}");

        if let Err(errno) = facility.attach(child, write_end.as_fd()) {
            let _ = kill(child, Signal::SIGKILL);
            let _ = waitpid(child, None);
            return Err(TraceError::Attach(errno));
        }
        info!("tracing {child}");
        // the read side only sees end-of-stream once every writer is gone
        drop(write_end);

        let recorder = Recorder {
            child,
            events: EventReader::new(File::from(read_end)),
            threads: PhaseRegistry::new(),
            writer,
            summary: config.summary.then(Summary::default),
        };
        recorder.record()
    }
}

struct Recorder {
    child: Pid,
    events: EventReader<File>,
    threads: PhaseRegistry,
    writer: TraceWriter,
    summary: Option<Summary>,
}

impl Recorder {
    fn record(mut self) -> Result<i32, TraceError> {
        let mut exited = None;
        let status = loop {
            let end_of_stream = self.pump(PollTimeout::NONE)?;
            if exited.is_none() {
                exited = self.try_wait()?;
            }
            match (exited, end_of_stream) {
                (Some(status), true) => break status,
                (Some(status), false) if !self.has_pending()? => break status,
                // nothing more can arrive, the child just hasn't been reaped
                (None, true) => break self.wait()?,
                _ => {}
            }
        };
        let dropped = self.events.discard_partial();
        if dropped > 0 {
            warn!("discarding {dropped} bytes of an incomplete trace event");
        }
        debug!(
            "{} exited with {status} after {} thread(s)",
            self.child,
            self.threads.len()
        );
        self.finish(status)?;
        Ok(status)
    }

    /// Waits for the pipe and handles whatever one read brings in.
    /// Returns whether the stream has ended.
    fn pump(&mut self, timeout: PollTimeout) -> Result<bool, TraceError> {
        if self.readiness(timeout)?.is_empty() {
            return Ok(false);
        }
        match self.events.fill().map_err(TraceError::Read)? {
            Fill::Read(_) => {
                while let Some(event) = self.events.next_event() {
                    self.handle(event)?;
                }
                self.writer.flush()?;
                Ok(false)
            }
            Fill::EndOfStream => {
                debug!("trace stream ended");
                Ok(true)
            }
        }
    }

    fn readiness(&self, timeout: PollTimeout) -> Result<PollFlags, TraceError> {
        let mut fds = [PollFd::new(self.events.get_ref().as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, timeout) {
            Ok(_) => Ok(fds[0].revents().unwrap_or(PollFlags::empty())),
            Err(Errno::EINTR) => {
                warn!("poll interrupted, still waiting on {}", self.child);
                Ok(PollFlags::empty())
            }
            Err(errno) => Err(TraceError::Poll(errno)),
        }
    }

    fn has_pending(&self) -> Result<bool, TraceError> {
        Ok(self
            .readiness(PollTimeout::ZERO)?
            .contains(PollFlags::POLLIN))
    }

    fn handle(&mut self, event: TraceEvent) -> Result<(), TraceError> {
        let TraceEvent { tid, registers } = event;
        let phase = self.threads.phase_of(tid);
        let mut line = String::new();
        let next = render(&mut line, &registers, phase)
            .map_err(|fmt::Error| io::Error::other("could not format trace line"))?;
        match phase {
            Phase::ExpectingCall => {
                if let Some(summary) = self.summary.as_mut() {
                    summary.record(describe(registers.code()).name);
                }
                self.writer.write_call(tid, &line)?;
            }
            Phase::ExpectingReturn => self.writer.write_return(tid, &line)?,
        }
        self.threads.set_phase(tid, next);
        Ok(())
    }

    fn try_wait(&self) -> Result<Option<i32>, TraceError> {
        match waitpid(self.child, Some(WaitPidFlag::WNOHANG)) {
            Ok(status) => Ok(exit_status(status)),
            Err(Errno::EINTR) => Ok(None),
            Err(errno) => Err(TraceError::Wait(errno)),
        }
    }

    fn wait(&self) -> Result<i32, TraceError> {
        loop {
            match waitpid(self.child, None) {
                Ok(status) => {
                    if let Some(status) = exit_status(status) {
                        return Ok(status);
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(TraceError::Wait(errno)),
            }
        }
    }

    fn finish(mut self, status: i32) -> Result<(), TraceError> {
        self.writer.write_exit(status)?;
        if let Some(summary) = &self.summary {
            self.writer.write_raw(&format!("\n{}\n", summary.render()))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Exit code for a finished child, `128 + signal` when it was killed.
fn exit_status(status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, signal, _) => Some(128 + signal as i32),
        _ => None,
    }
}
