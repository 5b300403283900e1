use std::{io, path::PathBuf};

use nix::errno::Errno;
use thiserror::Error;

/// Exit status for failures of the tracer itself, kept apart from the
/// statuses a traced program usually reports.
pub const TRACER_FAILURE: u8 = 125;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("trace: could not open output file {}: {source}", path.display())]
    Output { path: PathBuf, source: io::Error },

    #[error("trace: no command to trace")]
    EmptyCommand,

    #[error("trace: could not create pipes: {0}")]
    Pipe(Errno),

    #[error("trace: could not launch program '{program}': {source}")]
    Launch { program: String, source: io::Error },

    #[error("trace: could not do ptrace: {0}")]
    Attach(Errno),

    #[error("trace: could not poll: {0}")]
    Poll(Errno),

    #[error("trace: could not read trace events: {0}")]
    Read(io::Error),

    #[error("trace: could not wait for child: {0}")]
    Wait(Errno),

    #[error("trace: could not write trace: {0}")]
    Write(#[from] io::Error),
}
