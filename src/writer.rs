use crate::{
    colors::Palette,
    errors::TraceError,
};
use colored::Colorize;
use std::{
    fs::File,
    io::{self, BufWriter, IsTerminal, Write},
    path::Path,
};

/// Destination of the rendered trace.
///
/// Only the thread ids and the exit banner are ever colored, and only when
/// the trace goes to a terminal.
pub struct TraceWriter {
    writer: BufWriter<Box<dyn Write + Send>>,
    palette: Option<Palette>,
}

impl TraceWriter {
    /// Opens `output` (truncating it) or falls back to stderr.
    pub fn open(output: Option<&Path>) -> Result<Self, TraceError> {
        match output {
            Some(path) => {
                let file = File::options()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .map_err(|source| TraceError::Output {
                        path: path.to_path_buf(),
                        source,
                    })?;
                Ok(Self::new(Box::new(file), false))
            }
            None => {
                let colorize = io::stderr().is_terminal();
                Ok(Self::new(Box::new(io::stderr()), colorize))
            }
        }
    }

    /// Colors are resolved here, before any tracee is launched.
    pub fn new(sink: Box<dyn Write + Send>, colorize: bool) -> Self {
        let palette = colorize.then(Palette::detect);
        Self::with_palette(sink, palette)
    }

    pub fn with_palette(sink: Box<dyn Write + Send>, palette: Option<Palette>) -> Self {
        if palette.is_some() {
            // colored disables itself on stderr when stdout is redirected,
            // the tracee's stdout says nothing about our terminal
            colored::control::set_override(true);
        }
        TraceWriter {
            writer: BufWriter::new(sink),
            palette,
        }
    }

    pub fn palette(&self) -> Option<Palette> {
        self.palette
    }

    pub fn write_call(&mut self, tid: u16, call: &str) -> io::Result<()> {
        if let Some(palette) = self.palette {
            let tid = tid.to_string().custom_color(palette.tid);
            writeln!(self.writer, "{tid}: {call}")
        } else {
            writeln!(self.writer, "{tid}: {call}")
        }
    }

    pub fn write_return(&mut self, tid: u16, ret: &str) -> io::Result<()> {
        if let Some(palette) = self.palette {
            let tid = tid.to_string().custom_color(palette.return_tid);
            writeln!(self.writer, "\t{tid}:{ret}")
        } else {
            writeln!(self.writer, "\t{tid}:{ret}")
        }
    }

    pub fn write_exit(&mut self, status: i32) -> io::Result<()> {
        let banner = format!("+++ exited with {status} +++");
        if let Some(palette) = self.palette {
            writeln!(
                self.writer,
                "{}",
                banner.on_custom_color(palette.exited_background)
            )
        } else {
            writeln!(self.writer, "{banner}")
        }
    }

    pub fn write_raw(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
