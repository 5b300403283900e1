use std::process::ExitCode;

use clap::Parser;
use log::warn;

use sctrace::{
    cli::{init_logging, TraceArgs, TraceConfig},
    errors::TRACER_FAILURE,
    session::TraceSession,
};

fn main() -> ExitCode {
    let args = TraceArgs::parse();
    if let Err(err) = init_logging(args.log_level()) {
        eprintln!("trace: could not set up logging: {err}");
    }

    // the traced program shares our terminal, so ctrl-c reaches it too;
    // keep going and report how it ended
    if let Err(err) = ctrlc::set_handler(|| {
        warn!("interrupted, waiting for the traced program to exit");
    }) {
        warn!("could not install interrupt handler: {err}");
    }

    let config = TraceConfig::from(args);
    match TraceSession::new(config).run() {
        Ok(status) => ExitCode::from(u8::try_from(status).unwrap_or(TRACER_FAILURE)),
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(TRACER_FAILURE)
        }
    }
}
