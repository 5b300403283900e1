use std::fmt::{self, Write};

use crate::{
    catalog::{describe, Descriptor, MAX_ARGS},
    registers::RegisterSnapshot,
};

/// Which half of a syscall a thread's next record describes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    ExpectingCall,
    ExpectingReturn,
}

/// Renders one record and returns the phase the thread moves to.
pub fn render(
    out: &mut impl Write,
    snapshot: &RegisterSnapshot,
    phase: Phase,
) -> Result<Phase, fmt::Error> {
    match phase {
        Phase::ExpectingCall => {
            let descriptor = describe(snapshot.code());
            render_call(out, &descriptor, snapshot)?;
            if descriptor.is_terminal() {
                Ok(Phase::ExpectingCall)
            } else {
                Ok(Phase::ExpectingReturn)
            }
        }
        Phase::ExpectingReturn => {
            render_return(out, snapshot)?;
            Ok(Phase::ExpectingCall)
        }
    }
}

pub fn render_call(
    out: &mut impl Write,
    descriptor: &Descriptor,
    snapshot: &RegisterSnapshot,
) -> fmt::Result {
    write!(out, "{}(", descriptor.name)?;
    if descriptor.arg_count > MAX_ARGS {
        out.write_str("too many args")?;
    } else {
        let args = snapshot.syscall_args();
        for (index, arg) in args[..descriptor.arg_count as usize].iter().enumerate() {
            if index > 0 {
                out.write_str(", ")?;
            }
            write!(out, "{arg:#x}")?;
        }
    }
    out.write_char(')')
}

pub fn render_return(out: &mut impl Write, snapshot: &RegisterSnapshot) -> fmt::Result {
    write!(out, " = {:#x}", snapshot.code())?;
    match snapshot.secondary() {
        0 => Ok(()),
        secondary => write!(out, " ({secondary})"),
    }
}
