use std::os::fd::{AsRawFd, BorrowedFd};

use nix::{errno::Errno, libc, unistd::Pid};

use crate::catalog::SYSCALL_PTRACE;

/// Request mode asking the kernel to start tracing a process.
pub const PTRACE_ATTACH: libc::c_long = 1;

/// The kernel side of tracing: once attached, every syscall entry and exit
/// of the traced process lands in `sink` as a framed event.
pub trait TraceFacility {
    fn attach(&self, child: Pid, sink: BorrowedFd<'_>) -> nix::Result<()>;
}

/// Issues the attach request straight to the kernel.
#[derive(Debug, Default, Clone, Copy)]
pub struct KernelFacility;

impl TraceFacility for KernelFacility {
    fn attach(&self, child: Pid, sink: BorrowedFd<'_>) -> nix::Result<()> {
        let res = unsafe {
            libc::syscall(
                SYSCALL_PTRACE as libc::c_long,
                PTRACE_ATTACH,
                child.as_raw() as libc::c_long,
                0 as libc::c_long,
                sink.as_raw_fd() as libc::c_long,
            )
        };
        Errno::result(res).map(drop)
    }
}
