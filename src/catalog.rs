use std::fmt::{self, Display};

/// Highest syscall code the kernel table knows about.
pub const MAX_SYSCALL_CODE: u64 = 94;

/// Argument registers carried by a register snapshot.
pub const MAX_ARGS: u8 = 6;

pub const SYSCALL_EXIT: u64 = 0;
pub const SYSCALL_EXEC: u64 = 11;
pub const SYSCALL_EXIT_THREAD: u64 = 31;
pub const SYSCALL_PTRACE: u64 = 51;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyscallName {
    Known(&'static str),
    Unknown(u64),
}

impl Display for SyscallName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyscallName::Known(name) => f.write_str(name),
            SyscallName::Unknown(code) => write!(f, "({code})"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub code: u64,
    pub name: SyscallName,
    pub arg_count: u8,
}

impl Descriptor {
    /// Syscalls after which the calling thread never reports a return.
    pub fn is_terminal(&self) -> bool {
        matches!(self.code, SYSCALL_EXIT | SYSCALL_EXIT_THREAD | SYSCALL_EXEC)
    }
}

type Entry = Option<(&'static str, u8)>;

// indexed by syscall code, holes are codes the kernel never assigned
static SYSCALLS: [Entry; MAX_SYSCALL_CODE as usize + 1] = [
    Some(("exit", 1)),
    Some(("arch_prctl", 2)),
    Some(("open", 4)),
    Some(("close", 1)),
    Some(("read", 3)),
    Some(("write", 3)),
    Some(("seek", 3)),
    Some(("mmap", 6)),
    Some(("munmap", 2)),
    Some(("get_pid", 0)),
    // 10
    Some(("get_ppid", 0)),
    Some(("exec", 6)),
    Some(("clone", 6)),
    Some(("wait", 3)),
    Some(("socket", 2)),
    Some(("set_hostname", 2)),
    Some(("unlink", 3)),
    Some(("fstat", 5)),
    Some(("chdir", 1)),
    Some(("ioctl", 3)),
    // 20
    Some(("sched_yield", 0)),
    None,
    Some(("delete_tcluster", 1)),
    Some(("pipe", 2)),
    Some(("get_uid", 0)),
    // rename and spawn take a seventh argument that never reaches the snapshot
    Some(("rename", 6)),
    Some(("sysconf", 3)),
    Some(("spawn", 6)),
    Some(("get_tid", 0)),
    Some(("manage_tcluster", 4)),
    // 30
    Some(("fcntl", 3)),
    Some(("exit_thread", 0)),
    Some(("getrandom", 2)),
    Some(("mprotect", 3)),
    Some(("sync", 0)),
    Some(("set_mac_capabilities", 1)),
    Some(("get_mac_capabilities", 0)),
    Some(("add_mac_permissions", 3)),
    Some(("set_mac_enforcement", 1)),
    Some(("mount", 6)),
    // 40
    Some(("umount", 3)),
    Some(("readlink", 5)),
    Some(("getdents", 3)),
    Some(("makenode", 5)),
    Some(("truncate", 2)),
    Some(("bind", 3)),
    Some(("symlink", 6)),
    Some(("connect", 3)),
    Some(("openpty", 3)),
    Some(("fsync", 2)),
    // 50
    Some(("link", 6)),
    Some(("ptrace", 4)),
    Some(("listen", 2)),
    Some(("accept", 4)),
    Some(("getrlimit", 1)),
    Some(("setrlimit", 2)),
    Some(("faccess", 5)),
    Some(("poll", 3)),
    Some(("geteuid", 0)),
    Some(("setuids", 2)),
    // 60
    Some(("fchmod", 5)),
    Some(("umask", 1)),
    Some(("reboot", 2)),
    Some(("fchown", 6)),
    Some(("pread", 4)),
    Some(("pwrite", 4)),
    Some(("getsockname", 3)),
    Some(("getpeername", 3)),
    Some(("shutdown", 2)),
    Some(("futex", 4)),
    // 70
    Some(("clock", 3)),
    Some(("clock_nanosleep", 4)),
    Some(("getrusage", 2)),
    Some(("recvfrom", 6)),
    Some(("sendto", 6)),
    Some(("config_netinterface", 3)),
    Some(("utimes", 5)),
    Some(("create_tcluster", 0)),
    Some(("switch_tcluster", 2)),
    Some(("actually_kill", 1)),
    // 80
    Some(("signalpost", 1)),
    Some(("sendsignal", 2)),
    Some(("getprio", 2)),
    Some(("setprio", 3)),
    Some(("getgid", 0)),
    Some(("getegid", 0)),
    Some(("setgids", 2)),
    Some(("getgroups", 2)),
    Some(("setgroups", 2)),
    Some(("ttyname", 3)),
    // 90
    Some(("fadvise", 4)),
    Some(("shmat", 3)),
    Some(("shmctl", 3)),
    Some(("shmdt", 1)),
    Some(("shmget", 3)),
];

/// Looks up a syscall code. Codes the table doesn't know still describe
/// themselves, showing every argument register.
pub fn describe(code: u64) -> Descriptor {
    let entry = usize::try_from(code)
        .ok()
        .and_then(|index| SYSCALLS.get(index))
        .copied()
        .flatten();
    match entry {
        Some((name, arg_count)) => Descriptor {
            code,
            name: SyscallName::Known(name),
            arg_count,
        },
        None => Descriptor {
            code,
            name: SyscallName::Unknown(code),
            arg_count: MAX_ARGS,
        },
    }
}
