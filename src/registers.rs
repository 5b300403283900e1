// register layout the kernel writes into the trace pipe:
// 21 packed native-endian u64s, in this exact order

pub const WORD_SIZE: usize = size_of::<u64>();
pub const REGISTER_COUNT: usize = 21;
pub const SNAPSHOT_SIZE: usize = REGISTER_COUNT * WORD_SIZE;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegisterSnapshot {
    pub rax: u64,
    pub rbx: u64,
    pub rcx: u64,
    pub rdx: u64,
    pub rsi: u64,
    pub rdi: u64,
    pub rbp: u64,
    pub r8: u64,
    pub r9: u64,
    pub r10: u64,
    pub r11: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
    pub err: u64,
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

impl RegisterSnapshot {
    pub fn from_bytes(bytes: &[u8; SNAPSHOT_SIZE]) -> Self {
        let mut words = [0u64; REGISTER_COUNT];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(WORD_SIZE)) {
            let mut raw = [0u8; WORD_SIZE];
            raw.copy_from_slice(chunk);
            *word = u64::from_ne_bytes(raw);
        }
        let [
            rax,
            rbx,
            rcx,
            rdx,
            rsi,
            rdi,
            rbp,
            r8,
            r9,
            r10,
            r11,
            r12,
            r13,
            r14,
            r15,
            err,
            rip,
            cs,
            rflags,
            rsp,
            ss,
        ] = words;
        RegisterSnapshot {
            rax,
            rbx,
            rcx,
            rdx,
            rsi,
            rdi,
            rbp,
            r8,
            r9,
            r10,
            r11,
            r12,
            r13,
            r14,
            r15,
            err,
            rip,
            cs,
            rflags,
            rsp,
            ss,
        }
    }

    pub fn to_bytes(&self) -> [u8; SNAPSHOT_SIZE] {
        let words = [
            self.rax,
            self.rbx,
            self.rcx,
            self.rdx,
            self.rsi,
            self.rdi,
            self.rbp,
            self.r8,
            self.r9,
            self.r10,
            self.r11,
            self.r12,
            self.r13,
            self.r14,
            self.r15,
            self.err,
            self.rip,
            self.cs,
            self.rflags,
            self.rsp,
            self.ss,
        ];
        let mut bytes = [0u8; SNAPSHOT_SIZE];
        for (chunk, word) in bytes.chunks_exact_mut(WORD_SIZE).zip(words) {
            chunk.copy_from_slice(&word.to_ne_bytes());
        }
        bytes
    }

    /// Syscall code on entry, return value on exit.
    pub fn code(&self) -> u64 {
        self.rax
    }

    /// Secondary result register (byte counts, errno).
    pub fn secondary(&self) -> u64 {
        self.rdx
    }

    /// Argument registers in calling-convention order.
    pub fn syscall_args(&self) -> [u64; 6] {
        [self.rdi, self.rsi, self.rdx, self.r12, self.r8, self.r9]
    }
}
