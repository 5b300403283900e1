use std::collections::HashMap;

use tabled::{builder::Builder, settings::Style};

use crate::catalog::SyscallName;

/// Per-syscall call counts for the `-c` table.
#[derive(Debug, Default)]
pub struct Summary {
    calls: HashMap<SyscallName, usize>,
}

impl Summary {
    pub fn record(&mut self, name: SyscallName) {
        *self.calls.entry(name).or_insert(0) += 1;
    }

    pub fn render(&self) -> String {
        let mut rows: Vec<(String, usize)> = self
            .calls
            .iter()
            .map(|(name, count)| (name.to_string(), *count))
            .collect();
        rows.sort_by(|(name, count), (name2, count2)| count2.cmp(count).then(name.cmp(name2)));

        let mut builder = Builder::new();
        builder.push_record(["calls", "syscall"]);
        builder.push_record([""]);
        for (name, count) in rows {
            builder.push_record([count.to_string(), name]);
        }
        builder.build().with(Style::ascii_rounded()).to_string()
    }
}
