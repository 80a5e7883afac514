use crate::pipeline::buffer_pool::Buffer;
use serde::Serialize;

/// A filled buffer in transit from a producer to the writer.
///
/// The buffer's `len()` is the valid length; bytes `[0, len)` hold whole lines.
#[derive(Debug)]
pub struct WorkItem {
    pub buffer: Buffer,
    pub lines: u64,
}

impl WorkItem {
    pub fn new(buffer: Buffer, lines: u64) -> Self {
        Self { buffer, lines }
    }

    pub fn valid_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    pub fn into_buffer(self) -> Buffer {
        self.buffer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkloadAssignment {
    pub worker_index: usize,
    pub line_count: u64,
}

/// Split `total_lines` across `workers` as evenly as possible.
///
/// Worker 0 takes the remainder, so the shares always sum to `total_lines`.
/// Zero workers yields no assignments.
pub fn partition_workload(total_lines: u64, workers: usize) -> Vec<WorkloadAssignment> {
    if workers == 0 {
        return Vec::new();
    }

    let share = total_lines / workers as u64;
    let remainder = total_lines % workers as u64;

    (0..workers)
        .map(|worker_index| WorkloadAssignment {
            worker_index,
            line_count: if worker_index == 0 {
                share + remainder
            } else {
                share
            },
        })
        .collect()
}
