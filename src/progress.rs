// src/progress.rs
use crate::driver::{RowReport, RunSummary};

/// Status reporting for a run. The CLI prints; tests record or ignore.
pub trait Progress {
    /// Called at the start with the number of eligible rows.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One terminal status per processed row, success or not.
    fn row_done(&mut self, _report: &RowReport) {}

    /// Called at the end of a completed run.
    fn finish(&mut self, _summary: &RunSummary) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
