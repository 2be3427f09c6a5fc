//! Progress bars for page transfers

use eeprog_core::programmer::{Phase, Progress};
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

/// [`Progress`] sink drawing an `indicatif` bar per phase
#[derive(Default)]
pub struct IndicatifProgress {
    bar: Option<ProgressBar>,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Progress for IndicatifProgress {
    fn begin(&mut self, phase: Phase, total_bytes: usize) {
        let pb = ProgressBar::new(total_bytes as u64);
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message(phase.label());
        self.bar = Some(pb);
    }

    fn advance(&mut self, bytes_done: usize) {
        if let Some(pb) = &self.bar {
            pb.set_position(bytes_done as u64);
        }
    }

    fn finish(&mut self, phase: Phase) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message(format!("{} complete", phase.label()));
        }
    }

    fn abort(&mut self, _phase: Phase) {
        if let Some(pb) = self.bar.take() {
            pb.abandon();
        }
    }
}
