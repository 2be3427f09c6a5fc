//! CLI command implementations
//!
//! Every command works on an initialized `Programmer` over any
//! `RpcChannel`, so the same code drives real hardware and the simulated
//! board.
//!
//! Commands are made of steps. [`run_step`] prints the step name before it
//! starts and its outcome after (`read data: success, 1.23 sec`).

mod erase;
mod list;
mod progress;
mod read;
mod verify;
mod write;

use eeprog_core::chip::ChipSettings;
use eeprog_core::image;
use eeprog_core::programmer::WriteReport;
use std::fmt::Display;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

pub use erase::run_erase;
pub use list::{list_chips, list_connections};
use progress::IndicatifProgress;
pub use read::run_read;
pub use verify::run_verify;
pub use write::run_write;

/// A step failed and its failure line has been printed
#[derive(Debug, Error)]
#[error("{step}: failed")]
pub struct StepFailed {
    /// Step name
    pub step: &'static str,
}

/// Run one step, printing `<step>: <detail>` and then its outcome
pub fn run_step<T>(
    step: &'static str,
    detail: impl Display,
    f: impl FnOnce() -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, Box<dyn std::error::Error>> {
    println!("{}: {}", step, detail);
    let start = Instant::now();

    match f() {
        Ok(value) => {
            println!(
                "{}: success, {:.02} sec",
                step,
                start.elapsed().as_secs_f64()
            );
            Ok(value)
        }
        Err(e) => {
            eprintln!("{}: failed, {}", step, e);
            Err(Box::new(StepFailed { step }))
        }
    }
}

/// Load a source image and check it fits the chip
///
/// Runs before anything is sent to the board, so a bad file never leaves
/// the chip half erased.
pub fn load_image(path: &Path, settings: &ChipSettings) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    run_step("load data", path.display(), || {
        let data = std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        image::check_fit(data.len(), settings)?;
        Ok(data)
    })
}

/// Print the latency summary of a write, if it was collected
fn print_write_performance(report: &WriteReport) {
    let Some(perf) = &report.perf else {
        return;
    };

    match perf.summary() {
        Some(summary) => println!(
            "write performance: {} samples, avg {:.1} usec, min {:.1} usec, max {:.1} usec",
            summary.samples, summary.mean, summary.min, summary.max
        ),
        None => println!("write performance: no write performance samples collected"),
    }
}
