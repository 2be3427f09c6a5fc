//! Write command implementation

use super::{load_image, print_write_performance, run_erase, run_step, IndicatifProgress};
use eeprog_core::programmer::{ErasePattern, Programmer};
use eeprog_core::RpcChannel;
use std::path::Path;

/// Write `input` to the chip, erasing with `erase` first if given
pub fn run_write<C: RpcChannel>(
    programmer: &mut Programmer<C>,
    input: &Path,
    erase: Option<ErasePattern>,
    collect_performance: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = load_image(input, programmer.settings())?;

    if let Some(pattern) = erase {
        run_erase(programmer, pattern, collect_performance)?;
    }

    let report = run_step("write data", input.display(), || {
        Ok(programmer.write_data_with_progress(
            &data,
            collect_performance,
            &mut IndicatifProgress::new(),
        )?)
    })?;

    print_write_performance(&report);
    Ok(())
}
