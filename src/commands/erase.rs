//! Erase command implementation
//!
//! The chip has no erase primitive; erasing writes the pattern over the
//! whole memory.

use super::{print_write_performance, run_step, IndicatifProgress};
use eeprog_core::programmer::{ErasePattern, Programmer};
use eeprog_core::RpcChannel;

/// Fill the chip with `pattern`
pub fn run_erase<C: RpcChannel>(
    programmer: &mut Programmer<C>,
    pattern: ErasePattern,
    collect_performance: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = run_step("erase data", pattern, || {
        Ok(programmer.erase_data_with_progress(
            pattern,
            collect_performance,
            &mut IndicatifProgress::new(),
        )?)
    })?;

    print_write_performance(&report);
    Ok(())
}
