//! Verify command implementation

use super::{load_image, run_step, IndicatifProgress};
use eeprog_core::programmer::Programmer;
use eeprog_core::RpcChannel;
use std::path::Path;

/// Compare the chip content with `input`
pub fn run_verify<C: RpcChannel>(
    programmer: &mut Programmer<C>,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let reference = load_image(input, programmer.settings())?;

    run_step("verify data", input.display(), || {
        programmer.verify_data_with_progress(&reference, &mut IndicatifProgress::new())?;
        Ok(())
    })
}
