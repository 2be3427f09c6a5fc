//! Read command implementation

use super::{run_step, IndicatifProgress};
use eeprog_core::programmer::Programmer;
use eeprog_core::RpcChannel;
use std::path::Path;

/// Bytes per hex dump line
const DUMP_LINE_BYTES: usize = 16;

/// Read the whole chip into `output`
pub fn run_read<C: RpcChannel>(
    programmer: &mut Programmer<C>,
    output: &Path,
    dump: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = run_step("read data", output.display(), || {
        let image = programmer.read_data_with_progress(&mut IndicatifProgress::new())?;
        std::fs::write(output, image.as_bytes())?;
        log::info!("Wrote {} bytes to {}", image.len(), output.display());
        Ok(image)
    })?;

    if dump {
        print!("{}", image.hex_dump(DUMP_LINE_BYTES));
    }

    Ok(())
}
