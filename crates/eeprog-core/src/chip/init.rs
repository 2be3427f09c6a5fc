//! Chip initialization against the board

use serde_json::Value;

use super::types::{normalize_chip_type, ChipSettings};
use crate::error::{Error, Operation, Result};
use crate::rpc::{self, RpcChannel};

/// Initialize `chip_type` on the board and return the geometry it reports
///
/// Fails with [`Error::NoChipSettings`] when the board acknowledges
/// `init_chip` without settings, and with a channel error tagged
/// [`Operation::InitChip`] when the call itself fails.
pub fn initialize<C: RpcChannel + ?Sized>(channel: &mut C, chip_type: &str) -> Result<ChipSettings> {
    let chip_type = normalize_chip_type(chip_type)?;
    let response = send_init_chip(channel, &chip_type)?;

    let (memory_size, max_page_size) = rpc::decode_settings(&response)
        .map_err(|e| Operation::InitChip.fail(e))?
        .ok_or_else(|| Error::NoChipSettings(chip_type.clone()))?;

    let memory_size = u32::try_from(memory_size)
        .map_err(|_| Error::InvalidChipSettings(format!("memory size {} too large", memory_size)))?;
    let max_page_size = max_page_size
        .map(|size| {
            u32::try_from(size)
                .map_err(|_| Error::InvalidChipSettings(format!("page size {} too large", size)))
        })
        .transpose()?;

    ChipSettings::new(memory_size, max_page_size)
}

/// Send `init_chip` and return the raw result
pub(crate) fn send_init_chip<C: RpcChannel + ?Sized>(channel: &mut C, chip_type: &str) -> Result<Value> {
    let op = Operation::InitChip;
    let response = channel
        .send_request(op.method(), &[Value::from(chip_type)])
        .map_err(|e| op.fail(e))?;
    log::debug!("init_chip: {}", response);
    Ok(response)
}
