//! eeprog-dummy - Simulated EEPROM programmer board
//!
//! This crate provides a board that answers the programmer's RPC methods
//! from memory. It follows the firmware's rules (chip must be initialized
//! before any mode call, page size 1..=64, page numbers must address the
//! chip, one mode at a time) and reports the firmware's error codes, so it
//! can stand in for real hardware in tests and with `eeprog dummy`.

use eeprog_core::chip::{normalize_chip_type, ChipDatabase};
use eeprog_core::programmer::DEFAULT_PAGE_SIZE;
use eeprog_core::rpc::{self, methods, DeviceErrorCode, RpcChannel};
use eeprog_core::ChannelError;
use serde_json::{json, Value};

/// JSON-RPC "method not found"
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Fail the `nth` (1-based) call of `method`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// RPC method name
    pub method: String,
    /// Which call fails, counting from 1
    pub nth: usize,
}

impl Fault {
    /// Fail the `nth` call of `method`
    pub fn new(method: &str, nth: usize) -> Self {
        Self {
            method: method.to_string(),
            nth,
        }
    }
}

/// Configuration for the simulated board
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Chip types the board accepts in `init_chip`
    pub chips: ChipDatabase,
    /// Answer `init_chip` with `[memory_size, max_page_size]` instead of a bare ack
    pub report_settings: bool,
    /// Latency samples produced by each `write_page`
    pub perf_samples_per_page: usize,
    /// Value of every latency sample, in microseconds
    pub write_time_usec: f64,
    /// Injected failure
    pub fail_on: Option<Fault>,
    /// Address whose byte is returned with its lowest bit flipped
    pub corrupt_read_at: Option<usize>,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            chips: ChipDatabase::builtin(),
            report_settings: true,
            perf_samples_per_page: 1,
            write_time_usec: 1000.0,
            fail_on: None,
            corrupt_read_at: None,
        }
    }
}

/// One request as seen by the board
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Method name
    pub method: String,
    /// Positional parameters
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Read,
    Write,
}

/// Simulated programmer board
///
/// Memory is allocated by `init_chip` and starts out erased (`0xFF`),
/// unless preloaded with [`DummyBoard::with_data`].
pub struct DummyBoard {
    config: DummyConfig,
    chip_type: Option<String>,
    memory: Vec<u8>,
    preload: Vec<u8>,
    mode: Mode,
    page_size: usize,
    last_write_perf: Vec<f64>,
    calls: Vec<RecordedCall>,
}

impl DummyBoard {
    /// Create a board with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            config,
            chip_type: None,
            memory: Vec::new(),
            preload: Vec::new(),
            mode: Mode::Idle,
            page_size: 0,
            last_write_perf: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Create a board with default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a board whose chip holds `data` (from address 0) once initialized
    pub fn with_data(config: DummyConfig, data: &[u8]) -> Self {
        let mut board = Self::new(config);
        board.preload = data.to_vec();
        board
    }

    /// Chip type accepted by `init_chip`, if any
    pub fn chip_type(&self) -> Option<&str> {
        self.chip_type.as_deref()
    }

    /// Get a reference to the chip memory
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Get a mutable reference to the chip memory
    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Every request received so far, in order
    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    /// Number of requests received for `method`
    pub fn count(&self, method: &str) -> usize {
        self.calls.iter().filter(|c| c.method == method).count()
    }

    /// Forget recorded requests
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn injected_fault(&self, method: &str) -> Option<ChannelError> {
        let fault = self.config.fail_on.as_ref()?;
        if fault.method != method || self.count(method) != fault.nth {
            return None;
        }

        let code = match method {
            methods::READ_PAGE => DeviceErrorCode::ReadFailed,
            methods::WRITE_PAGE => DeviceErrorCode::WriteFailed,
            _ => DeviceErrorCode::Unknown,
        };
        log::debug!("dummy: injecting {} on {} call {}", code.name(), method, fault.nth);
        Some(code.into_error("injected fault"))
    }

    fn require_chip(&self) -> Result<(), ChannelError> {
        if self.chip_type.is_none() {
            return Err(DeviceErrorCode::ChipNotInitialized.into_error("chip not initialized"));
        }
        Ok(())
    }

    /// Address range covered by `page_no` in the current mode
    fn page_range(&self, page_no: usize) -> Result<core::ops::Range<usize>, ChannelError> {
        let start = page_no
            .checked_mul(self.page_size)
            .filter(|&start| start < self.memory.len())
            .ok_or_else(|| {
                DeviceErrorCode::InvalidPageNo.into_error(format!("invalid page no {}", page_no))
            })?;
        Ok(start..(start + self.page_size).min(self.memory.len()))
    }

    fn init_chip(&mut self, params: &[Value]) -> Result<Value, ChannelError> {
        if self.chip_type.is_some() {
            return Err(
                DeviceErrorCode::ChipAlreadyInitialized.into_error("chip already initialized")
            );
        }

        let requested = str_param(params, 0)?;
        let chip = normalize_chip_type(requested)
            .ok()
            .and_then(|name| self.config.chips.find(&name).ok())
            .ok_or_else(|| {
                DeviceErrorCode::ChipNotSupported
                    .into_error(format!("chip {} not supported", requested))
            })?;

        let settings = chip.settings;
        let name = chip.name.clone();

        let mut memory = vec![0xFF; settings.memory_size() as usize];
        let len = self.preload.len().min(memory.len());
        memory[..len].copy_from_slice(&self.preload[..len]);
        self.memory = memory;

        log::debug!("dummy: initialized {} ({})", name, settings);
        self.chip_type = Some(name);

        if !self.config.report_settings {
            return Ok(json!("ok"));
        }
        let max_page_size = settings.max_page_size().unwrap_or(DEFAULT_PAGE_SIZE);
        Ok(json!([settings.memory_size(), max_page_size]))
    }

    fn set_mode(&mut self, mode: Mode, params: &[Value]) -> Result<Value, ChannelError> {
        self.require_chip()?;

        let page_size = int_param(params, 0)?;
        if page_size < 1 || page_size > DEFAULT_PAGE_SIZE as usize {
            return Err(DeviceErrorCode::InvalidPageSize
                .into_error(format!("invalid page size {}", page_size)));
        }

        self.mode = mode;
        self.page_size = page_size;
        Ok(json!("ok"))
    }

    fn read_page(&mut self, params: &[Value]) -> Result<Value, ChannelError> {
        self.require_chip()?;
        if self.mode != Mode::Read {
            return Err(DeviceErrorCode::ReadModeDisabled.into_error("read mode disabled"));
        }

        let range = self.page_range(int_param(params, 0)?)?;
        let mut page = self.memory[range.clone()].to_vec();
        if let Some(addr) = self.config.corrupt_read_at {
            if range.contains(&addr) {
                page[addr - range.start] ^= 0x01;
            }
        }
        Ok(json!(page))
    }

    fn write_page(&mut self, params: &[Value]) -> Result<Value, ChannelError> {
        self.require_chip()?;
        if self.mode != Mode::Write {
            return Err(DeviceErrorCode::WriteModeDisabled.into_error("write mode disabled"));
        }

        let range = self.page_range(int_param(params, 0)?)?;
        let data = params
            .get(1)
            .ok_or_else(|| invalid_params("missing page data"))
            .and_then(|v| rpc::decode_bytes(v).map_err(|e| invalid_params(&e.to_string())))?;
        if data.len() > range.len() {
            return Err(DeviceErrorCode::InvalidAddress.into_error(format!(
                "{} bytes do not fit in page at 0x{:04X}",
                data.len(),
                range.start
            )));
        }

        self.memory[range.start..range.start + data.len()].copy_from_slice(&data);
        self.last_write_perf = vec![self.config.write_time_usec; self.config.perf_samples_per_page];
        Ok(json!("ok"))
    }

    fn get_write_perf(&mut self) -> Result<Value, ChannelError> {
        Ok(json!(core::mem::take(&mut self.last_write_perf)))
    }
}

fn invalid_params(message: &str) -> ChannelError {
    DeviceErrorCode::Unknown.into_error(format!("invalid params: {}", message))
}

fn int_param(params: &[Value], index: usize) -> Result<usize, ChannelError> {
    params
        .get(index)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid_params(&format!("expected integer at position {}", index)))
}

fn str_param(params: &[Value], index: usize) -> Result<&str, ChannelError> {
    params
        .get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_params(&format!("expected string at position {}", index)))
}

impl RpcChannel for DummyBoard {
    fn send_request(&mut self, method: &str, params: &[Value]) -> Result<Value, ChannelError> {
        self.calls.push(RecordedCall {
            method: method.to_string(),
            params: params.to_vec(),
        });

        if let Some(err) = self.injected_fault(method) {
            return Err(err);
        }

        match method {
            methods::INIT_CHIP => self.init_chip(params),
            methods::SET_READ_MODE => self.set_mode(Mode::Read, params),
            methods::READ_PAGE => self.read_page(params),
            methods::SET_WRITE_MODE => self.set_mode(Mode::Write, params),
            methods::WRITE_PAGE => self.write_page(params),
            methods::GET_WRITE_PERF => self.get_write_perf(),
            other => Err(ChannelError::Remote {
                code: METHOD_NOT_FOUND,
                message: format!("method {} not found", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eeprog_core::chip::ChipSource;
    use eeprog_core::programmer::{ErasePattern, Programmer, ProgrammerConfig};
    use eeprog_core::{Error, ErrorKind, Operation};

    fn open<'a>(board: &'a mut DummyBoard, chip: &str) -> Programmer<&'a mut DummyBoard> {
        Programmer::init(board, &ChipDatabase::builtin(), chip, ProgrammerConfig::default())
            .unwrap()
    }

    fn remote_code(err: ChannelError) -> i64 {
        match err {
            ChannelError::Remote { code, .. } => code,
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_firmware_rules() {
        let mut board = DummyBoard::new_default();

        let err = board.send_request("set_read_mode", &[json!(64)]).unwrap_err();
        assert_eq!(remote_code(err), 23);

        let err = board.send_request("init_chip", &[json!("AT24C02")]).unwrap_err();
        assert_eq!(remote_code(err), 21);

        let settings = board.send_request("init_chip", &[json!("at28c64")]).unwrap();
        assert_eq!(settings, json!([8192, 64]));
        assert_eq!(board.chip_type(), Some("AT28C64"));

        let err = board.send_request("init_chip", &[json!("AT28C64")]).unwrap_err();
        assert_eq!(remote_code(err), 22);

        let err = board.send_request("set_read_mode", &[json!(65)]).unwrap_err();
        assert_eq!(remote_code(err), 31);
        let err = board.send_request("read_page", &[json!(0)]).unwrap_err();
        assert_eq!(remote_code(err), 41);

        board.send_request("set_read_mode", &[json!(64)]).unwrap();
        let err = board.send_request("read_page", &[json!(128)]).unwrap_err();
        assert_eq!(remote_code(err), 32);
        let err = board
            .send_request("write_page", &[json!(0), json!([0])])
            .unwrap_err();
        assert_eq!(remote_code(err), 51);

        // Entering WRITE mode leaves READ mode
        board.send_request("set_write_mode", &[json!(64)]).unwrap();
        let err = board.send_request("read_page", &[json!(0)]).unwrap_err();
        assert_eq!(remote_code(err), 41);

        let err = board.send_request("erase_chip", &[]).unwrap_err();
        assert_eq!(remote_code(err), METHOD_NOT_FOUND);
    }

    #[test]
    fn test_memory_starts_erased() {
        let mut board = DummyBoard::new_default();
        board.send_request("init_chip", &[json!("AT28C16")]).unwrap();
        assert_eq!(board.memory().len(), 2048);
        assert!(board.memory().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_read_at28c64() {
        let data: Vec<u8> = (0..8192).map(|i| (i % 251) as u8).collect();
        let mut board = DummyBoard::with_data(DummyConfig::default(), &data);

        let image = open(&mut board, "AT28C64").read_data().unwrap();
        assert_eq!(image.len(), 8192);
        assert_eq!(image.as_bytes(), &data[..]);

        assert_eq!(board.count("read_page"), 128);
        let pages: Vec<u64> = board
            .calls()
            .iter()
            .filter(|c| c.method == "read_page")
            .map(|c| c.params[0].as_u64().unwrap())
            .collect();
        assert_eq!(pages, (0..128).collect::<Vec<u64>>());
        assert_eq!(board.calls()[1].params, vec![json!(64)]);
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let data: Vec<u8> = (0..8192u32).map(|i| (i * 7 + 3) as u8).collect();
        let mut board = DummyBoard::new_default();

        let mut programmer = open(&mut board, "AT28C64");
        let report = programmer.write_data(&data, false).unwrap();
        assert_eq!(report.pages, 128);
        assert_eq!(programmer.read_data().unwrap().as_bytes(), &data[..]);

        assert_eq!(board.memory(), &data[..]);
    }

    #[test]
    fn test_write_slices_are_contiguous() {
        for len in [1usize, 63, 64, 65, 1000, 8191, 8192] {
            let data: Vec<u8> = (0..len).map(|i| (i % 256) as u8).collect();
            let mut board = DummyBoard::new_default();
            open(&mut board, "AT28C64").write_data(&data, false).unwrap();

            let writes: Vec<&RecordedCall> = board
                .calls()
                .iter()
                .filter(|c| c.method == "write_page")
                .collect();
            let total_pages = len.div_ceil(64);
            assert_eq!(writes.len(), total_pages, "len {}", len);

            let mut offset = 0;
            for (i, call) in writes.iter().enumerate() {
                assert_eq!(call.params[0], json!(i));
                let slice = rpc::decode_bytes(&call.params[1]).unwrap();
                assert_eq!(slice, data[offset..offset + slice.len()]);
                offset += slice.len();
            }
            assert_eq!(offset, len);

            let last = rpc::decode_bytes(&writes[total_pages - 1].params[1]).unwrap();
            assert_eq!(last.len(), len - (total_pages - 1) * 64);

            // Bytes past the image stay erased
            assert!(board.memory()[len..].iter().all(|&b| b == 0xFF));
        }
    }

    #[test]
    fn test_verify() {
        let data: Vec<u8> = (0..2048).map(|i| (i / 8) as u8).collect();
        let mut board = DummyBoard::with_data(DummyConfig::default(), &data);
        open(&mut board, "AT28C16").verify_data(&data).unwrap();

        let config = DummyConfig {
            corrupt_read_at: Some(1500),
            ..Default::default()
        };
        let mut board = DummyBoard::with_data(config, &data);
        let err = open(&mut board, "AT28C16").verify_data(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VerifyMismatch);
        assert!(err.to_string().contains("0x000005DC"), "{}", err);
    }

    #[test]
    fn test_erase_with_pattern() {
        let mut board = DummyBoard::new_default();
        let pattern = ErasePattern::parse("CC").unwrap();
        assert_eq!(pattern.value(), 204);

        let report = open(&mut board, "AT28C64").erase_data(pattern, false).unwrap();
        assert_eq!(report.bytes, 8192);
        assert_eq!(board.memory().len(), 8192);
        assert!(board.memory().iter().all(|&b| b == 204));
    }

    #[test]
    fn test_write_performance_samples() {
        let config = DummyConfig {
            perf_samples_per_page: 3,
            write_time_usec: 1250.0,
            ..Default::default()
        };
        let mut board = DummyBoard::new(config);
        let report = open(&mut board, "AT28C64")
            .write_data(&[0xAB; 256], true)
            .unwrap();

        let summary = report.perf.unwrap().summary().unwrap();
        assert_eq!(summary.samples, 12);
        assert_eq!(summary.mean, 1250.0);
        assert_eq!(board.count("get_write_perf"), 4);
    }

    #[test]
    fn test_write_performance_without_samples() {
        let config = DummyConfig {
            perf_samples_per_page: 0,
            ..Default::default()
        };
        let mut board = DummyBoard::new(config);
        let report = open(&mut board, "AT28C64").erase_data(ErasePattern::default(), true).unwrap();
        assert_eq!(report.perf.unwrap().summary(), None);
    }

    #[test]
    fn test_injected_read_fault() {
        let config = DummyConfig {
            fail_on: Some(Fault::new("read_page", 10)),
            ..Default::default()
        };
        let mut board = DummyBoard::new(config);
        let mut programmer = open(&mut board, "AT28C64");

        let err = programmer.read_data().unwrap_err();
        assert_eq!(err.operation(), Some(Operation::ReadPage(9)));
        assert!(err.to_string().contains("READ_FAILED"), "{}", err);

        // Only the 10th call fails, a retry goes through
        assert_eq!(programmer.read_data().unwrap().len(), 8192);
    }

    #[test]
    fn test_injected_write_fault_keeps_partial_content() {
        let config = DummyConfig {
            fail_on: Some(Fault::new("write_page", 3)),
            ..Default::default()
        };
        let mut board = DummyBoard::new(config);
        let err = open(&mut board, "AT28C64")
            .write_data(&[0x00; 8192], false)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Channel {
                op: Operation::WritePage(2),
                ..
            }
        ));
        assert!(board.memory()[..128].iter().all(|&b| b == 0x00));
        assert!(board.memory()[128..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_device_reported_settings() {
        let mut board = DummyBoard::new_default();
        let config = ProgrammerConfig {
            chip_source: ChipSource::Device,
            ..Default::default()
        };
        // The registry passed here is empty; geometry comes from the board
        let programmer =
            Programmer::init(&mut board, &ChipDatabase::new(), "AT28C256", config).unwrap();
        assert_eq!(programmer.settings().memory_size(), 32768);

        let mut board = DummyBoard::new(DummyConfig {
            report_settings: false,
            ..Default::default()
        });
        let result = Programmer::init(&mut board, &ChipDatabase::builtin(), "AT28C64", config);
        assert!(matches!(result, Err(Error::NoChipSettings(_))));
    }
}
