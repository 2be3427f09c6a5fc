//! Programmer session

use serde_json::Value;

use super::paging::PagePlan;
use super::pattern::ErasePattern;
use super::perf::PerfStats;
use super::progress::{NoProgress, Phase, Progress};
use crate::chip::{self, normalize_chip_type, ChipDatabase, ChipSettings, ChipSource};
use crate::error::{ChannelError, Error, Operation, Result};
use crate::image::{self, Fit, MemoryImage};
use crate::rpc::{self, RpcChannel};

/// Page size used for transfers unless configured otherwise
///
/// This is also the largest page the programmer firmware accepts.
pub const DEFAULT_PAGE_SIZE: u32 = 64;

/// Session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgrammerConfig {
    /// Requested page size for reads
    pub read_page_size: u32,
    /// Requested page size for writes and erases
    pub write_page_size: u32,
    /// Where chip geometry comes from
    pub chip_source: ChipSource,
}

impl Default for ProgrammerConfig {
    fn default() -> Self {
        Self {
            read_page_size: DEFAULT_PAGE_SIZE,
            write_page_size: DEFAULT_PAGE_SIZE,
            chip_source: ChipSource::Registry,
        }
    }
}

/// Outcome of a write or erase
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReport {
    /// Pages written
    pub pages: usize,
    /// Bytes written
    pub bytes: usize,
    /// Collected latency samples, present only when collection was requested
    pub perf: Option<PerfStats>,
}

/// A programmer session with an initialized chip
///
/// The only way to get one is [`Programmer::init`], so data operations can
/// never run against an uninitialized chip. A failed operation leaves the
/// session usable; the chip content is whatever was written before the
/// failure.
pub struct Programmer<C: RpcChannel> {
    channel: C,
    chip_type: String,
    settings: ChipSettings,
    config: ProgrammerConfig,
}

impl<C: RpcChannel> Programmer<C> {
    /// Initialize `chip_type` over `channel`
    ///
    /// With [`ChipSource::Registry`] the chip is looked up in `db` before any
    /// request is sent. With [`ChipSource::Device`] the geometry returned by
    /// `init_chip` is used and `db` is not consulted.
    pub fn init(
        mut channel: C,
        db: &ChipDatabase,
        chip_type: &str,
        config: ProgrammerConfig,
    ) -> Result<Self> {
        for size in [config.read_page_size, config.write_page_size] {
            if size == 0 {
                return Err(Error::InvalidPageSize(size));
            }
        }

        let chip_type = normalize_chip_type(chip_type)?;
        let settings = match config.chip_source {
            ChipSource::Registry => {
                let settings = db.lookup(&chip_type)?;
                chip::send_init_chip(&mut channel, &chip_type)?;
                settings
            }
            ChipSource::Device => chip::initialize(&mut channel, &chip_type)?,
        };

        log::info!(
            "Initialized {} ({}, from {})",
            chip_type,
            settings,
            config.chip_source
        );

        Ok(Self {
            channel,
            chip_type,
            settings,
            config,
        })
    }

    /// Chip type this session was initialized with (uppercase)
    pub fn chip_type(&self) -> &str {
        &self.chip_type
    }

    /// Geometry of the initialized chip
    pub fn settings(&self) -> &ChipSettings {
        &self.settings
    }

    /// Session configuration
    pub fn config(&self) -> &ProgrammerConfig {
        &self.config
    }

    /// Page size actually used for reads
    pub fn read_page_size(&self) -> u32 {
        self.settings.effective_page_size(self.config.read_page_size)
    }

    /// Page size actually used for writes
    pub fn write_page_size(&self) -> u32 {
        self.settings.effective_page_size(self.config.write_page_size)
    }

    /// Access the underlying channel
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// End the session and give back the channel
    pub fn into_channel(self) -> C {
        self.channel
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Read the whole chip
    pub fn read_data(&mut self) -> Result<MemoryImage> {
        self.read_data_with_progress(&mut NoProgress)
    }

    /// Read the whole chip, reporting progress
    ///
    /// Partial data is discarded on failure.
    pub fn read_data_with_progress(&mut self, progress: &mut dyn Progress) -> Result<MemoryImage> {
        let memory_size = self.settings.memory_size() as usize;
        progress.begin(Phase::Reading, memory_size);

        match self.read_pages(memory_size, progress) {
            Ok(data) => {
                progress.finish(Phase::Reading);
                Ok(MemoryImage::new(data))
            }
            Err(e) => {
                progress.abort(Phase::Reading);
                Err(e)
            }
        }
    }

    fn read_pages(&mut self, memory_size: usize, progress: &mut dyn Progress) -> Result<Vec<u8>> {
        let page_size = self.read_page_size();
        let plan = PagePlan::new(memory_size, page_size as usize);

        let ack = self.call(Operation::SetReadMode, &[Value::from(page_size)])?;
        log::debug!("set_read_mode: {}", ack);

        let mut data = Vec::with_capacity(memory_size);
        for page in plan.pages() {
            let op = Operation::ReadPage(page.page_no);
            let response = self.call(op, &[Value::from(page.page_no)])?;
            let bytes = rpc::decode_bytes(&response).map_err(|e| op.fail(e))?;

            if bytes.len() < page.len {
                return Err(op.fail(ChannelError::UnexpectedResponse(format!(
                    "expected {} bytes, got {}",
                    page.len,
                    bytes.len()
                ))));
            }

            data.extend_from_slice(&bytes[..page.len]);
            progress.advance(data.len());
        }

        Ok(data)
    }

    // =========================================================================
    // Write / erase
    // =========================================================================

    /// Write `data` from address 0
    ///
    /// `data` must be non-empty and no larger than the chip. With
    /// `collect_performance`, `get_write_perf` is called after every page.
    pub fn write_data(&mut self, data: &[u8], collect_performance: bool) -> Result<WriteReport> {
        self.write_data_with_progress(data, collect_performance, &mut NoProgress)
    }

    /// Write `data` from address 0, reporting progress
    pub fn write_data_with_progress(
        &mut self,
        data: &[u8],
        collect_performance: bool,
        progress: &mut dyn Progress,
    ) -> Result<WriteReport> {
        if let Fit::Short { missing } = image::check_fit(data.len(), &self.settings)? {
            log::warn!(
                "Source is {} bytes smaller than the {} memory, the rest is left untouched",
                missing,
                self.chip_type
            );
        }
        self.run_write(Phase::Writing, data, collect_performance, progress)
    }

    /// Fill the whole chip with `pattern`
    pub fn erase_data(
        &mut self,
        pattern: ErasePattern,
        collect_performance: bool,
    ) -> Result<WriteReport> {
        self.erase_data_with_progress(pattern, collect_performance, &mut NoProgress)
    }

    /// Fill the whole chip with `pattern`, reporting progress
    pub fn erase_data_with_progress(
        &mut self,
        pattern: ErasePattern,
        collect_performance: bool,
        progress: &mut dyn Progress,
    ) -> Result<WriteReport> {
        let buffer = MemoryImage::filled(self.settings.memory_size() as usize, pattern.value());
        log::debug!("Erasing {} with pattern {}", self.chip_type, pattern);
        self.run_write(Phase::Erasing, &buffer, collect_performance, progress)
    }

    fn run_write(
        &mut self,
        phase: Phase,
        data: &[u8],
        collect_performance: bool,
        progress: &mut dyn Progress,
    ) -> Result<WriteReport> {
        progress.begin(phase, data.len());
        match self.write_pages(data, collect_performance, progress) {
            Ok(report) => {
                progress.finish(phase);
                Ok(report)
            }
            Err(e) => {
                progress.abort(phase);
                Err(e)
            }
        }
    }

    fn write_pages(
        &mut self,
        data: &[u8],
        collect_performance: bool,
        progress: &mut dyn Progress,
    ) -> Result<WriteReport> {
        let page_size = self.write_page_size();
        let plan = PagePlan::new(data.len(), page_size as usize);

        let ack = self.call(Operation::SetWriteMode, &[Value::from(page_size)])?;
        log::debug!("set_write_mode: {}", ack);

        let mut perf = collect_performance.then(PerfStats::new);
        for page in plan.pages() {
            let slice = &data[page.range()];
            self.call(
                Operation::WritePage(page.page_no),
                &[Value::from(page.page_no), Value::from(slice)],
            )?;

            if let Some(perf) = perf.as_mut() {
                let op = Operation::GetWritePerf;
                let response = self.call(op, &[])?;
                perf.extend(rpc::decode_numbers(&response).map_err(|e| op.fail(e))?);
            }

            progress.advance(page.range().end);
        }

        if let Some(stats) = &perf {
            match stats.summary() {
                Some(summary) => log::debug!(
                    "Write performance: {} samples, mean {:.1} usec",
                    summary.samples,
                    summary.mean
                ),
                None => log::debug!("Write performance: no samples collected"),
            }
        }

        Ok(WriteReport {
            pages: plan.total_pages(),
            bytes: data.len(),
            perf,
        })
    }

    // =========================================================================
    // Verify
    // =========================================================================

    /// Read the chip back and compare it byte for byte with `reference`
    pub fn verify_data(&mut self, reference: &[u8]) -> Result<()> {
        self.verify_data_with_progress(reference, &mut NoProgress)
    }

    /// Read the chip back and compare it with `reference`, reporting progress
    ///
    /// The reference must fit the chip. Any difference, including a length
    /// difference, fails with [`Error::VerifyMismatch`].
    pub fn verify_data_with_progress(
        &mut self,
        reference: &[u8],
        progress: &mut dyn Progress,
    ) -> Result<()> {
        image::check_fit(reference.len(), &self.settings)?;
        let image = self.read_data_with_progress(progress)?;
        image.compare(reference).map_err(Error::VerifyMismatch)
    }

    fn call(&mut self, op: Operation, params: &[Value]) -> Result<Value> {
        log::trace!("-> {} {:?}", op.method(), params);
        let response = self
            .channel
            .send_request(op.method(), params)
            .map_err(|e| op.fail(e))?;
        log::trace!("<- {}", response);
        Ok(response)
    }
}
