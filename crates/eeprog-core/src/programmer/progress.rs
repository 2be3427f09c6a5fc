//! Progress reporting hooks

/// Phase of a data operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Reading the chip (also the first half of verify)
    Reading,
    /// Writing an image
    Writing,
    /// Writing the erase pattern
    Erasing,
}

impl Phase {
    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reading => "Reading",
            Self::Writing => "Writing",
            Self::Erasing => "Erasing",
        }
    }
}

/// Receives progress of page transfers
///
/// All methods default to doing nothing.
pub trait Progress {
    /// A phase starts, covering `total_bytes`
    fn begin(&mut self, _phase: Phase, _total_bytes: usize) {}

    /// `bytes_done` bytes of the current phase are transferred
    fn advance(&mut self, _bytes_done: usize) {}

    /// The current phase completed
    fn finish(&mut self, _phase: Phase) {}

    /// The current phase failed
    fn abort(&mut self, _phase: Phase) {}
}

/// Progress sink that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}
