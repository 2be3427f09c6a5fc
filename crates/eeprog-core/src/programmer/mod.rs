//! Programmer client
//!
//! [`Programmer`] is a session bound to one channel and one initialized
//! chip. Every data operation is a strictly sequential series of page
//! transfers:
//!
//! ```text
//! read:   set_read_mode(page_size)  read_page(0) .. read_page(n-1)
//! write:  set_write_mode(page_size) write_page(0, data) .. write_page(n-1, data)
//!                                   [get_write_perf() after each page]
//! erase:  write of a chip-sized buffer filled with the pattern
//! verify: read, then byte-exact comparison
//! ```

mod paging;
mod pattern;
mod perf;
mod progress;
mod session;

pub use paging::{Page, PagePlan};
pub use pattern::ErasePattern;
pub use perf::{PerfStats, PerfSummary};
pub use progress::{NoProgress, Phase, Progress};
pub use session::{Programmer, ProgrammerConfig, WriteReport, DEFAULT_PAGE_SIZE};
