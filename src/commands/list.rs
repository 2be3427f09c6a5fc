//! List command implementation

use crate::connection;
use eeprog_core::chip::ChipDatabase;

/// List the connection kinds this build supports
pub fn list_connections() {
    println!("Supported connections:");
    println!();
    for line in connection::connection_lines() {
        println!("{}", line);
    }
}

/// List all known chips
pub fn list_chips(db: &ChipDatabase) {
    println!("Supported EEPROM chips:");
    println!();
    println!("{:<12} {:<12} {:>10} {:>10}", "Vendor", "Name", "Size", "Page");
    println!("{}", "-".repeat(47));

    for chip in db.iter() {
        let page = chip
            .settings
            .max_page_size()
            .map_or_else(|| "-".to_string(), |size| format!("{} B", size));

        println!(
            "{:<12} {:<12} {:>10} {:>10}",
            chip.vendor,
            chip.name,
            format_size(chip.settings.memory_size()),
            page
        );
    }
}

fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 && bytes % (1024 * 1024) == 0 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(2048), "2 KiB");
        assert_eq!(format_size(32768), "32 KiB");
        assert_eq!(format_size(1536), "1536 B");
        assert_eq!(format_size(100), "100 B");
    }
}
