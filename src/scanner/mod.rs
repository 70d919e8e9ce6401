mod scan_options;
mod scanner;

pub use scan_options::ScanOptions;
pub use scanner::{ScanError, scan_project};
