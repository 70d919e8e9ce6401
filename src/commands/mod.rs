mod commands;

pub use commands::{ScanResultEnvelope, get_dirs, update_dirs};
