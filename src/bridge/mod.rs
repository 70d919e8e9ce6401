mod bridge;

pub use bridge::{RefreshBridge, RefreshSignal, TreeEvent};
