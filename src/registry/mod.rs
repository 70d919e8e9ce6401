mod registry;

pub use registry::{ProjectEntry, ProjectRegistry, RegistryError};
