mod session;

pub use session::{ProjectSession, SessionCreationError, SessionError};
