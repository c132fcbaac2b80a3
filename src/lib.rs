//! FBX-style skeleton reconstruction and GPU skinning data.
//!
//! Turns loosely linked skin cluster records into a joint hierarchy, a
//! capped per-vertex influence table, and per-joint skinning matrices.

pub mod config;
pub mod error;
pub mod logging;
pub mod note;
pub mod rig;
pub mod scene;

pub use error::RigError;
pub use logging::{LogLevel, ResultExt, init_logging, send_log};
pub use note::{Note, Notes, Severity};
