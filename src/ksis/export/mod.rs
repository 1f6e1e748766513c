pub mod aggregate;
pub mod config;
pub mod corrections;
pub mod error;
pub mod export;
pub mod io;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod report;
pub mod session;
pub mod source;
pub mod table;

pub use error::{ExportError, Result};
