pub mod config;
pub mod error;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod plot;
pub mod signal;

pub use config::*;
pub use error::QoeError;
pub use metrics::*;
pub use signal::*;
