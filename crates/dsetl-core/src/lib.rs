pub mod config;
pub mod logging;

pub mod catalog;
pub mod control;
pub mod dataset;
pub mod error;
pub mod scheduler;
pub mod storage;
pub mod transport;

pub use error::EtlError;
