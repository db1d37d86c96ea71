//! ltfec: a block-based forward error correction codec for unreliable UDP
//! datagram transport.
//!
//! The core is transport-agnostic: it works entirely in terms of `Vec<u8>`
//! frames. [`tx`] assembles `N+K` on-wire frames per generation; [`rx`]
//! reassembles generations from whatever subset of those frames arrives, and
//! recovers missing data via [`fec`] when enough parity survived. [`frame`]
//! is the wire codec, [`crc`] its CRC32C trailer, [`config`] and
//! [`telemetry`] the ambient configuration and metrics layers.

pub mod config;
pub mod crc;
pub mod error;
pub mod fec;
pub mod frame;
pub mod rx;
pub mod telemetry;
pub mod tx;

pub use config::AppConfig;
pub use error::{FecError, Result};
pub use frame::{BaseHeader, DecodedFrame, FecSchemeId, ParitySubheader};
pub use rx::{ClosedBlock, RxBlockTable, RxConfig, RxSnapshot};
pub use tx::{TxBlockAssembler, TxConfig};
