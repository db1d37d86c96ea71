use thiserror::Error;

/// Error taxonomy for the FEC core, matching the DESIGN.md error table.
///
/// Frame-level decode/CRC errors are still constructed as values here;
/// whether the caller drops the offending datagram silently or surfaces
/// it is a policy decision made at the ingest call site, not inside this
/// crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FecError {
    /// TX assembly or RX ingest saw payload/shape data that doesn't match
    /// the block's established `(N, K, L)`.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A payload exceeded the configured `max_payload_len`.
    #[error("payload of {len} bytes exceeds max_payload_len {max}")]
    PayloadTooLarge { len: usize, max: usize },

    /// The input buffer was too short to hold a full frame.
    #[error("frame truncated: need at least {need} bytes, got {got}")]
    FrameTruncated { need: usize, got: usize },

    /// The trailing CRC32C did not match the recomputed value over the payload.
    #[error("crc32c mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    CrcMismatch { expected: u32, computed: u32 },

    /// The caller-supplied output buffer was too small to encode into.
    #[error("encode buffer too small: need {need} bytes, have {have}")]
    EncodeBufferTooSmall { need: usize, have: usize },

    /// At close time, more data slots were missing than available parity
    /// rows could reconstruct. Not fatal: the block still closes with holes.
    #[error(
        "recovery insufficient: {missing} missing data slot(s), {available} parity row(s) available"
    )]
    RecoveryInsufficient { missing: usize, available: usize },

    /// A configuration value fell outside its documented range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, FecError>;
