//! CRC32C (Castagnoli) and little-endian integer helpers used by the frame codec.

/// Reflected polynomial for CRC32C (Castagnoli).
const POLY: u32 = 0x82F6_3B78;

fn table() -> &'static [u32; 256] {
    use std::sync::OnceLock;
    static TABLE: OnceLock<[u32; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t = [0u32; 256];
        let mut i = 0usize;
        while i < 256 {
            let mut c = i as u32;
            let mut k = 0;
            while k < 8 {
                c = if c & 1 != 0 { (c >> 1) ^ POLY } else { c >> 1 };
                k += 1;
            }
            t[i] = c;
            i += 1;
        }
        t
    })
}

/// Initial state for the incremental API.
pub const fn crc32c_init() -> u32 {
    0xFFFF_FFFF
}

/// Folds `data` into an in-progress CRC32C state.
pub fn crc32c_update(state: u32, data: &[u8]) -> u32 {
    let t = table();
    let mut crc = state;
    for &b in data {
        crc = t[((crc ^ b as u32) & 0xFF) as usize] ^ (crc >> 8);
    }
    crc
}

/// Finalizes an incremental CRC32C state into the public checksum value.
pub const fn crc32c_finish(state: u32) -> u32 {
    state ^ 0xFFFF_FFFF
}

/// One-shot CRC32C over a byte slice.
pub fn crc32c(data: &[u8]) -> u32 {
    crc32c_finish(crc32c_update(crc32c_init(), data))
}

/// Writes `v` little-endian into `out`. No-op if `out` is too short.
pub fn write_u16_le(out: &mut [u8], v: u16) {
    if out.len() < 2 {
        return;
    }
    out[0..2].copy_from_slice(&v.to_le_bytes());
}

/// Writes `v` little-endian into `out`. No-op if `out` is too short.
pub fn write_u32_le(out: &mut [u8], v: u32) {
    if out.len() < 4 {
        return;
    }
    out[0..4].copy_from_slice(&v.to_le_bytes());
}

/// Reads a little-endian `u16` from `in_`. Returns 0 if `in_` is too short.
pub fn read_u16_le(in_: &[u8]) -> u16 {
    if in_.len() < 2 {
        return 0;
    }
    u16::from_le_bytes([in_[0], in_[1]])
}

/// Reads a little-endian `u32` from `in_`. Returns 0 if `in_` is too short.
pub fn read_u32_le(in_: &[u8]) -> u32 {
    if in_.len() < 4 {
        return 0;
    }
    u32::from_le_bytes([in_[0], in_[1], in_[2], in_[3]])
}
