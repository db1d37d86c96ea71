//! Wire frame codec: header layout, parity subheader, and the payload/CRC trailer.
//!
//! ```text
//! BaseHeader (16 B) | [ParitySubheader (2 B) if parity frame] | Payload (L B) | CRC32C(Payload) (4 B LE)
//! ```

use crate::crc::{self, crc32c};
use crate::error::{FecError, Result};

/// Protocol version for the initial wire format.
pub const PROTOCOL_VERSION: u8 = 1;

/// Sizes of the frame's fixed-size pieces.
pub const BASE_HEADER_LEN: usize = 16;
pub const PARITY_SUBHEADER_LEN: usize = 2;
pub const CRC_TRAILER_LEN: usize = 4;

/// FEC scheme identifiers carried in the parity subheader. Informational:
/// the decoder reconstructs Vandermonde coefficients from `K` and
/// `parity_index`, not from this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FecSchemeId {
    XorK1 = 1,
    Gf256K2 = 10,
    Gf256K3 = 11,
    Gf256K4 = 12,
}

impl FecSchemeId {
    /// Maps a parity count to the scheme id the TX assembler uses for it.
    /// `K` outside `[1..4]` has no scheme (no parity is emitted for `K=0`,
    /// and `K>4` is out of scope).
    pub fn for_parity_count(k: u16) -> Option<Self> {
        match k {
            1 => Some(Self::XorK1),
            2 => Some(Self::Gf256K2),
            3 => Some(Self::Gf256K3),
            4 => Some(Self::Gf256K4),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Packs `K - 1` into the low 8 bits of `flags2`; upper bits reserved (0).
pub fn flags2_pack(k: u16) -> u16 {
    k.wrapping_sub(1) & 0x00FF
}

/// Recovers the `K - 1` value packed into `flags2`'s low 8 bits.
pub fn flags2_get(flags2: u16) -> u16 {
    flags2 & 0x00FF
}

/// The fixed 16-byte header present on every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BaseHeader {
    pub version: u8,
    pub flags1: u8,
    pub flags2: u16,
    pub gen_id: u32,
    pub seq_in_block: u16,
    pub data_count: u16,
    pub parity_count: u16,
    pub payload_len: u16,
}

impl BaseHeader {
    fn write_into(&self, out: &mut [u8]) {
        out[0] = self.version;
        out[1] = self.flags1;
        crc::write_u16_le(&mut out[2..4], self.flags2);
        crc::write_u32_le(&mut out[4..8], self.gen_id);
        crc::write_u16_le(&mut out[8..10], self.seq_in_block);
        crc::write_u16_le(&mut out[10..12], self.data_count);
        crc::write_u16_le(&mut out[12..14], self.parity_count);
        crc::write_u16_le(&mut out[14..16], self.payload_len);
    }

    fn read_from(in_: &[u8]) -> Self {
        Self {
            version: in_[0],
            flags1: in_[1],
            flags2: crc::read_u16_le(&in_[2..4]),
            gen_id: crc::read_u32_le(&in_[4..8]),
            seq_in_block: crc::read_u16_le(&in_[8..10]),
            data_count: crc::read_u16_le(&in_[10..12]),
            parity_count: crc::read_u16_le(&in_[12..14]),
            payload_len: crc::read_u16_le(&in_[14..16]),
        }
    }
}

/// The 2-byte subheader present only on parity frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParitySubheader {
    pub fec_scheme_id: u8,
    pub fec_parity_index: u8,
}

/// A frame is a parity frame iff its sequence number falls at or past `data_count`.
pub fn is_parity_frame(h: &BaseHeader) -> bool {
    h.seq_in_block >= h.data_count
}

/// Total encoded size for a payload of `payload_len` bytes, with or without
/// the parity subheader.
pub fn encoded_size(payload_len: usize, with_parity_subheader: bool) -> usize {
    BASE_HEADER_LEN
        + if with_parity_subheader {
            PARITY_SUBHEADER_LEN
        } else {
            0
        }
        + payload_len
        + CRC_TRAILER_LEN
}

/// Encodes a data frame: `header.seq_in_block` must be `< header.data_count`.
pub fn encode_data_frame(out: &mut [u8], header: &BaseHeader, payload: &[u8]) -> Result<()> {
    if is_parity_frame(header) {
        return Err(FecError::ShapeMismatch(
            "encode_data_frame called with a parity seq_in_block".into(),
        ));
    }
    if payload.len() != header.payload_len as usize {
        return Err(FecError::ShapeMismatch(format!(
            "payload len {} does not match header.payload_len {}",
            payload.len(),
            header.payload_len
        )));
    }
    let need = encoded_size(payload.len(), false);
    if out.len() < need {
        return Err(FecError::EncodeBufferTooSmall {
            need,
            have: out.len(),
        });
    }

    header.write_into(&mut out[..BASE_HEADER_LEN]);
    out[BASE_HEADER_LEN..BASE_HEADER_LEN + payload.len()].copy_from_slice(payload);
    let crc = crc32c(payload);
    crc::write_u32_le(
        &mut out[BASE_HEADER_LEN + payload.len()..BASE_HEADER_LEN + payload.len() + 4],
        crc,
    );
    Ok(())
}

/// Encodes a parity frame: `header.seq_in_block` must be `>= header.data_count`.
pub fn encode_parity_frame(
    out: &mut [u8],
    header: &BaseHeader,
    subheader: &ParitySubheader,
    payload: &[u8],
) -> Result<()> {
    if !is_parity_frame(header) {
        return Err(FecError::ShapeMismatch(
            "encode_parity_frame called with a data seq_in_block".into(),
        ));
    }
    if payload.len() != header.payload_len as usize {
        return Err(FecError::ShapeMismatch(format!(
            "payload len {} does not match header.payload_len {}",
            payload.len(),
            header.payload_len
        )));
    }
    let need = encoded_size(payload.len(), true);
    if out.len() < need {
        return Err(FecError::EncodeBufferTooSmall {
            need,
            have: out.len(),
        });
    }

    header.write_into(&mut out[..BASE_HEADER_LEN]);
    out[BASE_HEADER_LEN] = subheader.fec_scheme_id;
    out[BASE_HEADER_LEN + 1] = subheader.fec_parity_index;

    let payload_start = BASE_HEADER_LEN + PARITY_SUBHEADER_LEN;
    out[payload_start..payload_start + payload.len()].copy_from_slice(payload);
    let crc = crc32c(payload);
    crc::write_u32_le(
        &mut out[payload_start + payload.len()..payload_start + payload.len() + 4],
        crc,
    );
    Ok(())
}

/// A decoded frame: the header, an optional parity subheader, a zero-copy
/// view of the payload within the input buffer, and the trailing CRC.
#[derive(Debug)]
pub struct DecodedFrame<'a> {
    pub header: BaseHeader,
    pub subheader: Option<ParitySubheader>,
    pub payload: &'a [u8],
    pub crc: u32,
}

/// Parses a frame buffer. Performs size-only validation; does not verify the
/// CRC (see [`verify_payload_crc`]).
pub fn decode_frame(in_: &[u8]) -> Result<DecodedFrame<'_>> {
    if in_.len() < BASE_HEADER_LEN + CRC_TRAILER_LEN {
        return Err(FecError::FrameTruncated {
            need: BASE_HEADER_LEN + CRC_TRAILER_LEN,
            got: in_.len(),
        });
    }

    let header = BaseHeader::read_from(&in_[..BASE_HEADER_LEN]);
    let has_parity_sub = is_parity_frame(&header);

    let header_bytes = BASE_HEADER_LEN
        + if has_parity_sub {
            PARITY_SUBHEADER_LEN
        } else {
            0
        };
    let total_needed = header_bytes + header.payload_len as usize + CRC_TRAILER_LEN;
    if in_.len() < total_needed {
        return Err(FecError::FrameTruncated {
            need: total_needed,
            got: in_.len(),
        });
    }

    let mut off = BASE_HEADER_LEN;
    let subheader = if has_parity_sub {
        let ps = ParitySubheader {
            fec_scheme_id: in_[off],
            fec_parity_index: in_[off + 1],
        };
        off += PARITY_SUBHEADER_LEN;
        Some(ps)
    } else {
        None
    };

    let payload = &in_[off..off + header.payload_len as usize];
    off += header.payload_len as usize;
    let crc = crc::read_u32_le(&in_[off..off + CRC_TRAILER_LEN]);

    Ok(DecodedFrame {
        header,
        subheader,
        payload,
        crc,
    })
}

/// Recomputes CRC32C over `payload` and compares it against `crc`.
pub fn verify_payload_crc(payload: &[u8], crc: u32) -> bool {
    crc32c(payload) == crc
}
