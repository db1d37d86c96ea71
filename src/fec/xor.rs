//! Baseline XOR parity for `K = 1`.

use crate::error::{FecError, Result};

/// Computes XOR parity over `data` (equal-length slices, `None` slots
/// contribute zero) into `out` (`frame_len` bytes, zeroed first).
pub fn encode(data: &[Option<&[u8]>], frame_len: usize, out: &mut [u8]) -> Result<()> {
    if out.len() < frame_len {
        return Err(FecError::EncodeBufferTooSmall {
            need: frame_len,
            have: out.len(),
        });
    }
    out[..frame_len].fill(0);
    for slot in data {
        let Some(src) = slot else { continue };
        for i in 0..frame_len {
            out[i] ^= src[i];
        }
    }
    Ok(())
}

/// Recovers the single missing data slot from `data` and `parity`.
///
/// Returns the recovered index on success. Fails if zero or more than one
/// slot is missing.
pub fn recover_one(
    data: &[Option<&[u8]>],
    parity: &[u8],
    frame_len: usize,
    out_recovered: &mut [u8],
) -> Result<usize> {
    if parity.len() < frame_len || out_recovered.len() < frame_len {
        return Err(FecError::ShapeMismatch(
            "parity/out_recovered shorter than frame_len".into(),
        ));
    }

    let mut missing: Option<usize> = None;
    for (i, slot) in data.iter().enumerate() {
        if slot.is_none() {
            if missing.is_some() {
                return Err(FecError::RecoveryInsufficient {
                    missing: 2,
                    available: 1,
                });
            }
            missing = Some(i);
        }
    }
    let Some(missing) = missing else {
        return Err(FecError::RecoveryInsufficient {
            missing: 0,
            available: 1,
        });
    };

    out_recovered[..frame_len].copy_from_slice(&parity[..frame_len]);
    for slot in data {
        let Some(src) = slot else { continue };
        for i in 0..frame_len {
            out_recovered[i] ^= src[i];
        }
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_tolerates_empty_slots() {
        let a = [1u8, 2, 3];
        let data = [Some(a.as_slice()), None];
        let mut out = [0u8; 3];
        encode(&data, 3, &mut out).unwrap();
        assert_eq!(out, a);
    }

    #[test]
    fn recovers_single_missing() {
        let a = b"AAAAAA";
        let b = b"BBBBBB";
        let c = b"CCCCCC";
        let full: [Option<&[u8]>; 3] = [Some(a), Some(b), Some(c)];
        let mut parity = [0u8; 6];
        encode(&full, 6, &mut parity).unwrap();

        let with_gap: [Option<&[u8]>; 3] = [Some(a), None, Some(c)];
        let mut recovered = [0u8; 6];
        let idx = recover_one(&with_gap, &parity, 6, &mut recovered).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(&recovered, b);
    }

    #[test]
    fn fails_on_zero_or_multiple_missing() {
        let a = b"AAAAAA";
        let full: [Option<&[u8]>; 2] = [Some(a), Some(a)];
        let parity = [0u8; 6];
        let mut out = [0u8; 6];
        assert!(recover_one(&full, &parity, 6, &mut out).is_err());

        let two_missing: [Option<&[u8]>; 2] = [None, None];
        assert!(recover_one(&two_missing, &parity, 6, &mut out).is_err());
    }
}
