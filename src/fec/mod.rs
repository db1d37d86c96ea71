//! The FEC coding engine: XOR parity for `K=1`, GF(256) Vandermonde parity
//! for `K in [2..4]`, dispatched through a small tagged-enum façade instead
//! of runtime polymorphism.

pub mod gf256;
pub mod xor;

use crate::error::{FecError, Result};
use crate::frame::FecSchemeId;

/// The FEC scheme a block uses, selected purely from its parity count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FecScheme {
    XorK1,
    Gf256 { k: u16 },
}

impl FecScheme {
    /// Picks the scheme for a parity count. `K=0` (no parity) and `K>4`
    /// have no scheme.
    pub fn for_parity_count(k: u16) -> Option<Self> {
        match k {
            1 => Some(Self::XorK1),
            2..=4 => Some(Self::Gf256 { k }),
            _ => None,
        }
    }

    pub fn scheme_id(&self) -> FecSchemeId {
        match self {
            Self::XorK1 => FecSchemeId::XorK1,
            Self::Gf256 { k: 2 } => FecSchemeId::Gf256K2,
            Self::Gf256 { k: 3 } => FecSchemeId::Gf256K3,
            Self::Gf256 { k: 4 } => FecSchemeId::Gf256K4,
            Self::Gf256 { k } => unreachable!("FecScheme::Gf256 constructed with k={k} outside [2..4]"),
        }
    }

    pub fn parity_count(&self) -> u16 {
        match self {
            Self::XorK1 => 1,
            Self::Gf256 { k } => *k,
        }
    }
}

/// A thin façade that dispatches block-level parity encoding to the XOR or
/// GF(256) engine based on the configured parity count.
pub struct FecEncoder {
    scheme: FecScheme,
}

impl FecEncoder {
    /// Builds an encoder for `k` parity frames. Fails if `k` has no scheme
    /// (`0` or `>4`); callers with `K=0` simply skip FEC encoding entirely.
    pub fn new(k: u16) -> Result<Self> {
        let scheme = FecScheme::for_parity_count(k)
            .ok_or_else(|| FecError::ShapeMismatch(format!("no FEC scheme for K={k}")))?;
        Ok(Self { scheme })
    }

    pub fn scheme(&self) -> FecScheme {
        self.scheme
    }

    /// Encodes `self.scheme.parity_count()` parity rows over `data` (`N`
    /// equal-length slices, `frame_len` bytes each).
    pub fn encode(&self, data: &[&[u8]], frame_len: usize) -> Result<Vec<Vec<u8>>> {
        match self.scheme {
            FecScheme::XorK1 => {
                let opt: Vec<Option<&[u8]>> = data.iter().map(|d| Some(*d)).collect();
                let mut out = vec![0u8; frame_len];
                xor::encode(&opt, frame_len, &mut out)?;
                Ok(vec![out])
            }
            FecScheme::Gf256 { k } => {
                let mut parity = vec![vec![0u8; frame_len]; k as usize];
                gf256::encode(data, frame_len, &mut parity)?;
                Ok(parity)
            }
        }
    }
}

/// Recovers `missing_indices` data slots given the block's parity count `k`,
/// its data/parity slots (`None` where absent), and `frame_len`. Dispatches
/// to XOR single-erasure recovery for `k=1` or the GF(256) Gauss-Jordan
/// solver for `k in [2..4]`.
pub fn recover_missing(
    k: u16,
    data: &[Option<&[u8]>],
    parity: &[Option<&[u8]>],
    frame_len: usize,
    missing_indices: &[usize],
) -> Result<Vec<Vec<u8>>> {
    let scheme = FecScheme::for_parity_count(k)
        .ok_or_else(|| FecError::ShapeMismatch(format!("no FEC scheme for K={k}")))?;

    match scheme {
        FecScheme::XorK1 => {
            if missing_indices.len() != 1 {
                return Err(FecError::RecoveryInsufficient {
                    missing: missing_indices.len(),
                    available: parity.iter().filter(|p| p.is_some()).count(),
                });
            }
            let Some(Some(row)) = parity.first() else {
                return Err(FecError::RecoveryInsufficient {
                    missing: 1,
                    available: 0,
                });
            };
            let mut out = vec![0u8; frame_len];
            xor::recover_one(data, row, frame_len, &mut out)?;
            Ok(vec![out])
        }
        FecScheme::Gf256 { .. } => {
            let mut out = vec![Vec::new(); missing_indices.len()];
            gf256::recover(data, parity, frame_len, missing_indices, &mut out)?;
            Ok(out)
        }
    }
}
