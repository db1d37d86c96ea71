//! GF(256) arithmetic and the Vandermonde parity scheme for `K ∈ [2..4]`.
//!
//! Field: GF(2^8) with primitive polynomial `0x11D` (x^8 + x^4 + x^3 + x^2 + 1),
//! generator α = 2. Log/exp tables are built once, lazily, matching the
//! teacher crate's approach minus the SIMD dispatch — the payload sizes and
//! parity counts this scheme targets (`L <= 1300`, `K <= 4`) don't warrant it.

use std::sync::OnceLock;

use crate::error::{FecError, Result};

const IRREDUCIBLE_POLY: u16 = 0x11D;

struct GfTables {
    /// `exp[i] = α^i`, duplicated past 255 so `exp[a+b]` needs no modulo.
    exp: [u8; 512],
    /// `log[x] = i` such that `α^i == x`, for `x != 0`. `log[0]` is unused.
    log: [u8; 256],
}

fn tables() -> &'static GfTables {
    static TABLES: OnceLock<GfTables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut exp = [0u8; 512];
        let mut log = [0u8; 256];
        let mut x: u16 = 1;
        for i in 0..255usize {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= IRREDUCIBLE_POLY;
            }
        }
        for i in 255..512usize {
            exp[i] = exp[i - 255];
        }
        GfTables { exp, log }
    })
}

/// GF(256) multiplication via log/exp tables.
pub fn gf_mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = tables();
    let sum = t.log[a as usize] as usize + t.log[b as usize] as usize;
    t.exp[sum]
}

/// GF(256) addition, which is XOR.
pub fn gf_add(a: u8, b: u8) -> u8 {
    a ^ b
}

/// Multiplicative inverse in GF(256). `a` must be non-zero.
pub fn gf_inv(a: u8) -> u8 {
    debug_assert!(a != 0, "inverse of 0 is undefined in GF(256)");
    let t = tables();
    t.exp[255 - t.log[a as usize] as usize]
}

/// `α^e`, reducing `e` modulo the multiplicative order (255).
pub fn gf_pow_alpha(e: u32) -> u8 {
    tables().exp[(e % 255) as usize]
}

/// Computes parity row `j` over `data` (each slice `frame_len` bytes, `None`
/// slots contribute zero) into `out` (zeroed first).
///
/// `P_j[i] = XOR_d ( α^(j*d) * D_d[i] )`. Row 0 has every coefficient equal
/// to 1 and is therefore identical to plain XOR parity.
fn encode_row(data: &[Option<&[u8]>], frame_len: usize, j: usize, out: &mut [u8]) {
    out[..frame_len].fill(0);
    for (d, slot) in data.iter().enumerate() {
        let Some(src) = slot else { continue };
        let coef = gf_pow_alpha((j * d) as u32);
        if coef == 0 {
            continue;
        }
        for i in 0..frame_len {
            out[i] = gf_add(out[i], gf_mul(coef, src[i]));
        }
    }
}

/// Encodes `K = parity.len()` parity rows (`K ∈ [2..4]`) over `data`
/// (`N = data.len()` equal-length slices, `frame_len` bytes each).
pub fn encode(data: &[&[u8]], frame_len: usize, parity: &mut [Vec<u8>]) -> Result<()> {
    let k = parity.len();
    if !(2..=4).contains(&k) {
        return Err(FecError::ShapeMismatch(format!(
            "gf256::encode requires K in [2..4], got {k}"
        )));
    }
    let data_opt: Vec<Option<&[u8]>> = data.iter().map(|d| Some(*d)).collect();
    for (j, row) in parity.iter_mut().enumerate() {
        if row.len() != frame_len {
            row.resize(frame_len, 0);
        }
        encode_row(&data_opt, frame_len, j, row);
    }
    Ok(())
}

/// Solves `A x = b` over GF(256) in place via Gauss-Jordan elimination with
/// partial pivoting. `A` is `m*m` row-major. Returns `false` if singular.
fn solve(a: &mut [u8], b: &mut [u8], m: usize) -> bool {
    let idx = |r: usize, c: usize| r * m + c;

    for col in 0..m {
        let row = col;
        let mut piv = row;
        while piv < m && a[idx(piv, col)] == 0 {
            piv += 1;
        }
        if piv == m {
            return false;
        }
        if piv != row {
            for c in col..m {
                a.swap(idx(row, c), idx(piv, c));
            }
            b.swap(row, piv);
        }

        let inv = gf_inv(a[idx(row, col)]);
        for c in col..m {
            a[idx(row, c)] = gf_mul(a[idx(row, c)], inv);
        }
        b[row] = gf_mul(b[row], inv);

        for r in 0..m {
            if r == row {
                continue;
            }
            let factor = a[idx(r, col)];
            if factor == 0 {
                continue;
            }
            for c in col..m {
                a[idx(r, c)] = gf_add(a[idx(r, c)], gf_mul(factor, a[idx(row, c)]));
            }
            b[r] = gf_add(b[r], gf_mul(factor, b[row]));
        }
    }
    true
}

/// Recovers `missing_indices.len()` missing data slots from the available
/// parity rows. `data` has `None` for missing slots and `Some` for present
/// ones; `parity` has `None` for rows that never arrived. Writes recovered
/// bytes into `out_recovered[c]` for `missing_indices[c]`.
///
/// Per-byte-position, builds the `m x m` Vandermonde submatrix implied by
/// the first `m` available parity rows and solves it with Gauss-Jordan.
pub fn recover(
    data: &[Option<&[u8]>],
    parity: &[Option<&[u8]>],
    frame_len: usize,
    missing_indices: &[usize],
    out_recovered: &mut [Vec<u8>],
) -> Result<()> {
    let m = missing_indices.len();
    if m == 0 {
        return Ok(());
    }
    if out_recovered.len() != m {
        return Err(FecError::ShapeMismatch(
            "out_recovered.len() must equal missing_indices.len()".into(),
        ));
    }

    let rows: Vec<usize> = parity
        .iter()
        .enumerate()
        .filter_map(|(j, p)| p.map(|_| j))
        .take(m)
        .collect();
    if rows.len() < m {
        return Err(FecError::RecoveryInsufficient {
            missing: m,
            available: rows.len(),
        });
    }

    for row in out_recovered.iter_mut() {
        if row.len() != frame_len {
            row.resize(frame_len, 0);
        }
    }

    let n = data.len();
    for i in 0..frame_len {
        let mut a = vec![0u8; m * m];
        let mut b = vec![0u8; m];

        for (r, &j) in rows.iter().enumerate() {
            let parity_row = parity[j].expect("row selected because present");
            let mut rhs = parity_row[i];
            for d in 0..n {
                let Some(src) = data[d] else { continue };
                let coef = gf_pow_alpha((j * d) as u32);
                rhs = gf_add(rhs, gf_mul(coef, src[i]));
            }
            b[r] = rhs;

            for (c, &d) in missing_indices.iter().enumerate() {
                a[r * m + c] = gf_pow_alpha((j * d) as u32);
            }
        }

        if !solve(&mut a, &mut b, m) {
            return Err(FecError::RecoveryInsufficient {
                missing: m,
                available: rows.len(),
            });
        }

        for (c, &val) in b.iter().enumerate() {
            out_recovered[c][i] = val;
        }
    }

    Ok(())
}
