//! Transmit-side block assembler: turns `N` data payloads plus a [`TxConfig`]
//! into `N+K` on-wire frames for one generation.

use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::error::{FecError, Result};
use crate::fec::FecEncoder;
use crate::frame::{
    encode_data_frame, encode_parity_frame, encoded_size, flags2_pack, BaseHeader,
    ParitySubheader, PROTOCOL_VERSION,
};
use crate::telemetry;

/// Static shape of one TX assembler instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TxConfig {
    /// Data frames per block.
    pub n: u16,
    /// Parity frames per block.
    pub k: u16,
    /// Per-frame payload cap.
    pub max_payload_len: u16,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            n: 8,
            k: 1,
            max_payload_len: 1300,
        }
    }
}

impl TxConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=255).contains(&self.n) {
            return Err(FecError::InvalidConfig(format!(
                "N must be in [1..255], got {}",
                self.n
            )));
        }
        if self.k > 4 {
            return Err(FecError::InvalidConfig(format!(
                "K must be in [0..4], got {}",
                self.k
            )));
        }
        if self.max_payload_len == 0 {
            return Err(FecError::InvalidConfig(
                "max_payload_len must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Assembles complete blocks (`N` data + `K` parity frames) for one TX
/// stream. Holds only a monotonic generation counter; otherwise stateless
/// per block.
pub struct TxBlockAssembler {
    cfg: TxConfig,
    next_gen_id: u32,
}

impl TxBlockAssembler {
    pub fn new(cfg: TxConfig, gen_seed: u32) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            next_gen_id: gen_seed,
        })
    }

    /// Seeds the generation counter from the steady clock, matching the
    /// teacher crate's `default_seed` fallback for unspecified seeds.
    pub fn with_clock_seed(cfg: TxConfig) -> Result<Self> {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u32)
            .unwrap_or(1);
        Self::new(cfg, seed.max(1))
    }

    /// The generation id that the next `assemble_block` call will use.
    pub fn peek_next_gen(&self) -> u32 {
        self.next_gen_id
    }

    /// Builds one block's `N+K` on-wire frames from `data_payloads`.
    ///
    /// `data_payloads.len()` must equal `N`, all payloads must share one
    /// non-zero length `L <= max_payload_len`. On success, returns frames in
    /// the order `data[0..N-1], parity[0..K-1]` and advances the generation
    /// counter by exactly one.
    pub fn assemble_block(&mut self, data_payloads: &[&[u8]]) -> Result<Vec<Vec<u8>>> {
        let n = self.cfg.n as usize;
        if data_payloads.len() != n {
            return Err(FecError::ShapeMismatch(format!(
                "expected {n} data payloads, got {}",
                data_payloads.len()
            )));
        }
        if n == 0 {
            return Err(FecError::ShapeMismatch("N must be > 0".into()));
        }

        let l = data_payloads[0].len();
        if l == 0 {
            return Err(FecError::ShapeMismatch("payload length must be > 0".into()));
        }
        if l > self.cfg.max_payload_len as usize {
            return Err(FecError::PayloadTooLarge {
                len: l,
                max: self.cfg.max_payload_len as usize,
            });
        }
        for (i, p) in data_payloads.iter().enumerate() {
            if p.len() != l {
                return Err(FecError::ShapeMismatch(format!(
                    "payload {i} has length {}, expected {l}",
                    p.len()
                )));
            }
        }

        let k = self.cfg.k;
        let parity = if k == 0 {
            Vec::new()
        } else {
            let encoder = FecEncoder::new(k)?;
            encoder.encode(data_payloads, l)?
        };
        let scheme_id = if k == 0 {
            0
        } else {
            FecEncoder::new(k)?.scheme().scheme_id().as_u8()
        };

        let gen = self.next_gen_id;
        self.next_gen_id = self.next_gen_id.wrapping_add(1);

        let mut frames = Vec::with_capacity(n + k as usize);

        for i in 0..n {
            let header = BaseHeader {
                version: PROTOCOL_VERSION,
                flags1: 0,
                flags2: flags2_pack(k.max(1)),
                gen_id: gen,
                seq_in_block: i as u16,
                data_count: n as u16,
                parity_count: k,
                payload_len: l as u16,
            };
            let mut buf = vec![0u8; encoded_size(l, false)];
            encode_data_frame(&mut buf, &header, data_payloads[i]).map_err(|e| {
                error!("assemble_block: failed to encode data frame {i} of gen {gen}: {e}");
                e
            })?;
            telemetry::FRAMES_ENCODED.inc();
            frames.push(buf);
        }

        for j in 0..k as usize {
            let header = BaseHeader {
                version: PROTOCOL_VERSION,
                flags1: 0,
                flags2: flags2_pack(k.max(1)),
                gen_id: gen,
                seq_in_block: (n + j) as u16,
                data_count: n as u16,
                parity_count: k,
                payload_len: l as u16,
            };
            let sub = ParitySubheader {
                fec_scheme_id: scheme_id,
                fec_parity_index: j as u8,
            };
            let mut buf = vec![0u8; encoded_size(l, true)];
            encode_parity_frame(&mut buf, &header, &sub, &parity[j]).map_err(|e| {
                error!("assemble_block: failed to encode parity frame {j} of gen {gen}: {e}");
                e
            })?;
            telemetry::FRAMES_ENCODED.inc();
            frames.push(buf);
        }

        debug!(
            "assembled block gen={gen} N={n} K={k} L={l}, {} frames",
            frames.len()
        );
        Ok(frames)
    }
}
