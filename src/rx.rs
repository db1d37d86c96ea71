//! Receive-side block table: per-generation reassembly state, the
//! time/completeness closure policy, and post-closure recovery dispatch.

use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{FecError, Result};
use crate::fec::recover_missing;
use crate::frame::{BaseHeader, ParitySubheader};
use crate::telemetry;

/// Runtime configuration for one RX block table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RxConfig {
    /// Upper bound, in milliseconds, on how long to wait for late frames.
    pub reorder_ms: u64,
    /// Hint used to derive the closure low watermark.
    pub fps: u32,
    pub max_payload_len: u16,
}

impl Default for RxConfig {
    fn default() -> Self {
        Self {
            reorder_ms: 50,
            fps: 30,
            max_payload_len: 1300,
        }
    }
}

impl RxConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(FecError::InvalidConfig("fps must be >= 1".into()));
        }
        if self.max_payload_len == 0 {
            return Err(FecError::InvalidConfig(
                "max_payload_len must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Read-only summary of one tracked generation's reassembly state, useful
/// for tests and metrics without closing (and thus destroying) the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxSnapshot {
    pub n: u16,
    pub k: u16,
    pub data_seen: u16,
    pub parity_seen: u16,
    pub have_all_data: bool,
    pub have_any_parity: bool,
    pub payload_len: u16,
}

/// The closure-policy clock and completeness bitmaps for one block.
struct BlockTracker {
    n: u16,
    reorder_ms: u64,
    fps: u32,
    started: bool,
    start_ms: u64,
    last_ms: u64,
    data_seen: Vec<bool>,
    parity_seen: Vec<bool>,
}

impl BlockTracker {
    fn new(n: u16, k: u16, reorder_ms: u64, fps: u32) -> Self {
        Self {
            n,
            reorder_ms,
            fps,
            started: false,
            start_ms: 0,
            last_ms: 0,
            data_seen: vec![false; n as usize],
            parity_seen: vec![false; k as usize],
        }
    }

    fn touch(&mut self, now_ms: u64) {
        if !self.started {
            self.started = true;
            self.start_ms = now_ms;
        }
        self.last_ms = now_ms;
    }

    fn mark_data(&mut self, seq_in_block: u16, now_ms: u64) {
        self.touch(now_ms);
        if let Some(slot) = self.data_seen.get_mut(seq_in_block as usize) {
            *slot = true;
        }
    }

    fn mark_parity(&mut self, parity_index: u8, now_ms: u64) {
        self.touch(now_ms);
        if let Some(slot) = self.parity_seen.get_mut(parity_index as usize) {
            *slot = true;
        }
    }

    fn data_seen_count(&self) -> u16 {
        self.data_seen.iter().filter(|&&b| b).count() as u16
    }

    fn parity_seen_count(&self) -> u16 {
        self.parity_seen.iter().filter(|&&b| b).count() as u16
    }

    fn have_all_data(&self) -> bool {
        self.data_seen.iter().all(|&b| b)
    }

    fn have_any_parity(&self) -> bool {
        self.parity_seen.iter().any(|&b| b)
    }

    /// Nominal block wall-time: `ceil(1000*N/fps)` ms.
    fn span_ms(&self) -> u64 {
        if self.fps == 0 {
            return 0;
        }
        let num = 1000u64 * self.n as u64 + (self.fps as u64 - 1);
        num / self.fps as u64
    }

    fn age_ms(&self, now_ms: u64) -> u64 {
        if !self.started {
            return 0;
        }
        now_ms.saturating_sub(self.start_ms)
    }

    /// Three independent closure triggers: completeness (parity seen and
    /// all data present), the reorder window, and the low watermark
    /// `min(60, 2*span_ms)` that keeps blocks from lingering at small N/fps.
    fn should_close(&self, now_ms: u64) -> bool {
        if !self.started {
            return false;
        }
        if self.have_any_parity() && self.have_all_data() {
            return true;
        }
        let min_deadline = 60u64.min(2 * self.span_ms());
        let age = self.age_ms(now_ms);
        age >= self.reorder_ms || age >= min_deadline
    }
}

/// Per-generation reassembly state: sparse data/parity payload arrays plus
/// the closure tracker.
struct RxBlock {
    gen_id: u32,
    n: u16,
    k: u16,
    payload_len: u16,
    data: Vec<Vec<u8>>,
    parity: Vec<Vec<u8>>,
    tracker: BlockTracker,
}

impl RxBlock {
    fn new(gen_id: u32, n: u16, k: u16, payload_len: u16, cfg: &RxConfig) -> Self {
        Self {
            gen_id,
            n,
            k,
            payload_len,
            data: vec![Vec::new(); n as usize],
            parity: vec![Vec::new(); k as usize],
            tracker: BlockTracker::new(n, k, cfg.reorder_ms, cfg.fps),
        }
    }

    /// Stores one frame's payload. Duplicates overwrite (last wins); this
    /// is a deliberate policy choice, not a safety gap — see DESIGN.md.
    fn ingest(
        &mut self,
        now_ms: u64,
        is_parity: bool,
        seq_in_block: u16,
        parity_index: u8,
        payload: &[u8],
    ) {
        if is_parity {
            if let Some(slot) = self.parity.get_mut(parity_index as usize) {
                slot.clear();
                slot.extend_from_slice(payload);
                self.tracker.mark_parity(parity_index, now_ms);
            }
        } else if let Some(slot) = self.data.get_mut(seq_in_block as usize) {
            slot.clear();
            slot.extend_from_slice(payload);
            self.tracker.mark_data(seq_in_block, now_ms);
        }
    }

    fn should_close(&self, now_ms: u64) -> bool {
        self.tracker.should_close(now_ms)
    }

    fn snapshot(&self) -> RxSnapshot {
        RxSnapshot {
            n: self.n,
            k: self.k,
            data_seen: self.tracker.data_seen_count(),
            parity_seen: self.tracker.parity_seen_count(),
            have_all_data: self.tracker.have_all_data(),
            have_any_parity: self.tracker.have_any_parity(),
            payload_len: self.payload_len,
        }
    }
}

/// The reassembled result of one closed generation. Some `data[i]` entries
/// may be empty if they could not be recovered; `was_recovered[i]` marks
/// which slots were filled in by FEC rather than received directly.
#[derive(Debug, Clone)]
pub struct ClosedBlock {
    pub gen_id: u32,
    pub n: u16,
    pub k: u16,
    pub l: u16,
    pub data: Vec<Vec<u8>>,
    pub was_recovered: Vec<bool>,
}

/// Maps `gen_id -> RxBlock`, tracking any number of concurrently
/// in-flight generations with no cross-generation ordering constraint.
pub struct RxBlockTable {
    cfg: RxConfig,
    blocks: HashMap<u32, RxBlock>,
}

impl RxBlockTable {
    pub fn new(cfg: RxConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            blocks: HashMap::new(),
        })
    }

    /// Ingests one decoded frame. Creates the block lazily on first sighting
    /// of its `gen_id`, capturing `(N, K, L)` from that frame; subsequent
    /// frames for the same `gen_id` must agree on `L` or are rejected.
    pub fn ingest(
        &mut self,
        now_ms: u64,
        header: &BaseHeader,
        subheader: Option<&ParitySubheader>,
        payload: &[u8],
    ) -> Result<()> {
        if payload.is_empty() {
            telemetry::FRAMES_DROPPED.with_label_values(&["shape"]).inc();
            return Err(FecError::ShapeMismatch("empty payload".into()));
        }
        if payload.len() > self.cfg.max_payload_len as usize {
            telemetry::FRAMES_DROPPED.with_label_values(&["shape"]).inc();
            return Err(FecError::PayloadTooLarge {
                len: payload.len(),
                max: self.cfg.max_payload_len as usize,
            });
        }

        let gen_id = header.gen_id;
        let is_new_gen = !self.blocks.contains_key(&gen_id);
        let block = match self.blocks.get(&gen_id) {
            Some(existing) if existing.payload_len as usize != payload.len() => {
                warn!(
                    "ingest: gen={gen_id} payload len {} disagrees with block's {}",
                    payload.len(),
                    existing.payload_len
                );
                telemetry::FRAMES_DROPPED.with_label_values(&["shape"]).inc();
                return Err(FecError::ShapeMismatch(format!(
                    "gen {gen_id} already has L={}, frame has L={}",
                    existing.payload_len,
                    payload.len()
                )));
            }
            Some(_) => self.blocks.get_mut(&gen_id).expect("just checked present"),
            None => {
                let block = RxBlock::new(
                    gen_id,
                    header.data_count,
                    header.parity_count,
                    payload.len() as u16,
                    &self.cfg,
                );
                self.blocks.entry(gen_id).or_insert(block)
            }
        };
        if is_new_gen {
            telemetry::ACTIVE_BLOCKS.inc();
        }

        // parity_index must agree with seq_in_block - N; the source left this
        // unchecked, but a mismatch means either end disagrees on block shape.
        match subheader {
            Some(ps)
                if (ps.fec_parity_index as u16) < block.k
                    && header.seq_in_block >= header.data_count
                    && header.seq_in_block - header.data_count == ps.fec_parity_index as u16 =>
            {
                block.ingest(now_ms, true, 0, ps.fec_parity_index, payload);
            }
            Some(_) => {
                warn!(
                    "ingest: gen={gen_id} parity_index/seq_in_block mismatch, dropping frame"
                );
                telemetry::FRAMES_DROPPED.with_label_values(&["shape"]).inc();
                return Err(FecError::ShapeMismatch(
                    "parity_index does not agree with seq_in_block - data_count".into(),
                ));
            }
            None => {
                block.ingest(now_ms, false, header.seq_in_block, 0, payload);
            }
        }
        telemetry::FRAMES_DECODED.inc();
        Ok(())
    }

    pub fn should_close(&self, gen_id: u32, now_ms: u64) -> bool {
        self.blocks
            .get(&gen_id)
            .map(|b| b.should_close(now_ms))
            .unwrap_or(false)
    }

    pub fn snapshot(&self, gen_id: u32) -> Option<RxSnapshot> {
        self.blocks.get(&gen_id).map(|b| b.snapshot())
    }

    /// All tracked generation ids whose `should_close` currently holds.
    /// Callers may drain these in any order — closure has no
    /// cross-generation ordering constraint.
    pub fn closable_gens(&self, now_ms: u64) -> Vec<u32> {
        self.blocks
            .iter()
            .filter(|(_, b)| b.should_close(now_ms))
            .map(|(&g, _)| g)
            .collect()
    }

    /// If `gen_id` is closable, removes it from the table and returns the
    /// reassembled (and, where possible, recovered) result.
    pub fn close_if_ready(&mut self, gen_id: u32, now_ms: u64) -> Option<ClosedBlock> {
        let ready = self.blocks.get(&gen_id)?.should_close(now_ms);
        if !ready {
            return None;
        }
        let block = self.blocks.remove(&gen_id)?;
        telemetry::ACTIVE_BLOCKS.dec();
        Some(close_block(block))
    }

    /// Convenience: closes every currently-closable generation.
    pub fn drain_closable(&mut self, now_ms: u64) -> Vec<ClosedBlock> {
        let gens = self.closable_gens(now_ms);
        gens.into_iter()
            .filter_map(|g| self.close_if_ready(g, now_ms))
            .collect()
    }
}

fn close_block(block: RxBlock) -> ClosedBlock {
    let RxBlock {
        gen_id,
        n,
        k,
        payload_len,
        mut data,
        parity,
        ..
    } = block;

    let missing: Vec<usize> = data
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.is_empty())
        .map(|(i, _)| i)
        .collect();

    let mut was_recovered = vec![false; n as usize];

    if missing.is_empty() {
        debug!("close gen={gen_id}: complete, no recovery needed");
        telemetry::BLOCKS_CLOSED.inc();
        return ClosedBlock {
            gen_id,
            n,
            k,
            l: payload_len,
            data,
            was_recovered,
        };
    }

    let l = payload_len as usize;
    let present_parity_count = parity.iter().filter(|p| p.len() == l).count();
    let can_attempt = match k {
        1 => missing.len() == 1 && present_parity_count >= 1,
        2..=4 => missing.len() <= k as usize && present_parity_count >= missing.len(),
        _ => false,
    };

    if can_attempt {
        let data_opt: Vec<Option<&[u8]>> = data
            .iter()
            .map(|d| if d.is_empty() { None } else { Some(d.as_slice()) })
            .collect();
        let parity_opt: Vec<Option<&[u8]>> = parity
            .iter()
            .map(|p| if p.len() == l { Some(p.as_slice()) } else { None })
            .collect();

        match recover_missing(k, &data_opt, &parity_opt, l, &missing) {
            Ok(recovered) => {
                for (slot_idx, bytes) in missing.iter().zip(recovered.into_iter()) {
                    data[*slot_idx] = bytes;
                    was_recovered[*slot_idx] = true;
                }
                debug!("close gen={gen_id}: recovered {} slot(s)", missing.len());
                telemetry::BLOCKS_RECOVERED.inc();
            }
            Err(e) => {
                warn!("close gen={gen_id}: recovery failed: {e}");
                telemetry::BLOCKS_UNRECOVERED.inc();
            }
        }
    } else {
        warn!(
            "close gen={gen_id}: {} missing, {present_parity_count} parity row(s) available, cannot recover",
            missing.len()
        );
        telemetry::BLOCKS_UNRECOVERED.inc();
    }

    telemetry::BLOCKS_CLOSED.inc();
    ClosedBlock {
        gen_id,
        n,
        k,
        l: payload_len,
        data,
        was_recovered,
    }
}
