//! End-to-end acceptance test against a simulated lossy Bernoulli channel:
//! FEC must meaningfully reduce the fraction of data frames an application
//! never recovers, relative to the raw per-frame loss rate.

mod common;

use common::{BernoulliLoss, XorShift32};
use ltfec::frame::decode_frame;
use ltfec::{RxBlockTable, RxConfig, TxBlockAssembler, TxConfig};

fn run_channel(p_loss: f64, seed: u32) -> (u64, u64) {
    let tx_cfg = TxConfig {
        n: 8,
        k: 1,
        max_payload_len: 1300,
    };
    let rx_cfg = RxConfig {
        reorder_ms: 50,
        fps: 30,
        max_payload_len: 1300,
    };
    let mut tx = TxBlockAssembler::new(tx_cfg, 1).unwrap();
    let mut rx = RxBlockTable::new(rx_cfg).unwrap();
    let mut rng = XorShift32::new(seed);
    let channel = BernoulliLoss { p_loss };

    // 15 s of blocks at fps=30, N=8 data frames per block -> ceil(1000*8/30)
    // ms of wall time per block; run enough generations to cover ~15 s.
    let block_span_ms = 267u64;
    let generations = (15_000 / block_span_ms).max(1) as u32;

    let mut raw_data_losses: u64 = 0;
    let mut total_data_frames: u64 = 0;
    let mut now_ms = 0u64;

    for gen in 0..generations {
        let payloads: Vec<Vec<u8>> = (0..8u16)
            .map(|i| vec![(gen as u8).wrapping_add(i as u8); 64])
            .collect();
        let refs: Vec<&[u8]> = payloads.iter().map(|p| p.as_slice()).collect();
        let frames = tx.assemble_block(&refs).unwrap();

        for (i, frame) in frames.iter().enumerate() {
            let is_data = i < 8;
            if is_data {
                total_data_frames += 1;
            }
            if channel.drop(&mut rng) {
                if is_data {
                    raw_data_losses += 1;
                }
                continue;
            }
            let decoded = decode_frame(frame).unwrap();
            rx.ingest(now_ms, &decoded.header, decoded.subheader.as_ref(), decoded.payload)
                .unwrap();
        }
        now_ms += block_span_ms;
    }

    // Drain every generation; by now all are well past their closure deadline.
    let mut effective_data_losses: u64 = 0;
    for closed in rx.drain_closable(now_ms + 1000) {
        effective_data_losses += closed.data.iter().filter(|d| d.is_empty()).count() as u64;
    }

    let _ = total_data_frames;
    (raw_data_losses, effective_data_losses)
}

#[test]
fn scenario_6_fec_meaningfully_reduces_effective_loss() {
    for (p_loss, seed) in [(0.01, 11), (0.03, 22), (0.05, 33)] {
        let (raw, effective) = run_channel(p_loss, seed);
        if raw == 0 {
            // Extremely unlikely at these generation counts, but a raw loss
            // count of zero trivially satisfies "no worse than raw loss".
            assert_eq!(effective, 0);
            continue;
        }
        let ratio = effective as f64 / raw as f64;
        assert!(
            ratio <= 0.22,
            "p_loss={p_loss}: effective/raw = {ratio:.3} (raw={raw}, effective={effective}), expected <= 0.22"
        );
    }
}
