//! End-to-end TX assembly -> wire frames -> RX reassembly, covering the
//! scenario table's recovery cases through the public API only.

use ltfec::frame::decode_frame;
use ltfec::{RxBlockTable, RxConfig, TxBlockAssembler, TxConfig};

fn build_frames(n: u16, k: u16, payloads: &[&[u8]]) -> Vec<Vec<u8>> {
    let cfg = TxConfig {
        n,
        k,
        max_payload_len: 1300,
    };
    let mut tx = TxBlockAssembler::new(cfg, 0).unwrap();
    tx.assemble_block(payloads).unwrap()
}

fn ingest_except(table: &mut RxBlockTable, frames: &[Vec<u8>], drop: &[usize], now_ms: u64) {
    for (i, frame) in frames.iter().enumerate() {
        if drop.contains(&i) {
            continue;
        }
        let decoded = decode_frame(frame).unwrap();
        table
            .ingest(now_ms, &decoded.header, decoded.subheader.as_ref(), decoded.payload)
            .unwrap();
    }
}

#[test]
fn scenario_1_xor_single_loss_recovery() {
    let frames = build_frames(3, 1, &[b"AAAAAA", b"BBBBBB", b"CCCCCC"]);
    let mut table = RxBlockTable::new(RxConfig::default()).unwrap();
    ingest_except(&mut table, &frames, &[1], 1000);

    let closed = table.close_if_ready(0, 1060).expect("block must be closable by t=1060");
    assert_eq!(closed.was_recovered, vec![false, true, false]);
    assert_eq!(closed.data[1], b"BBBBBB");
}

#[test]
fn scenario_2_gf256_k2_double_loss_recovery() {
    let payloads: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i.wrapping_mul(17); 6]).collect();
    let refs: Vec<&[u8]> = payloads.iter().map(|p| p.as_slice()).collect();
    let frames = build_frames(5, 2, &refs);

    let mut table = RxBlockTable::new(RxConfig::default()).unwrap();
    ingest_except(&mut table, &frames, &[1, 3], 0);

    let closed = table.close_if_ready(0, 60).unwrap();
    assert!(closed.was_recovered[1] && closed.was_recovered[3]);
    assert_eq!(closed.data[1], payloads[1]);
    assert_eq!(closed.data[3], payloads[3]);
}

#[test]
fn scenario_3_gf256_k3_recovery_with_omitted_parity_row() {
    let payloads: Vec<Vec<u8>> = (0..4u8).map(|i| vec![i.wrapping_mul(9); 6]).collect();
    let refs: Vec<&[u8]> = payloads.iter().map(|p| p.as_slice()).collect();
    let frames = build_frames(4, 3, &refs);
    // Frame order: data0..data3, parity0, parity1, parity2 (indices 4,5,6).
    let mut table = RxBlockTable::new(RxConfig::default()).unwrap();
    ingest_except(&mut table, &frames, &[1, 2, 5], 0);

    let closed = table.close_if_ready(0, 60).unwrap();
    assert!(closed.was_recovered[1] && closed.was_recovered[2]);
    assert_eq!(closed.data[1], payloads[1]);
    assert_eq!(closed.data[2], payloads[2]);
}

#[test]
fn no_losses_closes_immediately_with_no_recovery_work() {
    let frames = build_frames(4, 1, &[b"aaaa", b"bbbb", b"cccc", b"dddd"]);
    let mut table = RxBlockTable::new(RxConfig::default()).unwrap();
    ingest_except(&mut table, &frames, &[], 100);

    assert!(table.should_close(0, 100));
    let closed = table.close_if_ready(0, 100).unwrap();
    assert!(closed.was_recovered.iter().all(|&r| !r));
    assert_eq!(closed.data[0], b"aaaa");
}

#[test]
fn snapshot_reflects_partial_ingest_without_closing() {
    let frames = build_frames(3, 1, &[b"AAAAAA", b"BBBBBB", b"CCCCCC"]);
    let mut table = RxBlockTable::new(RxConfig::default()).unwrap();
    ingest_except(&mut table, &frames, &[2, 3], 10);

    let snap = table.snapshot(0).expect("block is tracked after partial ingest");
    assert_eq!(snap.n, 3);
    assert_eq!(snap.k, 1);
    assert_eq!(snap.data_seen, 2);
    assert!(!snap.have_all_data);
    assert!(!snap.have_any_parity);
}
