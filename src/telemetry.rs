//! Telemetry metrics for the FEC core.
//!
//! Exported metrics:
//! - `frames_encoded_total`: Frames emitted by the TX block assembler.
//! - `frames_decoded_total`: Frames successfully ingested by the RX block table.
//! - `frames_dropped_total{reason}`: Frames rejected before or during ingest,
//!   labeled by rejection cause (`crc`, `truncated`, `shape`).
//! - `blocks_closed_total`: Generations closed by the RX block table.
//! - `blocks_recovered_total`: Closed generations where FEC filled in every hole.
//! - `blocks_unrecovered_total`: Closed generations left with one or more holes.
//! - `crc_failures_total`: Payload CRC32C mismatches detected on ingest.
//! - `active_blocks`: Generations currently tracked (in-flight, not yet closed).
//!
//! This is ambient observability only; it does not implement the CSV metrics
//! writer, which stays an external collaborator.

use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static::lazy_static! {
    pub static ref FRAMES_ENCODED: IntCounter =
        register_int_counter!("frames_encoded_total", "Total frames emitted by the TX assembler").unwrap();
    pub static ref FRAMES_DECODED: IntCounter =
        register_int_counter!("frames_decoded_total", "Total frames accepted by the RX block table").unwrap();
    pub static ref FRAMES_DROPPED: IntCounterVec = register_int_counter_vec!(
        "frames_dropped_total",
        "Total frames rejected, by reason",
        &["reason"]
    )
    .unwrap();
    pub static ref BLOCKS_CLOSED: IntCounter =
        register_int_counter!("blocks_closed_total", "Total generations closed").unwrap();
    pub static ref BLOCKS_RECOVERED: IntCounter =
        register_int_counter!("blocks_recovered_total", "Generations closed with every hole recovered").unwrap();
    pub static ref BLOCKS_UNRECOVERED: IntCounter =
        register_int_counter!("blocks_unrecovered_total", "Generations closed with at least one unrecovered hole").unwrap();
    pub static ref CRC_FAILURES: IntCounter =
        register_int_counter!("crc_failures_total", "Total payload CRC32C mismatches").unwrap();
    pub static ref ACTIVE_BLOCKS: IntGauge =
        register_int_gauge!("active_blocks", "Generations currently tracked by the RX block table").unwrap();
}

/// Schema version for the external CSV event writer's column order. The
/// writer itself is out of scope for this crate; this constant and helper
/// only give it something authoritative to target.
pub const METRICS_SCHEMA_VERSION: u32 = 1;

/// The CSV header row an external metrics writer should emit, matching
/// `schema_version, run_uuid, ts_ms, app, event, ip, port, bytes`.
pub fn standard_header() -> &'static str {
    "schema_version,run_uuid,ts_ms,app,event,ip,port,bytes"
}

/// Serves the Prometheus text exposition format on `addr`, one connection
/// handled per accepted stream, matching the corpus's minimal metrics server.
pub fn serve(addr: &str) {
    use std::io::Write;
    use std::net::TcpListener;
    let listener = TcpListener::bind(addr).expect("bind metrics");
    std::thread::spawn(move || {
        let encoder = TextEncoder::new();
        for stream in listener.incoming() {
            if let Ok(mut s) = stream {
                let metrics = prometheus::gather();
                let mut buf = Vec::new();
                encoder.encode(&metrics, &mut buf).unwrap();
                let _ = s.write_all(&buf);
            }
        }
    });
}

/// Dumps the current metric values to the log, for short-lived CLI runs
/// that exit before a scrape would reach them.
pub fn flush() {
    let encoder = TextEncoder::new();
    let metrics = prometheus::gather();
    let mut buf = Vec::new();
    if encoder.encode(&metrics, &mut buf).is_ok() {
        log::info!("\n{}", String::from_utf8_lossy(&buf));
    }
}
