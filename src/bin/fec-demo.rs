//! Demo/integration binary: drives `ltfec` end-to-end over real UDP sockets.
//!
//! This binary is deliberately small. The library never touches a socket;
//! everything here — transport, CLI surface, frame pacing — is glue the
//! core itself stays agnostic to.

use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use rand::RngCore;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use ltfec::frame::{decode_frame, verify_payload_crc};
use ltfec::{AppConfig, RxBlockTable, TxBlockAssembler, TxConfig};

#[derive(Parser, Debug)]
#[clap(author, version, about = "ltfec demo: send or receive a generation-coded UDP stream")]
struct Cli {
    /// Path to a TOML config file (tx/rx/sim sections); falls back to defaults.
    #[clap(long)]
    config: Option<std::path::PathBuf>,

    /// Expose Prometheus metrics on this address (e.g. 127.0.0.1:9102).
    #[clap(long)]
    metrics_addr: Option<String>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sends a stream of generations to a peer.
    Send {
        /// Local UDP address to bind.
        #[clap(long, default_value = "0.0.0.0:0")]
        bind: String,
        /// Peer address to send frames to.
        #[clap(long)]
        peer: String,
        /// Number of generations to send.
        #[clap(long, default_value_t = 100)]
        generations: u32,
    },
    /// Receives a stream of generations and reports reassembly outcomes.
    Recv {
        /// Local UDP address to bind.
        #[clap(long, default_value = "0.0.0.0:0")]
        bind: String,
    },
}

fn bind_socket(addr: &str) -> std::io::Result<UdpSocket> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{e}")))?;
    let domain = if addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };
    let sock = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    sock.set_reuse_address(true)?;
    sock.set_nonblocking(true)?;
    sock.bind(&addr.into())?;
    UdpSocket::from_std(sock.into())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

async fn run_send(cfg: TxConfig, bind: &str, peer: &str, generations: u32) -> std::io::Result<()> {
    let sock = bind_socket(bind)?;
    sock.connect(peer).await?;
    let mut tx = TxBlockAssembler::with_clock_seed(cfg).expect("valid tx config");
    let mut rng = rand::thread_rng();
    let payload_len = cfg.max_payload_len.min(64) as usize;

    for gen in 0..generations {
        let mut payloads: Vec<Vec<u8>> = vec![vec![0u8; payload_len]; cfg.n as usize];
        for p in &mut payloads {
            rng.fill_bytes(p);
        }
        let refs: Vec<&[u8]> = payloads.iter().map(|p| p.as_slice()).collect();
        let frames = match tx.assemble_block(&refs) {
            Ok(f) => f,
            Err(e) => {
                error!("send: failed to assemble generation {gen}: {e}");
                continue;
            }
        };
        for frame in &frames {
            if let Err(e) = sock.send(frame).await {
                warn!("send: socket error on generation {gen}: {e}");
            }
        }
        info!("send: generation {gen} ({} frames) sent", frames.len());
    }
    Ok(())
}

async fn run_recv(rx_cfg: ltfec::RxConfig, bind: &str) -> std::io::Result<()> {
    let sock = bind_socket(bind)?;
    let mut table = RxBlockTable::new(rx_cfg).expect("valid rx config");
    let mut buf = vec![0u8; 65536];

    loop {
        let (len, peer) = sock.recv_from(&mut buf).await?;
        let frame = &buf[..len];
        let decoded = match decode_frame(frame) {
            Ok(d) => d,
            Err(e) => {
                warn!("recv: malformed frame from {peer}: {e}");
                ltfec::telemetry::FRAMES_DROPPED
                    .with_label_values(&["truncated"])
                    .inc();
                continue;
            }
        };
        if !verify_payload_crc(decoded.payload, decoded.crc) {
            warn!("recv: CRC mismatch from {peer}, gen={}", decoded.header.gen_id);
            ltfec::telemetry::CRC_FAILURES.inc();
            ltfec::telemetry::FRAMES_DROPPED.with_label_values(&["crc"]).inc();
            continue;
        }

        let now = now_ms();
        if let Err(e) = table.ingest(now, &decoded.header, decoded.subheader.as_ref(), decoded.payload) {
            warn!("recv: ingest rejected frame from {peer}: {e}");
            continue;
        }

        for closed in table.drain_closable(now) {
            let holes = closed.was_recovered.iter().filter(|&&r| r).count();
            let missing = closed.data.iter().filter(|d| d.is_empty()).count();
            info!(
                "recv: closed gen={} N={} K={} recovered={} unrecovered_holes={}",
                closed.gen_id, closed.n, closed.k, holes, missing
            );
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let app_cfg = match &cli.config {
        Some(path) => AppConfig::from_file(path).unwrap_or_else(|e| {
            error!("config: {e}, falling back to defaults");
            AppConfig::default()
        }),
        None => AppConfig::default(),
    };
    if let Err(e) = app_cfg.validate() {
        error!("config invalid: {e}");
        std::process::exit(1);
    }

    if let Some(addr) = &cli.metrics_addr {
        ltfec::telemetry::serve(addr);
    }

    let result = match cli.command {
        Commands::Send { bind, peer, generations } => {
            run_send(app_cfg.tx, &bind, &peer, generations).await
        }
        Commands::Recv { bind } => run_recv(app_cfg.rx, &bind).await,
    };

    if let Err(e) = result {
        error!("fatal: {e}");
        std::process::exit(1);
    }
}
