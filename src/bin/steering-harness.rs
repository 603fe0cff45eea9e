//! Steering coordinator — local two-AP demo harness.
//!
//! Wires up two in-process `BssContext`s joined by an
//! `InMemoryL2Channel` pair and drives scenario 1 from the design
//! (a STA associates to AP A, AP B picks up the flooded score and
//! blacklists the STA under FORCE mode). No real bridge or radio is
//! touched — this is for demoing and manually exercising the crate.

use clap::Parser;
use steering_coordinator::{
    bss, ApStackOps, BssHandle, InMemoryL2Channel, MacAddr, RecordingApStack, SteeringConfig,
    SteeringMode,
};
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "steering-harness", version, about = "Client-steering coordinator demo")]
struct Args {
    /// Steering mode applied to both demo APs: off, suggest, force.
    #[arg(short, long, default_value = "force")]
    mode: String,

    /// Simulated RSSI (dBm) of the STA's association to AP A.
    #[arg(long, default_value_t = -40)]
    rssi: i32,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("steering_coordinator=debug".parse().unwrap())
                .add_directive("steering_harness=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let mode: SteeringMode = args.mode.parse().unwrap();

    let bssid_a = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0xaa]);
    let bssid_b = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0xbb]);
    let sta = MacAddr([0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);

    let cfg_a = SteeringConfig {
        mode,
        bridge: "br-steer".into(),
        peers: vec![bssid_b],
        local_bssid: bssid_a,
        channel: 36,
    };
    let cfg_b = SteeringConfig {
        mode,
        bridge: "br-steer".into(),
        peers: vec![bssid_a],
        local_bssid: bssid_b,
        channel: 44,
    };

    let (tx_a, _rx_a) = tokio::sync::mpsc::unbounded_channel();
    let (tx_b, _rx_b) = tokio::sync::mpsc::unbounded_channel();

    let mut ap_a: bss::BssContext<RecordingApStack, InMemoryL2Channel> =
        bss::init(BssHandle(1), &cfg_a, tx_a, RecordingApStack::default())
            .expect("valid config")
            .expect("mode is not off");
    let mut ap_b: bss::BssContext<RecordingApStack, InMemoryL2Channel> =
        bss::init(BssHandle(2), &cfg_b, tx_b, RecordingApStack::default())
            .expect("valid config")
            .expect("mode is not off");

    info!("═══════════════════════════════════════════════");
    info!("  client-steering coordinator — two-AP demo");
    info!("═══════════════════════════════════════════════");

    let now = Instant::now();
    info!(%sta, rssi = args.rssi, "STA associates to AP A");
    ap_a.on_association(sta, args.rssi, now);

    for (dest, _ethertype, payload) in ap_a.channel.drain() {
        info!(%dest, "AP A -> peer: forwarding flooded frame");
        if dest == bssid_b {
            ap_b.on_rx(bssid_a, &payload, now);
        }
    }

    info!(state = ?ap_b.registry.find(sta).map(|c| c.state), "AP B's view of the STA after one flood");
    info!(blacklisted = ap_b.apstack.blacklisted.contains(&sta), "AP B blacklist state (FORCE mode only)");
}
