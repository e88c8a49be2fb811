//! blockvault - storage automation devices for voxel sandbox engines
//!
//! Headless demo: routes items from a supply chest through a transfer
//! buffer into a sink chest, then consolidates the result into a deep
//! storage cache and broadcasts its sync snapshot.

mod config;

use anyhow::Result;
use blockvault_core::{Direction, ItemKind, ItemStack, SideMode};
use blockvault_devices::{
    ChangeSet, DeepCache, NeighborInventories, SlotInventory, TransferBuffer,
};
use blockvault_net::{encode_message, DeviceMessage, DeviceSnapshot};
use config::AutomationConfig;
use std::{env, path::PathBuf};
use tracing::{debug, info};

struct CliOptions {
    ticks: u64,
    config_path: Option<PathBuf>,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Self {
        let mut options = CliOptions {
            ticks: 200,
            config_path: None,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--ticks" => {
                    if let Some(value) = args.next().and_then(|v| v.parse().ok()) {
                        options.ticks = value;
                    }
                }
                "--config" => {
                    options.config_path = args.next().map(PathBuf::from);
                }
                other => {
                    tracing::warn!("Ignoring unknown argument: {other}");
                }
            }
        }
        options
    }
}

fn main() -> Result<()> {
    // Initialize tracing with INFO level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting blockvault v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1));
    let config = match &cli.config_path {
        Some(path) => AutomationConfig::load_from_path(path),
        None => AutomationConfig::load(),
    };
    let table = config.capacity_table();

    // A buffer pulling from the chest to its north and pushing into the
    // chest to its south.
    let mut buffer = TransferBuffer::new();
    for direction in Direction::ALL {
        buffer.set_side_mode(direction, SideMode::None);
    }
    buffer.set_side_mode(Direction::North, SideMode::Input);
    buffer.set_side_mode(Direction::South, SideMode::Output);
    buffer.set_amount_input(config.buffer_amount_input);
    buffer.set_amount_output(config.buffer_amount_output);

    let stone = ItemKind::Block(1);
    let mut supply = SlotInventory::new(27);
    for slot in 0..8 {
        supply.set_slot(slot, Some(ItemStack::new(stone, 64)));
    }
    let supply_total = supply.total_count();

    let mut neighbors = NeighborInventories::new();
    neighbors.attach(Direction::North, supply);
    neighbors.attach(Direction::South, SlotInventory::new(27));

    for tick in 0..cli.ticks {
        buffer.tick(false, &mut neighbors);
        let changes = buffer.take_changes();
        if changes.contains(ChangeSet::SYNC) {
            debug!(tick, active = buffer.active(), "buffer state broadcast");
        }
    }

    let routed = neighbors
        .side(Direction::South)
        .map_or(0, SlotInventory::total_count);
    info!(
        supply = supply_total,
        routed,
        ticks = cli.ticks,
        "buffer routing finished"
    );

    // Consolidate the routed items into a tier-1 cache.
    let mut cache = DeepCache::new(1, &table);
    let mut rejected: u64 = 0;
    if let Some(sink) = neighbors.side_mut(Direction::South) {
        for slot in 0..sink.len() {
            let Some(stack) = sink.slot(slot).cloned() else {
                continue;
            };
            sink.set_slot(slot, None);
            if let Some(remainder) = cache.insert(stack, false) {
                rejected += remainder.count as u64;
            }
        }
    }
    let _ = cache.take_changes();

    let withdrawn = cache.extract(64, false).map_or(0, |stack| stack.count);
    info!(
        stored = cache.stored_count(),
        capacity = cache.capacity(),
        meter = cache.meter_level(),
        comparator = cache.comparator_value(),
        rejected,
        withdrawn,
        "cache consolidated"
    );

    // The snapshot a server would broadcast for this cache.
    let snapshot = DeviceMessage::Snapshot(DeviceSnapshot::Cache {
        tier: cache.tier(),
        facing: cache.facing(),
        locked: cache.locked(),
        stored: cache.stored_item(),
    });
    let frame = encode_message(&snapshot)?;
    info!(bytes = frame.len(), "encoded cache snapshot");

    Ok(())
}
