//! bdi — run one agent, or a coordinating pair, against an in-memory world.
//!
//! Parcels are scattered over the map's spawn tiles from a fixed seed, so a
//! run is repeatable up to task interleaving.  Each agent acts in its own
//! [`LocalWorld`]; in paired mode the two share beliefs and reserve tiles
//! through a [`ChannelPeer`] link.
//!
//! ```bash
//! bdi --config demos/agent.toml --map demos/map.csv --paired --seconds 20
//! ```

mod logging;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use bdi_agent::{event_channel, load_config, Agent, AgentBuilder, AgentConfig, ChannelPeer, LocalWorld, PeerInfo};
use bdi_core::Position;
use bdi_graph::{load_tiles_csv, load_tiles_reader, TileKind, TileMap};

// ── Constants ─────────────────────────────────────────────────────────────────

const MIN_REWARD: u32 = 5;
const MAX_REWARD: u32 = 30;

// 7 × 3 corridor block, delivery tiles in the right-hand column.
const DEMO_MAP_CSV: &str = "\
x,y,kind\n\
0,0,spawn\n1,0,spawn\n2,0,spawn\n3,0,spawn\n4,0,spawn\n5,0,spawn\n6,0,delivery\n\
0,1,spawn\n1,1,spawn\n3,1,spawn\n5,1,spawn\n6,1,delivery\n\
0,2,spawn\n1,2,spawn\n2,2,spawn\n3,2,spawn\n4,2,spawn\n5,2,spawn\n6,2,delivery\n\
";

// ── Command line ──────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "bdi", version, about = "BDI parcel-delivery agent on an in-memory grid world")]
struct Cli {
    /// Agent configuration (TOML).  A missing file means defaults.
    #[arg(short, long, default_value = "agent.toml")]
    config: PathBuf,

    /// Tile map CSV (`x,y,kind`).  Uses a small built-in map if omitted.
    #[arg(short, long)]
    map: Option<PathBuf>,

    /// Run two agents that pair up and reserve tiles.
    #[arg(long)]
    paired: bool,

    /// Parcels scattered per world.
    #[arg(long, default_value_t = 4)]
    parcels: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Stop after this long.
    #[arg(long, default_value_t = 10)]
    seconds: u64,

    /// Time each move takes, in milliseconds.
    #[arg(long, default_value_t = 100)]
    step_ms: u64,
}

// ── main ──────────────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    let tiles = match &cli.map {
        Some(path) => load_tiles_csv(path).with_context(|| format!("loading map {}", path.display()))?,
        None => load_tiles_reader(DEMO_MAP_CSV.as_bytes()).context("parsing the built-in map")?,
    };

    let spawns = spawn_tiles(&tiles);
    if spawns.len() < 2 {
        bail!("the map needs at least two spawn tiles");
    }
    info!(tiles = tiles.tile_count(), spawns = spawns.len(), "map loaded");

    let mut rng = SmallRng::seed_from_u64(cli.seed);
    let limit = Duration::from_secs(cli.seconds);

    if cli.paired || config.coordination {
        config.coordination = true;
        run_pair(&cli, config, tiles, &spawns, &mut rng, limit).await
    } else {
        run_solo(&cli, config, tiles, &spawns, &mut rng, limit).await
    }
}

// ── Runs ──────────────────────────────────────────────────────────────────────

async fn run_solo(
    cli:    &Cli,
    config: AgentConfig,
    tiles:  TileMap,
    spawns: &[Position],
    rng:    &mut SmallRng,
    limit:  Duration,
) -> Result<()> {
    let (tx, rx) = event_channel();
    let world = Arc::new(
        scatter(LocalWorld::new(tiles.clone(), "a1", "alice", spawns[0]), "a", spawns, cli.parcels, rng)
            .with_step_delay(Duration::from_millis(cli.step_ms))
            .with_events(tx.downgrade()),
    );
    world.emit();

    let (mut agent, _inbox) = AgentBuilder::new(config, tiles, world.self_percept())
        .world(world.clone())
        .channel(tx, rx)
        .build()?;

    run_for(limit, &mut agent).await?;
    report("alice", &world);
    Ok(())
}

async fn run_pair(
    cli:    &Cli,
    config: AgentConfig,
    tiles:  TileMap,
    spawns: &[Position],
    rng:    &mut SmallRng,
    limit:  Duration,
) -> Result<()> {
    let alice = PeerInfo::new("a1", "alice");
    let bob   = PeerInfo::new("a2", "bob");
    let (a_tx, a_rx) = event_channel();
    let (b_tx, b_rx) = event_channel();
    let step = Duration::from_millis(cli.step_ms);
    let last = spawns[spawns.len() - 1];

    let a_world = Arc::new(
        scatter(LocalWorld::new(tiles.clone(), alice.id.clone(), "alice", spawns[0]), "a", spawns, cli.parcels, rng)
            .with_step_delay(step)
            .with_events(a_tx.downgrade()),
    );
    let b_world = Arc::new(
        scatter(LocalWorld::new(tiles.clone(), bob.id.clone(), "bob", last), "b", spawns, cli.parcels, rng)
            .with_step_delay(step)
            .with_events(b_tx.downgrade()),
    );
    a_world.emit();
    b_world.emit();

    let a_peer = ChannelPeer::new(alice, b_tx.downgrade());
    let b_peer = ChannelPeer::new(bob, a_tx.downgrade());

    let (mut a_agent, _a_inbox) = AgentBuilder::new(config.clone(), tiles.clone(), a_world.self_percept())
        .world(a_world.clone())
        .peer(a_peer)
        .channel(a_tx, a_rx)
        .build()?;
    let (mut b_agent, _b_inbox) = AgentBuilder::new(config, tiles, b_world.self_percept())
        .world(b_world.clone())
        .peer(b_peer)
        .channel(b_tx, b_rx)
        .build()?;

    let both = async { tokio::try_join!(a_agent.run(), b_agent.run()) };
    match tokio::time::timeout(limit, both).await {
        Ok(result) => {
            result?;
        }
        Err(_) => info!(seconds = limit.as_secs(), "time is up"),
    }

    report("alice", &a_world);
    report("bob", &b_world);
    Ok(())
}

async fn run_for(limit: Duration, agent: &mut Agent) -> Result<()> {
    match tokio::time::timeout(limit, agent.run()).await {
        Ok(result) => result?,
        Err(_) => info!(seconds = limit.as_secs(), "time is up"),
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn spawn_tiles(tiles: &TileMap) -> Vec<Position> {
    tiles
        .tiles()
        .filter(|&t| tiles.kind(t) == TileKind::Spawn)
        .map(|t| tiles.position(t))
        .collect()
}

fn scatter(
    mut world: LocalWorld,
    prefix:    &str,
    spawns:    &[Position],
    count:     usize,
    rng:       &mut SmallRng,
) -> LocalWorld {
    for i in 0..count {
        let Some(&at) = spawns.choose(rng) else { break };
        let reward = rng.gen_range(MIN_REWARD..=MAX_REWARD);
        world = world.with_parcel(&format!("{prefix}p{i}"), at, f64::from(reward));
    }
    world
}

fn report(name: &str, world: &LocalWorld) {
    println!(
        "{name:<6} score {:>5.1}  parcels left {:>2}  at {}",
        world.score(),
        world.parcels_left(),
        world.position(),
    );
}
