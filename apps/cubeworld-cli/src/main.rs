mod config;
mod physics;
mod runner;
mod scene;

use clap::{Parser, Subcommand};
use config::RuntimeConfig;
use cubeworld_kernel::character::build_character;
use cubeworld_kernel::{InstanceFactory, InstanceTree};
use cubeworld_tools::TreeInspector;
use runner::{Role, Runner};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cubeworld", about = "Headless cubeworld server and client")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML runtime config (tick/send rates, net and sync tuning)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the default scene with one character in it
    Tree {
        /// Emit JSON instead of an outline
        #[arg(long)]
        json: bool,
    },
    /// Host a map and relay every client's position
    Server {
        #[arg(short, long, default_value = scene::DEFAULT_MAP)]
        map: String,
        #[arg(short, long, default_value = "7777")]
        port: u16,
        /// Name of the server's own avatar
        #[arg(short, long, default_value = "Host")]
        name: String,
        /// Stop after this many ticks (runs until killed otherwise)
        #[arg(short, long)]
        ticks: Option<u64>,
    },
    /// Join a server
    Client {
        #[arg(short, long, default_value = "127.0.0.1")]
        address: String,
        #[arg(short, long, default_value = "7777")]
        port: u16,
        #[arg(short, long, default_value = "Player")]
        name: String,
        /// Stop after this many ticks (runs until killed otherwise)
        #[arg(short, long)]
        ticks: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = RuntimeConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("cubeworld v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: {}", cubeworld_kernel::crate_info());
            println!("net: {}", cubeworld_net::crate_info());
            println!("sync: {}", cubeworld_sync::crate_info());
            println!("tools: {}", cubeworld_tools::crate_info());
            println!(
                "tick={}Hz send={}Hz max_peers={}",
                config.tick_rate_hz, config.send_rate_hz, config.net.max_peers
            );
        }
        Commands::Tree { json } => {
            let factory = InstanceFactory::with_builtin_classes();
            let mut tree = InstanceTree::new();
            let scene = scene::build(&mut tree, &factory);
            let character = build_character(&mut tree, &factory, "Player", scene::SPAWN_POINT);
            tree.set_parent(character, Some(scene.workspace));

            if json {
                println!("{}", TreeInspector::dump_json(&tree, scene.game)?);
            } else {
                print!("{}", TreeInspector::outline(&tree, scene.game));
                println!("{}", TreeInspector::summary(&tree));
            }
        }
        Commands::Server {
            map,
            port,
            name,
            ticks,
        } => {
            let mut runner = Runner::new(config, &name);
            runner.start(&Role::Server { map, port })?;
            runner.run(ticks);
            runner.shutdown();
        }
        Commands::Client {
            address,
            port,
            name,
            ticks,
        } => {
            let mut runner = Runner::new(config, &name);
            runner.start(&Role::Client { address, port })?;
            runner.run(ticks);
            runner.shutdown();
        }
    }

    Ok(())
}
