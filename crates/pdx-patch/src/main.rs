use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    clean_patch, parse_mod_dir, resolve_conflicts, show_conflicts, ParseModArgs,
    ResolveConflictsArgs, ShowConflictsArgs,
};
use miette::Result;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config.toml (defaults to the one next to the executable)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse one mod directory and list its definitions
    Parse {
        /// The mod directory to parse
        mod_dir: String,

        /// Game key, overriding the configured game
        #[arg(short, long)]
        game: Option<String>,

        /// Print definitions as JSON
        #[arg(long)]
        json: bool,
    },
    /// Detect conflicts across the configured load order
    Conflicts {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Commit every open conflict into the patch mod
    Resolve {
        /// Keep the first candidate of every bucket instead of the priority winner
        #[arg(long)]
        ignore: bool,
    },
    /// Delete the generated patch mod
    Clean,
    /// Show or update configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set the game (stellaris, hoi4, eu4, ck3, vic3)
    SetGame { game: String },
    /// Set the directory holding the installed mods
    SetModsRoot { path: String },
    /// Set the load order as mod directory names, first loaded first
    SetLoadOrder {
        #[arg(required = true)]
        mods: Vec<String>,
    },
    /// Set the collection name the patch mod is named after
    SetCollection { name: String },
    /// Set the patch state mode
    SetMode { mode: String },
    /// Reset the configuration to defaults
    Reset,
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "pdx_patch=debug,pdx_conflict=debug,pdx_script=debug"
    } else {
        "pdx_patch=info,pdx_conflict=info,pdx_script=warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = parse_args();
    init_logging(args.verbose);

    let config_path = utils::config::config_path(args.config.as_deref())?;

    match args.command {
        Commands::Config { command } => {
            use commands::config::*;
            match command {
                ConfigCommands::Show => show_config(&config_path),
                ConfigCommands::SetGame { game } => set_game(&config_path, game),
                ConfigCommands::SetModsRoot { path } => set_mods_root(&config_path, path),
                ConfigCommands::SetLoadOrder { mods } => set_load_order(&config_path, mods),
                ConfigCommands::SetCollection { name } => set_collection(&config_path, name),
                ConfigCommands::SetMode { mode } => set_mode(&config_path, mode),
                ConfigCommands::Reset => reset_config(&config_path),
            }
        }
        command => {
            let cfg = utils::config::load_config(&config_path)?;
            match command {
                Commands::Parse {
                    mod_dir,
                    game,
                    json,
                } => parse_mod_dir(ParseModArgs { mod_dir, game, json }, &cfg),
                Commands::Conflicts { json } => show_conflicts(ShowConflictsArgs { json }, &cfg),
                Commands::Resolve { ignore } => {
                    resolve_conflicts(ResolveConflictsArgs { ignore }, &cfg)
                }
                Commands::Clean => clean_patch(&cfg),
                Commands::Config { .. } => Ok(()),
            }
        }
    }
}
