use crate::utils::config::{self, AppConfig};
use camino::Utf8PathBuf;
use colored::Colorize;
use miette::Result;

fn update_config(path: &Utf8PathBuf, update: impl FnOnce(&mut AppConfig)) -> Result<AppConfig> {
    let mut cfg = config::load_config(path)?;
    update(&mut cfg);
    config::save_config(path, &cfg)?;
    Ok(cfg)
}

/// Print a config path entry with status indicator
fn print_path_config(name: &str, path: Option<&Utf8PathBuf>) {
    match path {
        Some(p) => {
            let status = if p.as_std_path().is_dir() {
                "✓".bright_green()
            } else {
                "✗".bright_red()
            };
            println!("  {} {} {}", format!("{}:", name).bright_white(), p, status);
        }
        None => {
            println!(
                "  {} {}",
                format!("{}:", name).bright_white(),
                "(not set)".bright_yellow()
            );
        }
    }
}

pub fn show_config(path: &Utf8PathBuf) -> Result<()> {
    let cfg = config::load_config(path)?;

    println!();
    println!("  {} {}", "config_file:".bright_white(), path);
    let game = match cfg.game.as_deref() {
        Some(key) => match config::lookup_game(key) {
            Ok(game) => format!("{} ({})", key, game.name).normal(),
            Err(_) => format!("{key} (unknown)").bright_red(),
        },
        None => "(not set)".bright_yellow(),
    };
    println!("  {} {}", "game:".bright_white(), game);
    print_path_config("mods_root", cfg.mods_root.as_ref());
    print_path_config("patch_root", cfg.patch_root.as_ref());
    println!("  {} {}", "collection:".bright_white(), cfg.collection());
    println!("  {} {}", "mode:".bright_white(), cfg.mode);
    println!("  {}", "load_order:".bright_white());
    for (index, name) in cfg.load_order.iter().enumerate() {
        println!("    {} {}", format!("{}.", index + 1).dimmed(), name);
    }
    if !cfg.ignored_paths.trim().is_empty() {
        println!("  {}", "ignored_paths:".bright_white());
        for line in cfg.ignored_paths.lines() {
            println!("    {}", line.dimmed());
        }
    }
    println!();
    Ok(())
}

pub fn set_game(path: &Utf8PathBuf, game: String) -> Result<()> {
    let game_type = config::lookup_game(&game)?;
    if !game_type.supports_conflict_solver() {
        eprintln!(
            "  {}",
            format!("{} does not support conflict solving; only detection will work.", game_type.name)
                .bright_yellow()
        );
    }
    update_config(path, |cfg| cfg.game = Some(game_type.key.to_string()))?;
    println!(
        "{} {}",
        "✓ Game set to".bright_green().bold(),
        game_type.name.bright_cyan()
    );
    Ok(())
}

pub fn set_mods_root(path: &Utf8PathBuf, mods_root: String) -> Result<()> {
    let mods_root = Utf8PathBuf::from(mods_root);
    if !mods_root.as_std_path().is_dir() {
        return Err(miette::miette!("Mods root is not a directory: {}", mods_root));
    }
    update_config(path, |cfg| cfg.mods_root = Some(mods_root.clone()))?;
    println!(
        "{} {}",
        "✓ Mods root set to".bright_green().bold(),
        mods_root.as_str().bright_cyan()
    );
    Ok(())
}

pub fn set_load_order(path: &Utf8PathBuf, mods: Vec<String>) -> Result<()> {
    let count = mods.len();
    update_config(path, |cfg| cfg.load_order = mods)?;
    println!(
        "{} {}",
        "✓ Load order updated:".bright_green().bold(),
        format!("{count} mods").bright_cyan()
    );
    Ok(())
}

pub fn set_collection(path: &Utf8PathBuf, collection: String) -> Result<()> {
    update_config(path, |cfg| cfg.collection = Some(collection.clone()))?;
    println!(
        "{} {}",
        "✓ Collection set to".bright_green().bold(),
        collection.bright_cyan()
    );
    Ok(())
}

pub fn set_mode(path: &Utf8PathBuf, mode: String) -> Result<()> {
    let mode = config::parse_mode(&mode)?;
    update_config(path, |cfg| cfg.mode = mode)?;
    println!(
        "{} {}",
        "✓ Patch mode set to".bright_green().bold(),
        mode.to_string().bright_cyan()
    );
    Ok(())
}

pub fn reset_config(path: &Utf8PathBuf) -> Result<()> {
    config::save_config(path, &AppConfig::default())?;
    println!(
        "{}",
        "✓ Configuration reset to defaults".bright_green().bold()
    );
    println!();
    println!("  {} {}", "Config file:".bright_white().bold(), path);
    Ok(())
}
