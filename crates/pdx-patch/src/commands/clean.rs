use crate::errors::CliError;
use crate::utils::config::AppConfig;
use colored::Colorize;
use pdx_conflict::PatchWriter;

pub fn clean_patch(cfg: &AppConfig) -> miette::Result<()> {
    let game = cfg.game_type()?;
    let writer = PatchWriter::new(cfg.patch_root()?, cfg.collection(), &game);
    writer.clean().map_err(CliError::from)?;

    println!(
        "{}",
        "✓ Patch mod removed".bright_green().bold()
    );
    println!();
    println!(
        "  {} {}",
        "Path:".bright_white().bold(),
        writer.patch_dir().as_str().bright_green()
    );
    Ok(())
}
