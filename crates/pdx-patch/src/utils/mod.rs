use crate::errors::CliError;
use crate::utils::config::AppConfig;
use pdx_conflict::{parse_mods, ConflictSession, FsModSource, ModOrder, ModSource, PatchWriter};
use pdx_script::ParserRegistry;
use regex::Regex;

pub mod config;

#[macro_export]
macro_rules! println_pad {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        for __line in __s.lines() {
            println!("    {}", __line);
        }
    }};
}

/// Parse the configured load order and open a conflict session on it, with
/// previously committed decisions restored.
pub fn open_session(cfg: &AppConfig) -> Result<ConflictSession, CliError> {
    let game = cfg.game_type()?;
    let sources: Vec<Box<dyn ModSource>> = cfg
        .mod_dirs()?
        .into_iter()
        .map(|dir| Box::new(FsModSource::new(dir)) as Box<dyn ModSource>)
        .collect();
    let registry = ParserRegistry::for_game(&game);
    let (parsed, definitions) = parse_mods(sources, &registry)?;
    let order = ModOrder::new(parsed.iter().map(|m| m.name.clone()));

    let writer = PatchWriter::new(cfg.patch_root()?, cfg.collection(), &game);
    let session = ConflictSession::detect(
        game,
        order,
        &definitions,
        cfg.mode,
        &cfg.ignored_paths,
        writer,
    );
    session.initialize_patch_state()?;
    Ok(session)
}

/// Prints the provided lines inside an ASCII box
pub fn print_ansi_boxed_lines(lines: &[String]) {
    let Ok(ansi) = Regex::new("\x1b\\[[0-9;]*m") else {
        return;
    };
    let visible_len = |s: &str| ansi.replace_all(s, "").chars().count();

    let width = lines
        .iter()
        .map(|s| visible_len(s.as_str()))
        .max()
        .unwrap_or(0);

    let border = "-".repeat(width + 4);
    println_pad!("{}", border);
    for line in lines {
        let pad = width - visible_len(line.as_str());
        println_pad!("| {}{} |", line, " ".repeat(pad));
    }
    println_pad!("{}", border);
}
