use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::{self, AppConfig};
use camino::Utf8PathBuf;
use colored::Colorize;
use miette::IntoDiagnostic;
use pdx_conflict::{parse_mod, FsModSource};
use pdx_script::{ParserRegistry, ValueType};

#[derive(Debug, Clone)]
pub struct ParseModArgs {
    pub mod_dir: String,
    pub game: Option<String>,
    pub json: bool,
}

pub fn parse_mod_dir(args: ParseModArgs, cfg: &AppConfig) -> miette::Result<()> {
    let game = match args.game.as_deref() {
        Some(key) => config::lookup_game(key)?,
        None => cfg.game_type()?,
    };
    let mod_dir = Utf8PathBuf::from(&args.mod_dir);
    let registry = ParserRegistry::for_game(&game);
    let parsed = parse_mod(&mut FsModSource::new(mod_dir), &registry).map_err(CliError::from)?;

    if args.json {
        let json = serde_json::to_string_pretty(&parsed.definitions).into_diagnostic()?;
        println!("{json}");
        return Ok(());
    }

    println_pad!(
        "{} {} {}",
        "📦 Mod:".bright_blue().bold(),
        parsed.name.bright_cyan().bold(),
        format!("({})", game.name).dimmed()
    );
    for definition in &parsed.definitions {
        if definition.value_type == ValueType::Invalid {
            let message = definition
                .error
                .as_ref()
                .map(|e| format!("line {}, column {}: {}", e.line, e.column, e.message))
                .unwrap_or_default();
            println_pad!(
                "   {} {} {}",
                "✗".bright_red(),
                definition.file.as_str().bright_white(),
                message.bright_red()
            );
            continue;
        }
        println_pad!(
            "   {} {} {} {}",
            "•".bright_cyan(),
            definition.type_name.bright_white(),
            definition.id.bright_green(),
            format!("{:?}", definition.value_type).dimmed()
        );
    }
    println_pad!(
        "\n{} {}",
        "Definitions:".bright_white().bold(),
        parsed.definitions.len()
    );
    Ok(())
}
