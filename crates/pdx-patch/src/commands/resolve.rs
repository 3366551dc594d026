use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::AppConfig;
use crate::utils::{open_session, print_ansi_boxed_lines};
use colored::Colorize;

#[derive(Debug, Clone)]
pub struct ResolveConflictsArgs {
    pub ignore: bool,
}

/// Commit every open conflict. A failing bucket is reported and skipped.
pub fn resolve_conflicts(args: ResolveConflictsArgs, cfg: &AppConfig) -> miette::Result<()> {
    let session = open_session(cfg)?;
    let keys = session.conflict_keys().map_err(CliError::from)?;

    let (mut committed, mut skipped, mut failed) = (0usize, 0usize, 0usize);
    for (type_name, id) in keys {
        let candidates = session
            .candidates(&type_name, &id)
            .map_err(CliError::from)?;
        let outcome = if args.ignore {
            match candidates.first() {
                Some(first) => session.ignore_mod_patch(first),
                None => Ok(false),
            }
        } else {
            let priority = session.eval_definition_priority(&candidates);
            match priority.definition {
                Some(winner) => session.apply_mod_patch(&winner),
                None => {
                    tracing::warn!(
                        "No provider for {}-{} ({})",
                        type_name,
                        id,
                        priority.priority_type.label()
                    );
                    Ok(false)
                }
            }
        };

        match outcome {
            Ok(true) => committed += 1,
            Ok(false) => skipped += 1,
            Err(e) => {
                failed += 1;
                println_pad!(
                    "{} {}-{}: {}",
                    "✗".bright_red(),
                    type_name,
                    id,
                    e.to_string().bright_red()
                );
            }
        }
    }

    let action = if args.ignore { "Ignored:" } else { "Resolved:" };
    println!();
    print_ansi_boxed_lines(&[
        format!("{} {}", action.bright_green().bold(), committed),
        format!("{} {}", "Skipped:".bright_yellow(), skipped),
        format!("{} {}", "Failed:".bright_red(), failed),
        format!(
            "{} {}",
            "Patch:".bright_white(),
            session.writer().patch_dir().as_str().bright_cyan()
        ),
    ]);
    Ok(())
}
