use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::AppConfig;
use crate::utils::{open_session, print_ansi_boxed_lines};
use colored::Colorize;
use miette::IntoDiagnostic;
use pdx_conflict::{ConflictSummary, PriorityType};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct ShowConflictsArgs {
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConflictReport {
    summary: ConflictSummary,
    conflicts: Vec<BucketReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BucketReport {
    #[serde(rename = "type")]
    type_name: String,
    id: String,
    mods: Vec<String>,
    winner: Option<String>,
    winner_file: String,
    priority: PriorityType,
}

pub fn show_conflicts(args: ShowConflictsArgs, cfg: &AppConfig) -> miette::Result<()> {
    let session = open_session(cfg)?;
    let summary = session.summary().map_err(CliError::from)?;
    let hierarchy = session
        .with_result(|result| result.conflicts.get_hierarchical_definitions())
        .map_err(CliError::from)?;

    let mut buckets = Vec::new();
    for parent in &hierarchy {
        for child in &parent.children {
            let candidates = session
                .candidates(&parent.name, &child.id)
                .map_err(CliError::from)?;
            let priority = session.eval_definition_priority(&candidates);
            buckets.push(BucketReport {
                type_name: parent.name.clone(),
                id: child.id.clone(),
                mods: child.mods.clone(),
                winner: priority.definition.as_ref().map(|d| d.mod_name.clone()),
                winner_file: priority.file_name.clone(),
                priority: priority.priority_type,
            });
        }
    }

    if args.json {
        let report = ConflictReport {
            summary,
            conflicts: buckets,
        };
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        return Ok(());
    }

    let mut current_type = "";
    for bucket in &buckets {
        if bucket.type_name != current_type {
            current_type = &bucket.type_name;
            println_pad!("\n{}", current_type.bright_magenta().bold());
        }
        let winner = match &bucket.winner {
            Some(winner) => format!("{} ({})", winner, bucket.priority.label()),
            None => bucket.priority.label().to_string(),
        };
        println_pad!(
            "   {} {} {} {}",
            "•".bright_cyan(),
            bucket.id.bright_white().bold(),
            bucket.mods.join(", ").dimmed(),
            format!("→ {winner}").bright_green()
        );
    }

    println!();
    print_ansi_boxed_lines(&[
        format!("{} {}", "Conflicts:".bright_white().bold(), summary.conflicts),
        format!("{} {}", "Overwritten:".bright_white(), summary.overwritten),
        format!("{} {}", "Resolved:".bright_green(), summary.resolved),
        format!("{} {}", "Ignored:".bright_yellow(), summary.ignored),
        format!("{} {}", "Rule ignored:".bright_yellow(), summary.rule_ignored),
        format!("{} {}", "Custom:".bright_cyan(), summary.custom),
        format!("{} {}", "Orphans:".bright_red(), summary.orphans),
        format!("{} {}", "Invalid:".bright_red(), summary.invalid),
    ]);
    Ok(())
}
