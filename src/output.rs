use std::fmt::Display;

use clap::ValueEnum;
use colored::Colorize;

use crate::commands::comments::CommentPlan;
use crate::commands::report::ReportSummary;
use crate::error::Result;
use crate::indexer::SourceStats;
use crate::model::Tracking;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

/// A progress line for humans; JSON mode stays quiet until the final summary.
pub fn progress(format: Format, line: impl Display) {
    match format {
        Format::Json => {}
        Format::Pretty => println!("{}", line.to_string().dimmed()),
        Format::Minimal => println!("{line}"),
    }
}

pub fn print_source_stats(stats: &SourceStats, format: Format) {
    match format {
        Format::Json => {}
        Format::Pretty => {
            let unknowns = if stats.placeholders > 0 {
                format!(" +{} unknown", stats.placeholders).yellow().to_string()
            } else {
                String::new()
            };
            println!(
                "  {:<20} {:>6} rows {:>6} refs{}",
                stats.source.bold(),
                stats.rows,
                stats.references,
                unknowns
            );
        }
        Format::Minimal => println!(
            "{} {} {} {}",
            stats.source, stats.rows, stats.references, stats.placeholders
        ),
    }
}

pub fn print_report(summary: &ReportSummary, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(summary)?),
        Format::Pretty => {
            println!();
            for user in &summary.ranking {
                let login = user.login.as_deref().unwrap_or("-");
                let login = if user.placeholder {
                    login.yellow().to_string()
                } else {
                    login.to_string()
                };
                println!("{:>4} {} {}", user.count, user.id, login);
            }
            println!();
            println!(
                "{} {} users ({} unknown), {} references",
                "report:".bold(),
                summary.users,
                summary.placeholders,
                summary.references
            );
            if !summary.duplicates.is_empty() {
                println!(
                    "  {} {}",
                    "duplicate ids skipped:".yellow(),
                    summary.duplicates.join(", ")
                );
            }
            println!("{}", summary.report);
        }
        Format::Minimal => {
            for user in &summary.ranking {
                println!(
                    "{:>4} {} {}",
                    user.count,
                    user.id,
                    user.login.as_deref().unwrap_or("-")
                );
            }
            println!("{}", summary.report);
        }
    }
    Ok(())
}

pub fn print_tracking(tracking: &Tracking, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let columns: Vec<String> = tracking.columns().iter().map(ToString::to_string).collect();
            println!(
                "{}",
                serde_json::json!({
                    "sources": tracking.sources,
                    "columns": columns,
                })
            );
        }
        Format::Pretty => {
            for source in &tracking.sources {
                println!("{} {}", source.file_name().bold(), source.fields.join(", "));
            }
        }
        Format::Minimal => {
            for column in tracking.columns() {
                println!("{column}");
            }
        }
    }
    Ok(())
}

pub fn print_comment_plan(plan: &CommentPlan, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(plan)?),
        Format::Pretty => {
            println!(
                "{} {} of {} comments link to a Jira issue",
                "comments:".bold(),
                plan.linked,
                plan.comments
            );
            println!("{} valid tickets", plan.valid_tickets.len().to_string().green());
            println!("{} invalid tickets", plan.invalid_tickets.len().to_string().red());
            if !plan.invalid_tickets.is_empty() {
                println!("  missing: {}", plan.invalid_tickets.join(", "));
            }
            println!("{}", plan.plan);
        }
        Format::Minimal => {
            println!("{} valid tickets", plan.valid_tickets.len());
            println!("{} invalid tickets", plan.invalid_tickets.len());
        }
    }
    Ok(())
}
