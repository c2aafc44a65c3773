mod changelog;
mod commands;
mod core;
mod graph;
mod host;
mod package;
mod pipeline;
mod registry;
mod ui;

use crate::core::error::print_error;
use clap::{Parser, Subcommand};

/// Release npm packages from a monorepo, dependencies first
#[derive(Parser)]
#[command(name = "release-train")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Release every package with release-worthy changes
  Run {
    /// Publish prereleases: no tags, commits or GitHub releases
    #[arg(long)]
    prerelease: bool,
    /// Show the plan without releasing anything
    #[arg(long)]
    dry_run: bool,
  },
  /// Show which packages would be released and with what versions
  Plan {
    /// Output plan in JSON format (useful for CI/automation)
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();

  let result = match cli.command {
    Commands::Run { prerelease, dry_run } => commands::run_release(prerelease, dry_run),
    Commands::Plan { json } => commands::run_plan(json),
  };

  if let Err(err) = result {
    print_error(&err);
    std::process::exit(err.exit_code().as_i32());
  }
}
