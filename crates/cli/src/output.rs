//! Terminal and JSON output for build runs and manifest plans.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use giftwrap_lib::pipeline::{ProjectOutcome, RunReport};
use giftwrap_lib::spec::Project;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

const OK: &str = "✓";
const FAILED: &str = "✗";
const ITEM: &str = "•";

/// Builds run from seconds to hours; show the two largest units.
pub fn format_elapsed(elapsed: Duration) -> String {
  let secs = elapsed.as_secs();
  match secs {
    0 => format!("{:.2}s", elapsed.as_secs_f64()),
    1..60 => format!("{}s", secs),
    60..3600 => format!("{}m {:02}s", secs / 60, secs % 60),
    _ => format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60),
  }
}

/// One summary line per built project.
fn outcome_line(outcome: &ProjectOutcome) -> String {
  match &outcome.artifact {
    Some(artifact) => format!("{} → {}", outcome.project, artifact),
    None => format!("{} → installed (all-in-one, no artifact)", outcome.project),
  }
}

pub fn print_report(report: &RunReport, elapsed: Duration) {
  println!();
  println!(
    "{} Built {} project(s) in {}",
    OK.if_supports_color(Stream::Stdout, |s| s.green()),
    report.projects.len(),
    format_elapsed(elapsed)
  );
  for outcome in &report.projects {
    println!("  {}", outcome_line(outcome));
  }
}

pub fn print_failure(elapsed: Duration) {
  let message = format!("Build failed after {}", format_elapsed(elapsed));
  eprintln!(
    "{} {}",
    FAILED.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_plan_header(count: usize, all_in_one: bool) {
  println!(
    "{} Manifest valid: {} project(s)",
    OK.if_supports_color(Stream::Stdout, |s| s.green()),
    count
  );
  if all_in_one {
    println!("  all_in_one is set; per-project artifacts will be skipped");
  }
}

pub fn print_project(project: &Project, verbose: bool) {
  println!();
  println!(
    "{} {} {}",
    ITEM.if_supports_color(Stream::Stdout, |s| s.blue()),
    project.name,
    project.version
  );

  let mut fields = vec![
    ("Source", format!("{} @ {}", project.giturl, project.gitref)),
    ("Install path", project.install_path.display().to_string()),
    ("Package", project.package_name.clone()),
  ];
  if verbose {
    fields.extend([
      ("Gerrit project", project.gerrit_project.clone()),
      ("Virtualenv", project.venv_command.clone()),
      ("Dependencies", project.install_command.clone()),
      ("Install", project.project_install_command.clone()),
    ]);
  }

  for (label, value) in fields {
    println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
