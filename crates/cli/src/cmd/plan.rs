//! Implementation of the `giftwrap plan` command.
//!
//! Loads and validates a manifest, then prints each project with every
//! default filled in. Nothing is fetched or built.

use std::path::Path;

use anyhow::{Context, Result};

use giftwrap_lib::spec::BuildSpec;

use crate::output::{OutputFormat, print_json, print_plan_header, print_project};

pub fn cmd_plan(manifest: &Path, verbose: bool, output: OutputFormat) -> Result<()> {
  let spec =
    BuildSpec::load(manifest).with_context(|| format!("Failed to load manifest: {}", manifest.display()))?;

  if output.is_json() {
    return print_json(&spec);
  }

  print_plan_header(spec.projects.len(), spec.settings.all_in_one);
  for project in &spec.projects {
    print_project(project, verbose);
  }

  Ok(())
}
