//! Implementation of the `giftwrap build` command.
//!
//! Loads a manifest, applies command-line overrides, and builds every project
//! in order. The run stops at the first failing project. Ctrl-C asks running
//! clones to stop and gives the build a grace period to release its workspace.

use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use tracing::warn;

use giftwrap_lib::container::DockerDaemon;
use giftwrap_lib::execute::ShellExecutor;
use giftwrap_lib::fetch::{GitFetcher, request_interrupt};
use giftwrap_lib::package::FpmEmitter;
use giftwrap_lib::pipeline::{Pipeline, RunReport, TracingObserver};
use giftwrap_lib::review::GerritResolver;
use giftwrap_lib::spec::{BuildSpec, Settings};

use crate::BuildType;
use crate::output::{print_failure, print_report};

/// How long an interrupted build may take to unwind.
const INTERRUPT_GRACE: Duration = Duration::from_secs(10);

/// Flags that override manifest settings for one run.
#[derive(Debug, Clone, Default)]
pub struct BuildArgs {
  pub build_type: BuildType,
  pub all_in_one: bool,
  pub build_timeout: Option<Duration>,
  pub command_timeout: Option<Duration>,
}

pub fn cmd_build(manifest: &Path, args: BuildArgs) -> Result<()> {
  let start = Instant::now();

  let mut spec =
    BuildSpec::load(manifest).with_context(|| format!("Failed to load manifest: {}", manifest.display()))?;
  apply_overrides(&mut spec.settings, &args);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let result = rt.block_on(interruptible(
    run(&spec, args.build_type),
    tokio::signal::ctrl_c(),
    INTERRUPT_GRACE,
    request_interrupt,
  ));
  // Blocking clones that ignored the interrupt must not hold the process open.
  rt.shutdown_timeout(Duration::from_secs(5));

  match result {
    Ok(report) => {
      print_report(&report, start.elapsed());
      Ok(())
    }
    Err(e) => {
      print_failure(start.elapsed());
      Err(e)
    }
  }
}

fn apply_overrides(settings: &mut Settings, args: &BuildArgs) {
  if args.all_in_one {
    settings.all_in_one = true;
  }
  if let Some(timeout) = args.build_timeout {
    settings.build_timeout_secs = Some(whole_seconds(timeout));
  }
  if let Some(timeout) = args.command_timeout {
    settings.command_timeout_secs = Some(whole_seconds(timeout));
  }
}

/// Settings hold whole seconds; sub-second flags round up to one.
fn whole_seconds(duration: Duration) -> u64 {
  duration.as_secs().max(1)
}

async fn run(spec: &BuildSpec, build_type: BuildType) -> Result<RunReport> {
  let settings = &spec.settings;
  let fetcher = GitFetcher::new();
  let resolver = GerritResolver::new(&settings.gerrit_url).enabled(settings.gerrit_dependencies);
  let observer = TracingObserver;
  let pipeline = Pipeline::new(&fetcher, &resolver, &observer);

  let report = match build_type {
    BuildType::Package => {
      let executor = ShellExecutor::new()
        .with_env(settings.environment.clone())
        .with_timeout(settings.command_timeout());
      let emitter = FpmEmitter::new(&executor, &settings.output_dir)
        .package_type(&settings.package_type)
        .overwrite(settings.force_overwrite);
      pipeline.run_native(spec, &executor, &emitter).await?
    }
    BuildType::Docker => {
      let daemon = DockerDaemon::new(&settings.docker_socket, settings.connect_timeout());
      pipeline.run_container(spec, &daemon).await?
    }
  };

  Ok(report)
}

/// Drive `build` until it finishes or `signal` fires. On a signal,
/// `on_interrupt` runs and the build gets `grace` to unwind before the run is
/// reported as interrupted.
async fn interruptible<T, B, S>(build: B, signal: S, grace: Duration, on_interrupt: impl FnOnce()) -> Result<T>
where
  B: Future<Output = Result<T>>,
  S: Future,
{
  tokio::pin!(build);

  tokio::select! {
    result = &mut build => return result,
    _ = signal => {}
  }

  warn!("interrupt received, stopping build");
  on_interrupt();
  if tokio::time::timeout(grace, &mut build).await.is_err() {
    warn!(grace = ?grace, "build did not stop in time, abandoning it");
  }
  bail!("Build interrupted")
}
