mod commands;
mod core;
mod mapping;
mod release;
mod select;

use clap::Parser;
use crate::core::config::{CliSettings, MapOptions};
use crate::core::error::{RailError, RailResult, print_error};
use crate::mapping::MapFileRewriter;
use crate::release::FileStore;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Map release deprecated or removed Kubernetes APIs in-place
#[derive(Parser)]
#[command(name = "kube-remap")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Simulate a command
  #[arg(long)]
  dry_run: bool,

  /// Path to the kubeconfig file. Only logged: mapping reads release records, never the cluster; use --kube-version to gate mappings
  #[arg(long)]
  kubeconfig: Option<PathBuf>,

  /// Name of the kubeconfig context. Only logged, like --kubeconfig
  #[arg(long)]
  kube_context: Option<String>,

  /// Kubernetes version of the target cluster (e.g. v1.25); APIs not yet deprecated on it are left alone
  #[arg(long)]
  kube_version: Option<String>,

  /// Path to the API mapping file
  #[arg(long = "mapfile")]
  map_file: Option<PathBuf>,

  /// Directory holding the release records
  #[arg(long)]
  storage_dir: Option<PathBuf>,

  /// Path to a kube-remap.toml config file
  #[arg(long)]
  config: Option<PathBuf>,

  /// Map kube api of all releases across all namespaces
  #[arg(short = 'A', long)]
  all_namespaces: bool,

  /// Multiple releases, for example: --releases-namespaces Release1.NS1 Release2.NS2
  #[arg(long = "releases-namespaces", value_delimiter = ',', num_args = 1..)]
  releases: Vec<String>,

  /// Multiple namespaces, for example: --namespaces NS1 NS2
  #[arg(long, value_delimiter = ',', num_args = 1..)]
  namespaces: Vec<String>,

  /// Except multiple namespaces, for example: --except-namespaces NS1 NS2
  #[arg(long, value_delimiter = ',', num_args = 1..)]
  except_namespaces: Vec<String>,

  /// Except multiple releases namespaces, for example: --except-releases-namespaces Release1.NS1 Release2.NS2
  #[arg(long = "except-releases-namespaces", value_delimiter = ',', num_args = 1..)]
  except_releases: Vec<String>,

  /// Output the run report in JSON format
  #[arg(long)]
  json: bool,

  /// Log level (trace, debug, info, warn, error)
  #[arg(long, default_value = "info")]
  log_level: String,
}

impl Cli {
  fn settings(&self) -> CliSettings {
    CliSettings {
      dry_run: self.dry_run,
      config: self.config.clone(),
      kubeconfig: self.kubeconfig.clone(),
      kube_context: self.kube_context.clone(),
      kube_version: self.kube_version.clone(),
      map_file: self.map_file.clone(),
      storage_dir: self.storage_dir.clone(),
      all_namespaces: self.all_namespaces,
      namespaces: self.namespaces.clone(),
      releases: self.releases.clone(),
      except_namespaces: self.except_namespaces.clone(),
      except_releases: self.except_releases.clone(),
    }
  }
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

fn init_logging(level: &str) {
  let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr),
    )
    .init();
}

fn run(cli: &Cli) -> RailResult<()> {
  let options = MapOptions::resolve(cli.settings())?;
  let mut store = FileStore::new(&options.storage_dir);
  info!(
    storage = %store.root().display(),
    mapfile = %options.map_file.display(),
    kubeconfig = %options
      .cluster
      .kubeconfig
      .as_deref()
      .map(|p| p.display().to_string())
      .unwrap_or_else(|| "default".to_string()),
    context = options.cluster.context.as_deref().unwrap_or("default"),
    "Loaded settings"
  );

  let report = commands::run_map(&options, &mut store, &MapFileRewriter)?;

  if cli.json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    commands::print_report(&report);
  }

  Ok(())
}

fn main() {
  let cli = Cli::parse();
  init_logging(&cli.log_level);

  if let Err(err) = run(&cli) {
    handle_error(err);
  }
}

fn handle_error(err: RailError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
