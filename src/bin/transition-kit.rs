use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use transition_kit::{EngineSettings, MemoryHost, Outcome, TimelineHost, TransitionParams};

#[derive(Parser, Debug)]
#[command(name = "transition-kit", version)]
struct Cli {
    /// Log engine diagnostics to stderr (overridden by `RUST_LOG`).
    #[arg(long, global = true)]
    verbose: bool,

    /// Engine settings JSON; missing fields keep their defaults.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a fade-out transition to the selected layers.
    Exit(EditArgs),
    /// Add a fade-in transition to the selected layers.
    Enter(EditArgs),
    /// Print the controller's transitions and drivers as JSON.
    Transitions(SceneArgs),
    /// Print the plugin version.
    Version,
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Transition parameters JSON, as sent by the panel. Defaults apply when omitted.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Move the time cursor before editing (seconds).
    #[arg(long)]
    time: Option<f64>,

    /// Select these layers (by name) instead of the scene's saved selection.
    #[arg(long = "select")]
    select: Vec<String>,

    /// Where to write the edited scene. The input is left untouched without it.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match &cli.settings {
        Some(path) => EngineSettings::from_json_str(&read_text(path, "settings")?)?,
        None => EngineSettings::default(),
    };

    match cli.cmd {
        Command::Exit(args) => cmd_edit(args, &settings, transition_kit::add_exit_transition),
        Command::Enter(args) => cmd_edit(args, &settings, transition_kit::add_enter_transition),
        Command::Transitions(args) => cmd_transitions(args, &settings),
        Command::Version => {
            println!("{}", transition_kit::plugin_version());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "transition_kit=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_text(path: &Path, what: &str) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {what} '{}'", path.display()))
}

fn read_scene(path: &Path) -> anyhow::Result<MemoryHost> {
    let text = read_text(path, "scene")?;
    MemoryHost::from_json_str(&text).with_context(|| format!("parse scene '{}'", path.display()))
}

fn cmd_edit(
    args: EditArgs,
    settings: &EngineSettings,
    entry: fn(&mut MemoryHost, &TransitionParams, &EngineSettings) -> Outcome,
) -> anyhow::Result<ExitCode> {
    let mut host = read_scene(&args.in_path)?;
    let params = match &args.params {
        Some(path) => TransitionParams::from_json_str(&read_text(path, "params")?)?,
        None => TransitionParams::default(),
    };

    if let Some(time) = args.time {
        host.set_current_time(time)?;
    }
    if !args.select.is_empty() {
        host.deselect_all()?;
        for name in &args.select {
            let id = host
                .layer_by_name(name)
                .map(|l| l.id)
                .with_context(|| format!("no layer named '{name}'"))?;
            host.select(id, true)?;
        }
    }

    let outcome = entry(&mut host, &params, settings);
    println!("{}", outcome.to_result_string());

    if let Some(out) = &args.out {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        fs::write(out, host.to_json_string()?)
            .with_context(|| format!("write scene '{}'", out.display()))?;
        eprintln!("wrote {}", out.display());
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_transitions(args: SceneArgs, settings: &EngineSettings) -> anyhow::Result<ExitCode> {
    let host = read_scene(&args.in_path)?;
    let report = transition_kit::inspect(&host, settings)?;
    let json = serde_json::to_string_pretty(&report).context("serialize report")?;
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}
