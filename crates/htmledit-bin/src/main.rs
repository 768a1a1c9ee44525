//! htmledit entrypoint: drives one editor controller against the in-memory surface.
use anyhow::{Result, bail};
use clap::Parser;
use core_bridge::MemorySurface;
use core_config::load_from;
use core_controller::EditorController;
use core_events::{EVENT_CHANNEL_CAP, EditorEvent, PasteEventArgs};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "htmledit", version, about = "Html editor controller demo")]
struct Args {
    /// Initial bound document value (html).
    pub html: Option<String>,
    /// Optional configuration file path (overrides discovery of `htmledit.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Command to execute, `name` or `name=value`. Repeatable, runs in order.
    #[arg(long = "exec")]
    pub exec: Vec<String>,
    /// Start with the editor hidden (no surface is created).
    #[arg(long)]
    pub hidden: bool,
    /// Simulate a clipboard paste of this html after the commands.
    #[arg(long)]
    pub paste: Option<String>,
    /// Intercept pastes and uppercase them.
    #[arg(long = "upper-paste")]
    pub upper_paste: bool,
}

/// Split `name=value` into its parts. A bare name carries no value.
fn parse_exec(raw: &str) -> Result<(&str, Option<&str>)> {
    let (name, value) = match raw.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value)),
        None => (raw.trim(), None),
    };
    if name.is_empty() {
        bail!("empty command name in `{raw}`");
    }
    Ok((name, value))
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let file_appender = tracing_appender::rolling::never(log_dir, "htmledit.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(_) => Some(guard),
        // Global subscriber already installed; dropping the guard shuts the writer down.
        Err(_err) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

async fn run(args: Args) -> Result<serde_json::Value> {
    let config = load_from(args.config.clone())?;
    let mut params = config.params(args.html.clone().unwrap_or_default());
    if args.hidden {
        params.visible = false;
    }

    let surface = MemorySurface::new();
    let (tx, mut rx) = mpsc::channel::<EditorEvent>(EVENT_CHANNEL_CAP);
    let mut ctl = EditorController::new(surface.clone(), params, tx);
    if args.upper_paste {
        ctl = ctl.with_paste_handler(|paste: &mut PasteEventArgs| {
            paste.html = paste.html.to_uppercase();
        });
    }

    ctl.after_render(true).await?;
    if ctl.params().visible {
        ctl.on_focus().await?;
    }

    for raw in &args.exec {
        let (name, value) = parse_exec(raw)?;
        info!(target: "runtime", name, "exec");
        ctl.execute_command(name, value).await?;
    }

    if let Some(html) = args.paste.clone() {
        let paster = surface.clone();
        let paste = tokio::spawn(async move { paster.paste(html).await });
        if ctl.paste_intercept_requested() {
            ctl.process_next_notification().await?;
        }
        paste.await??;
        ctl.pump_notifications().await?;
    }

    ctl.on_blur().await?;
    ctl.dispose().await?;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event.kind());
    }

    Ok(serde_json::json!({
        "html": ctl.html(),
        "class": ctl.css_class(),
        "state": ctl.command_state(),
        "events": events,
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();
    info!(target: "runtime", "startup");

    let args = Args::parse();
    let report = run(args).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    info!(target: "runtime", "shutdown");
    Ok(())
}
