mod factory;
mod target;

use anyhow::Context;
use clap::{Parser, Subcommand};
use factory::DefaultBackendFactory;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use trailmark_engine::cli::{self, ConsoleOptions, OutputHandlers, HELP_TEXT};
use trailmark_engine::config::loader::ConfigLoader;
use trailmark_engine::config::schema::TrailmarkConfig;
use trailmark_engine::generator::{Flavor, ScriptGenerator, generate_steps};
use trailmark_engine::registry::SessionRegistry;
use trailmark_engine::session::{SessionId, StartRequest};
use trailmark_engine::store::ActionLogStore;

#[derive(Parser)]
#[command(name = "trailmark", version, about = "Record browser sessions and turn them into test scripts")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to ./trailmark.yaml, then ~/.trailmark/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding one sub-directory per recording
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Open a browser at URL and record interactions until stopped
    Record {
        url: String,
        /// chromium, firefox or webkit
        #[arg(long)]
        engine: Option<String>,
        #[arg(long)]
        headless: bool,
    },
    /// Generate a test script from a stopped recording
    Generate {
        #[arg(long)]
        session: String,
        /// script (alias generic), playwright or pytest
        #[arg(long, default_value = "script")]
        flavor: String,
        #[arg(long, default_value = "recorded flow")]
        name: String,
    },
    /// Print the normalized steps of a stopped recording
    Steps {
        #[arg(long)]
        session: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries JSON results.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    let store = ActionLogStore::new(
        args.output_dir
            .clone()
            .unwrap_or_else(|| config.recording.output_dir.clone()),
    );

    match args.command {
        Command::Record {
            url,
            engine,
            headless,
        } => record(config, store, &url, engine, headless).await,
        Command::Generate {
            session,
            flavor,
            name,
        } => {
            let flavor: Flavor = flavor.parse()?;
            let generator = ScriptGenerator::new(config.generator);
            let outcome = generator
                .generate_for_session(&store, &SessionId::from(session), flavor, &name)
                .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Command::Steps { session } => {
            let actions = store.load(&SessionId::from(session)).await?;
            println!("{}", serde_json::to_string_pretty(&generate_steps(&actions))?);
            Ok(())
        }
    }
}

async fn record(
    config: TrailmarkConfig,
    store: ActionLogStore,
    url: &str,
    engine: Option<String>,
    headless: bool,
) -> anyhow::Result<()> {
    let request = StartRequest::new(target::normalize_url(url)?)
        .engine(engine.unwrap_or_else(|| config.recording.engine.to_string()))
        .headless(headless || config.recording.headless);

    let registry = SessionRegistry::new(store);
    let factory = DefaultBackendFactory::new(config);
    let recorder = registry.start(request, &factory).await?;
    let id = recorder.id().clone();

    let output = OutputHandlers {
        out: |msg| eprintln!("{}", msg),
        err: |msg| eprintln!("{}", msg),
    };
    let banner = format!("Recording {}. Interact with the browser, then type 'stop'.", id);
    let options = ConsoleOptions {
        banner_lines: &[banner.as_str(), HELP_TEXT],
        prompt: "",
        exit_commands: &["stop", "exit", "quit"],
        handle_ctrl_c: true,
        ctrl_c_message: Some("Interrupted, stopping recording..."),
    };
    let console_result = cli::run_console(&recorder, output, options).await;
    drop(recorder);

    let summary = registry.stop(&id).await?;
    registry.forget(&id).await;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    console_result.map_err(|e| anyhow::anyhow!("Console error: {}", e))
}
