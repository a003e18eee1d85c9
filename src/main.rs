mod cli;

use reelforge::{build_registry, config, server};
use reelforge_workflow::TaskContext;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelforge=trace,reelforge_workflow=trace,tower_http=debug".to_string()
        } else {
            "reelforge=info,reelforge_workflow=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => start(host, port, cli.config.as_deref()),
        Commands::Run {
            persona,
            deterministic,
            json,
        } => run_persona(&persona, cli.config.as_deref(), deterministic, json),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("reelforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn start(host: Option<String>, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting Reelforge server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    // Blocking HTTP clients must be built and dropped outside the runtime
    let registry = build_registry(&config)?;

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(server::start_server(config, registry.clone()));
    drop(rt);

    tracing::info!("Processed {} tasks", registry.len());
    result
}

fn run_persona(
    persona: &str,
    config_path: Option<&Path>,
    deterministic: bool,
    json: bool,
) -> Result<()> {
    let persona = persona.trim();
    if persona.is_empty() {
        anyhow::bail!("Persona cannot be empty");
    }

    let mut config = config::load_config_or_default(config_path)?;
    if deterministic {
        config.agents.mode = config::AgentMode::Deterministic;
    }

    let registry = build_registry(&config)?;
    let task = registry.register(persona);
    let result = registry.execute(&task);
    let snapshot = task.read().clone();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot.to_view()?)?);
    } else {
        print_summary(&snapshot);
    }

    result?;
    Ok(())
}

fn print_summary(task: &TaskContext) {
    println!("Task: {}", task.task_id);
    println!("Persona: {}", task.persona);
    println!("State: {}", task.state);
    if let Some(ref error) = task.error {
        println!("Error: {}", error);
    }

    println!("\nScript sections: {}", task.script.len());
    for section in &task.script {
        println!("  [{}] {}", section.section, section.timeframe);
    }
    println!("Storyboard shots: {}", task.storyboard.len());
    println!("Visual assets: {}", task.assets.len());
    println!("Camera instructions: {}", task.camera_plan.len());
    println!("Timeline entries: {}", task.timeline.len());

    if let Some(ref assets) = task.final_assets {
        println!();
        if let Some(ref video) = assets.video_uri {
            println!("Video: {}", video);
        }
        if let Some(ref audio) = assets.audio_uri {
            println!("Audio: {}", audio);
        }
        if let Some(ref subtitles) = assets.subtitles_uri {
            println!("Subtitles: {}", subtitles);
        }
    }

    if let Some(elapsed) = task.elapsed() {
        println!("\nElapsed: {} ms", elapsed.num_milliseconds());
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, resolving defaults");
            config::load_config_or_default(None)?
        }
    };

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Agent mode: {}", config.agents.mode);
    println!("  Text provider: {}", config.text_generation.provider);
    println!("  Image provider: {}", config.image_generation.provider);
    println!("  OpenAI configured: {}", config.openai.is_some());
    println!("  DeepSeek configured: {}", config.deepseek.is_some());
    println!("  Doubao configured: {}", config.doubao.is_some());
    println!("  Xunfei TTS configured: {}", config.xunfei_tts.is_some());
    println!("  DashScope music configured: {}", config.dashscope_music.is_some());
    println!("  DashScope ambience configured: {}", config.dashscope_ambience.is_some());
    println!("  Output dir: {}", config.storage.output_dir.display());

    Ok(())
}
