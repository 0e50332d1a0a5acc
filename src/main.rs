mod cli;
mod pipeline;
mod render;

use clap::Parser;
use cli::{Cli, Command, PostArgs};
use kloner_core::{AppConfig, CoreError, ErrorExt, ErrorReporter, StreakCounter};
use llm_interface::{build_cues, decode_voiceover, truncate_for_voiceover, GeminiClient, TitleBackend};
use pipeline::{CloneOutcome, ClonePipeline};
use reddit_client::PostFetcher;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "kloner=info,proxy_server=info,reddit_client=info,llm_interface=info";

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();
    if dotenv_loaded {
        tracing::debug!("Loaded environment from .env");
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ErrorReporter::new().report_error(&e);
            eprintln!("error: {}", e.user_friendly_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CoreError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.proxy.port = port;
            }
            tracing::info!("Starting Reddit Post Kloner proxy");
            proxy_server::serve(&config).await
        }
        Command::Fetch(args) => fetch(&config, args).await,
        Command::Clone { post, provider } => {
            if let Some(provider) = provider {
                config.title_provider = provider;
            }
            clone_post(&config, post).await
        }
        Command::Voiceover {
            text,
            file,
            voice,
            output,
        } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(file)) => tokio::fs::read_to_string(&file).await?,
                (None, None) => {
                    return Err(CoreError::InvalidInput {
                        message: "pass the text to speak or --file".to_string(),
                    })
                }
            };
            voiceover(&config, &text, &voice, &output).await
        }
        Command::Streak => {
            let streak = StreakCounter::new(&config.streak_file).current().await;
            println!("🔥 {streak}");
            Ok(())
        }
    }
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

async fn fetch(config: &AppConfig, args: PostArgs) -> Result<(), CoreError> {
    let post = PostFetcher::from_config(config)?.fetch_post(&args.url).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&post)?);
    } else {
        println!("{}", render::post_card(&post, &post.title, now_secs()));
    }
    Ok(())
}

async fn clone_post(config: &AppConfig, args: PostArgs) -> Result<(), CoreError> {
    let pipeline = ClonePipeline::new(
        PostFetcher::from_config(config)?,
        TitleBackend::from_config(config)?,
        StreakCounter::new(&config.streak_file),
    );

    match pipeline.run(&args.url).await? {
        CloneOutcome::Applied { cloned, streak } => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&cloned)?);
            } else {
                let now = now_secs();
                println!("── Original ──\n{}", render::post_card(&cloned.post, &cloned.post.title, now));
                println!("\n── Kloned ──\n{}", render::post_card(&cloned.post, &cloned.ai_title, now));
                println!("\n🔥 Streak: {streak}");
            }
        }
        CloneOutcome::Superseded => tracing::warn!("Clone run was superseded"),
    }
    Ok(())
}

async fn voiceover(config: &AppConfig, text: &str, voice: &str, output: &Path) -> Result<(), CoreError> {
    let gemini = GeminiClient::from_config(config)?;
    let spoken = truncate_for_voiceover(text);
    if spoken.len() < text.len() {
        tracing::info!("Voiceover text shortened to {} characters", spoken.chars().count());
    }

    let payload = gemini.generate_voiceover(&spoken, voice).await?;
    let clip = decode_voiceover(&payload)?;
    tokio::fs::write(output, &clip.wav).await?;

    let cues = build_cues(&spoken, clip.duration_secs);
    let cues_path = output.with_extension("json");
    tokio::fs::write(&cues_path, serde_json::to_string_pretty(&cues)?).await?;

    println!(
        "Wrote {} ({:.1}s) and {} ({} cues)",
        output.display(),
        clip.duration_secs,
        cues_path.display(),
        cues.len()
    );
    Ok(())
}
