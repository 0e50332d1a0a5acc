use clap::{Args, Parser, Subcommand};
use kloner_core::TitleProviderKind;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "kloner", version, about = "Fetch Reddit posts and give them a viral title")]
pub struct Cli {
    /// TOML configuration file (defaults to ./kloner.toml when present)
    #[arg(long, short, global = true, env = "KLONER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the local reverse proxy
    Serve {
        /// Port to listen on, overrides the configured port
        #[arg(long, short)]
        port: Option<u16>,
    },
    /// Fetch a post and print it
    Fetch(PostArgs),
    /// Fetch a post and generate a new title for it
    Clone {
        #[command(flatten)]
        post: PostArgs,

        /// Title provider, overrides the configured provider
        #[arg(long, value_parser = parse_provider)]
        provider: Option<TitleProviderKind>,
    },
    /// Turn text into a WAV voiceover with word timings
    Voiceover {
        /// Text to speak; read from --file when omitted
        text: Option<String>,

        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        #[arg(long, default_value = "Alice (Calm)")]
        voice: String,

        #[arg(long, short, default_value = "voiceover.wav")]
        output: PathBuf,
    },
    /// Show the number of successful title generations
    Streak,
}

#[derive(Debug, Args)]
pub struct PostArgs {
    /// Link to the Reddit post
    pub url: String,

    /// Print JSON instead of a text card
    #[arg(long)]
    pub json: bool,
}

fn parse_provider(value: &str) -> Result<TitleProviderKind, String> {
    value.parse()
}
