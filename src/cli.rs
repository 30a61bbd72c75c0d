use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "trendlag")]
#[command(about = "Viral trend reports and GEM creative ratings from Gemini or OpenAI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch a viral trend report for US, UK and AU
    Trends {
        /// LLM provider: "gemini" or "openai"
        #[arg(long, default_value = "gemini")]
        provider: String,

        /// Model override for this run
        #[arg(long)]
        model: Option<String>,

        /// Skip Google Search grounding (Gemini only). Uses the response
        /// schema instead, and returns no sources.
        #[arg(long)]
        no_search: bool,
    },

    /// Rate an image or video creative against the GEM framework
    Rate {
        /// Image or video file (max 20MB by default)
        file: PathBuf,

        /// LLM provider: "gemini" or "openai"
        #[arg(long, default_value = "gemini")]
        provider: String,

        /// Model override for this run
        #[arg(long)]
        model: Option<String>,
    },

    /// Show where the config file is read from
    Paths,
}
