//! CLI module for Referat.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Referat - Meeting Transcription and Summarization
///
/// A CLI tool that turns meeting recordings into transcripts and summaries.
/// The name "Referat" is the Norwegian word for meeting minutes.
#[derive(Parser, Debug)]
#[command(name = "referat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Referat and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Transcribe and summarize a meeting recording
    Process {
        /// Path to the audio recording
        file: PathBuf,

        /// What the meeting was about
        #[arg(short, long)]
        topic: String,

        /// Conversation language code (vi, en, zh, ja, ko, fr, de, es, or 'other')
        #[arg(short, long, default_value = "en")]
        language: String,

        /// Summary language name when --language is 'other'
        #[arg(long)]
        custom_language: Option<String>,

        /// Write the summary and transcript to this file (stdout if not set)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Transcribe a recording without summarizing
    Transcribe {
        /// Path to the audio recording
        file: PathBuf,

        /// Conversation language code (vi, en, zh, ja, ko, fr, de, es, or 'other')
        #[arg(short, long, default_value = "en")]
        language: String,

        /// Language name when --language is 'other'
        #[arg(long)]
        custom_language: Option<String>,

        /// Write the transcript to this file (stdout if not set)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Summarize an existing transcript file
    Summarize {
        /// Path to a plain-text transcript
        file: PathBuf,

        /// What the meeting was about
        #[arg(short, long)]
        topic: Option<String>,

        /// Summary language code (vi, en, zh, ja, ko, fr, de, es, or 'other')
        #[arg(short, long, default_value = "en")]
        language: String,

        /// Summary language name when --language is 'other'
        #[arg(long)]
        custom_language: Option<String>,

        /// Write the summary to this file (stdout if not set)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove staged recordings and temp files past the retention window
    Clean {
        /// Show what would be removed without deleting anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
