//! Referat - Meeting Transcription and Summarization
//!
//! A CLI tool that turns meeting recordings into transcripts and summaries.
//!
//! The name "Referat" is the Norwegian word for meeting minutes.
//!
//! # Overview
//!
//! Referat allows you to:
//! - Transcribe meeting recordings of any size (large files are compressed
//!   or split automatically)
//! - Fall back from a remote transcription endpoint to a local Whisper model
//! - Summarize transcripts in the meeting's language, with hierarchical
//!   merging for long meetings
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and language handling
//! - `audio` - Audio assets, compression, and splitting
//! - `transcription` - The remote/local transcription cascade
//! - `summarization` - Chunking, prompts, and summary merging
//! - `text` - Transcript normalization and Vietnamese repair
//! - `pipeline` - End-to-end coordination
//! - `storage` - Recording staging and retention cleanup
//!
//! # Example
//!
//! ```rust,no_run
//! use referat::config::Settings;
//! use referat::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(&settings);
//!
//!     let result = pipeline
//!         .process(
//!             std::path::Path::new("meeting.mp3"),
//!             "vi",
//!             None,
//!             "Quarterly planning",
//!         )
//!         .await?;
//!     println!("{}", result.summary);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod pipeline;
pub mod storage;
pub mod summarization;
pub mod text;
pub mod transcription;

pub use error::{ReferatError, Result};
