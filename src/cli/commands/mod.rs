//! CLI command implementations.

mod clean;
mod config;
mod doctor;
mod init;
mod process;
mod summarize;
mod transcribe;

pub use clean::run_clean;
pub use config::run_config;
pub use doctor::run_doctor;
pub use init::run_init;
pub use process::run_process;
pub use summarize::run_summarize;
pub use transcribe::run_transcribe;
