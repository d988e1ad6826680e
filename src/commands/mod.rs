pub mod analyze;
pub mod init;

pub use analyze::{handle_analyze_command, AnalyzeOptions};
pub use init::init_config;
