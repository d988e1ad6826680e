// Export modules for library usage
pub mod analyzers;
pub mod callgraph;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;
pub mod ssa;

// Re-export commonly used types
pub use crate::analyzers::{analyze_sources, run, Analysis, AnalysisPass, AnalyzeError};
pub use crate::callgraph::{CallEdge, CallGraph, CallKind};
pub use crate::config::{get_config, set_config, Config, QueryMethodSet};
pub use crate::core::{FileId, FileSet, Finding, SourceFile, SourcePos};
pub use crate::io::output::OutputFormat;
pub use crate::ssa::{FuncId, Program};
