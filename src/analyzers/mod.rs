//! The N+1 detection pass: interprocedural reachability from loop-body
//! call sites to database query calls.

pub mod bridge;
pub mod classifier;
pub mod loops;
pub mod query_set;
pub mod scanner;

use crate::callgraph::cha::build_call_graph;
use crate::callgraph::CallGraph;
use crate::config::Config;
use crate::core::{FileSet, Finding, SourceFile, SourcePos};
use crate::ssa::lower::lower_sources;
use crate::ssa::Program;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal internal errors. Everything else (unresolved callees, functions
/// absent from the call graph) degrades silently to "no report".
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("two call expressions share the opening-parenthesis position {location}")]
    PositionCollision { location: String },

    #[error("call instruction at {location} maps to no call expression")]
    UnmappedCallInstruction { location: String },
}

/// Host-provided inputs for one package snapshot, plus the finding list
/// the pass accumulates into. Inputs are immutable during analysis;
/// findings are drained by the reporter at end of pass.
pub struct AnalysisPass<'a> {
    pub files: &'a [SourceFile],
    pub file_set: &'a FileSet,
    pub program: &'a Program,
    pub call_graph: &'a CallGraph,
    pub config: &'a Config,
    findings: Vec<Finding>,
}

impl<'a> AnalysisPass<'a> {
    pub fn new(
        files: &'a [SourceFile],
        file_set: &'a FileSet,
        program: &'a Program,
        call_graph: &'a CallGraph,
        config: &'a Config,
    ) -> Self {
        Self {
            files,
            file_set,
            program,
            call_graph,
            config,
            findings: Vec::new(),
        }
    }

    /// Diagnostic sink.
    pub fn report(&mut self, position: SourcePos, message: impl Into<String>) {
        self.findings.push(Finding::new(position, message));
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }
}

/// Run the pass: index call sites, derive the query-function set,
/// collect loops, and scan each loop body. Per loop, findings are
/// emitted in pre-order traversal sequence.
pub fn run(pass: &mut AnalysisPass<'_>) -> Result<(), AnalyzeError> {
    let bridge = bridge::SourceBridge::build(pass.files, pass.file_set)?;
    log::debug!("indexed {} call site(s)", bridge.len());

    let query_functions = query_set::build_query_function_set(
        pass.program,
        &bridge,
        &pass.config.query_methods,
        pass.file_set,
    )?;
    log::debug!(
        "{} of {} function(s) issue direct query calls",
        query_functions.len(),
        pass.program.len()
    );

    let loops = loops::collect_loops(pass.files, &pass.config.ignore_files);
    log::debug!("{} loop(s) collected", loops.len());

    let ctx = scanner::ScanContext {
        bridge: &bridge,
        program: pass.program,
        call_graph: pass.call_graph,
        query_functions: &query_functions,
        methods: &pass.config.query_methods,
        file_set: pass.file_set,
    };

    let mut findings = Vec::new();
    for loop_node in &loops {
        scanner::scan_loop(loop_node, &ctx, &mut findings);
    }
    for finding in findings {
        pass.report(finding.position, finding.message);
    }
    Ok(())
}

/// The result of analyzing one set of sources.
pub struct Analysis {
    pub file_set: FileSet,
    pub findings: Vec<Finding>,
}

/// Parse the given sources, lower them, build the call graph, and run
/// the pass. Findings come back sorted by position for stable output.
/// Sources that fail to parse are skipped with a warning.
pub fn analyze_sources(sources: &[(PathBuf, String)], config: &Config) -> anyhow::Result<Analysis> {
    let mut file_set = FileSet::new();
    let mut files = Vec::new();
    for (path, source) in sources {
        match syn::parse_file(source) {
            Ok(ast) => {
                let id = file_set.add(path.clone());
                files.push(SourceFile {
                    id,
                    path: path.clone(),
                    ast,
                });
            }
            Err(err) => log::warn!("skipping {}: {}", path.display(), err),
        }
    }

    let program = lower_sources(&files);
    let call_graph = build_call_graph(&program);
    log::debug!(
        "lowered {} function(s), call graph has {} edge(s)",
        program.len(),
        call_graph.edge_count()
    );

    let mut pass = AnalysisPass::new(&files, &file_set, &program, &call_graph, config);
    run(&mut pass)?;

    let mut findings = pass.into_findings();
    findings.sort();
    Ok(Analysis { file_set, findings })
}
