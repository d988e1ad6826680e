//! Walks loop bodies and reports the N+1 findings.
//!
//! For each loop the walk is pre-order over the body region, never
//! descending into nested loops (those are scanned as their own loops),
//! and each source line yields at most one finding. Direct query calls
//! report immediately; other calls resolve to a lowered function and
//! report when the call graph reaches a query function from there. All
//! unresolved conditions degrade silently to "no report".

use super::bridge::{call_site, CallSite, SourceBridge};
use super::classifier::is_query_call;
use super::loops::LoopNode;
use crate::callgraph::CallGraph;
use crate::config::QueryMethodSet;
use crate::core::{FileId, FileSet, Finding};
use crate::ssa::{FuncId, Program};
use std::collections::HashSet;
use syn::visit::Visit;

pub const DIRECT_QUERY_MESSAGE: &str =
    "Potential N+1 query detected: DB query called directly inside a loop";

pub fn indirect_query_message(callee: &str) -> String {
    format!("Potential N+1 query detected: call to {callee} may lead to DB query inside loop")
}

/// Read-only inputs shared by every loop scan.
pub struct ScanContext<'a> {
    pub bridge: &'a SourceBridge,
    pub program: &'a Program,
    pub call_graph: &'a CallGraph,
    pub query_functions: &'a HashSet<FuncId>,
    pub methods: &'a QueryMethodSet,
    pub file_set: &'a FileSet,
}

/// Scan one loop, appending findings in pre-order traversal sequence.
pub fn scan_loop(loop_node: &LoopNode<'_>, ctx: &ScanContext<'_>, findings: &mut Vec<Finding>) {
    log::debug!(
        "scanning loop at {}",
        ctx.file_set.display_pos(loop_node.pos)
    );
    let mut scanner = LoopBodyScanner {
        ctx,
        file: loop_node.file,
        reported_lines: HashSet::new(),
        findings,
    };
    scanner.visit_block(loop_node.body);
}

struct LoopBodyScanner<'a, 'f> {
    ctx: &'a ScanContext<'a>,
    file: FileId,
    reported_lines: HashSet<u32>,
    findings: &'f mut Vec<Finding>,
}

impl LoopBodyScanner<'_, '_> {
    fn check_call(&mut self, site: CallSite) {
        let line = site.pos.line;
        if self.reported_lines.contains(&line) {
            return;
        }

        if is_query_call(&site, self.ctx.methods) {
            self.findings
                .push(Finding::new(site.pos, DIRECT_QUERY_MESSAGE));
            self.reported_lines.insert(line);
            return;
        }

        let Some(callee) = self
            .ctx
            .bridge
            .ssa_function_for_call(&site, self.ctx.program)
        else {
            log::debug!(
                "cannot resolve callee at {}",
                self.ctx.file_set.display_pos(site.pos)
            );
            return;
        };

        if self
            .ctx
            .call_graph
            .reaches_any(callee, self.ctx.query_functions)
        {
            let name = self.ctx.program.func(callee).qualified_name(self.ctx.program);
            self.findings
                .push(Finding::new(site.pos, indirect_query_message(&name)));
            self.reported_lines.insert(line);
        } else {
            log::debug!(
                "{} does not reach a query call",
                self.ctx.program.display_name(Some(callee))
            );
        }
    }
}

impl<'ast> Visit<'ast> for LoopBodyScanner<'_, '_> {
    fn visit_expr(&mut self, expr: &'ast syn::Expr) {
        // Nested loops are scanned as their own loops.
        if matches!(
            expr,
            syn::Expr::ForLoop(_) | syn::Expr::While(_) | syn::Expr::Loop(_)
        ) {
            return;
        }
        if let Some(site) = call_site(expr, self.file) {
            self.check_call(site);
        }
        syn::visit::visit_expr(self, expr);
    }
}
