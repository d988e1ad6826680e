//! Enumerates loop nodes in the parsed sources.

use crate::core::{FileId, SourceFile, SourcePos};
use syn::visit::Visit;

/// A loop statement and its body region. `for`, `while`, and `loop`
/// forms all count; labels fold into the same category.
pub struct LoopNode<'ast> {
    pub file: FileId,
    /// Position of the loop keyword, for tracing.
    pub pos: SourcePos,
    pub body: &'ast syn::Block,
}

/// Collect every loop in the given files, in source order per file.
/// Files matching an ignore pattern are skipped entirely.
pub fn collect_loops<'ast>(
    files: &'ast [SourceFile],
    ignore_patterns: &[String],
) -> Vec<LoopNode<'ast>> {
    let patterns: Vec<glob::Pattern> = ignore_patterns
        .iter()
        .filter_map(|raw| match glob::Pattern::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                log::warn!("invalid ignore pattern {raw:?}: {err}");
                None
            }
        })
        .collect();

    let mut loops = Vec::new();
    for file in files {
        if is_ignored(file, &patterns) {
            log::debug!("ignoring {}", file.path.display());
            continue;
        }
        let mut collector = LoopCollector {
            file: file.id,
            loops: &mut loops,
        };
        collector.visit_file(&file.ast);
    }
    loops
}

fn is_ignored(file: &SourceFile, patterns: &[glob::Pattern]) -> bool {
    let path = file.path.to_string_lossy();
    let name = file
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    patterns
        .iter()
        .any(|pattern| pattern.matches(&path) || pattern.matches(&name))
}

struct LoopCollector<'a, 'ast> {
    file: FileId,
    loops: &'a mut Vec<LoopNode<'ast>>,
}

impl<'a, 'ast> Visit<'ast> for LoopCollector<'a, 'ast> {
    fn visit_expr(&mut self, expr: &'ast syn::Expr) {
        match expr {
            syn::Expr::ForLoop(expr_for) => self.loops.push(LoopNode {
                file: self.file,
                pos: SourcePos::new(self.file, expr_for.for_token.span.start()),
                body: &expr_for.body,
            }),
            syn::Expr::While(expr_while) => self.loops.push(LoopNode {
                file: self.file,
                pos: SourcePos::new(self.file, expr_while.while_token.span.start()),
                body: &expr_while.body,
            }),
            syn::Expr::Loop(expr_loop) => self.loops.push(LoopNode {
                file: self.file,
                pos: SourcePos::new(self.file, expr_loop.loop_token.span.start()),
                body: &expr_loop.body,
            }),
            _ => {}
        }
        // Nested loops are collected as their own entries.
        syn::visit::visit_expr(self, expr);
    }
}
