//! Bridge between syntactic call sites and lowered functions.
//!
//! Call expressions are indexed once per pass by the position of their
//! opening parenthesis, so both directions of the mapping are O(1): a
//! call instruction's position recovers the call expression it came
//! from, and a call expression's callee resolves to the function that
//! would be executed.

use super::AnalyzeError;
use crate::core::{FileId, FileSet, SourceFile, SourcePos};
use crate::ssa::lower::{callee_shape, paren_pos};
use crate::ssa::{CalleeShape, FuncId, Program};
use std::collections::HashMap;
use syn::visit::Visit;

/// An indexed call expression: the position of its opening parenthesis
/// and the shape of its callee.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallSite {
    pub pos: SourcePos,
    pub callee: CalleeShape,
}

/// Extract the call-site descriptor if `expr` is a call expression.
pub fn call_site(expr: &syn::Expr, file: FileId) -> Option<CallSite> {
    match expr {
        syn::Expr::Call(call) => Some(CallSite {
            pos: paren_pos(file, &call.paren_token),
            callee: callee_shape(&call.func),
        }),
        syn::Expr::MethodCall(call) => Some(CallSite {
            pos: paren_pos(file, &call.paren_token),
            callee: CalleeShape::Method(call.method.to_string()),
        }),
        _ => None,
    }
}

/// Position-indexed map over every call expression in the pass's files.
pub struct SourceBridge {
    index: HashMap<SourcePos, CallSite>,
}

impl SourceBridge {
    /// Index all files. Two call expressions sharing an
    /// opening-parenthesis position is a programming error.
    pub fn build(files: &[SourceFile], file_set: &FileSet) -> Result<Self, AnalyzeError> {
        let mut index = HashMap::new();
        for file in files {
            let mut collector = CallCollector {
                file: file.id,
                index: &mut index,
                collision: None,
            };
            collector.visit_file(&file.ast);
            if let Some(pos) = collector.collision {
                return Err(AnalyzeError::PositionCollision {
                    location: file_set.display_pos(pos),
                });
            }
        }
        Ok(Self { index })
    }

    /// The unique call expression whose opening parenthesis sits at `pos`.
    pub fn call_at(&self, pos: SourcePos) -> Option<&CallSite> {
        self.index.get(&pos)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Resolve the callee of a call expression to the function that
    /// would be executed. `None` is not an error; it means the target
    /// cannot be named statically (function values, ambiguous methods,
    /// calls into undeclared code) and the site is treated as
    /// non-reaching.
    pub fn ssa_function_for_call(&self, call: &CallSite, program: &Program) -> Option<FuncId> {
        match &call.callee {
            CalleeShape::Path(segments) => program.resolve_path(segments),
            CalleeShape::Method(name) => program.resolve_method(name),
            CalleeShape::Opaque => None,
        }
    }
}

struct CallCollector<'a> {
    file: FileId,
    index: &'a mut HashMap<SourcePos, CallSite>,
    collision: Option<SourcePos>,
}

impl<'a, 'ast> Visit<'ast> for CallCollector<'a> {
    fn visit_expr(&mut self, expr: &'ast syn::Expr) {
        if let Some(site) = call_site(expr, self.file) {
            let pos = site.pos;
            if self.index.insert(pos, site).is_some() && self.collision.is_none() {
                self.collision = Some(pos);
            }
        }
        syn::visit::visit_expr(self, expr);
    }
}
