//! Intermediate representation the reachability analysis runs on.
//!
//! Each source-level function (free function, inherent or trait-impl
//! method, closure) lowers to a [`Function`] made of basic blocks of
//! instructions. The representation is deliberately call-centric: only
//! the instructions that matter for interprocedural reachability are
//! modeled, but block structure mirrors the source control flow so that
//! the program reads like a conventional IR.

pub mod lower;

use crate::core::{FileId, SourcePos};
use std::collections::HashMap;

/// Identity of a function in the lowered program. Functions are arena
/// allocated; two ids are the same function iff they are equal.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FuncId(pub u32);

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct BlockId(pub u32);

/// The syntactic shape of a call's callee, as far as name resolution can
/// see it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CalleeShape {
    /// A path call: `helper(..)`, `module::helper(..)`, `Type::new(..)`.
    Path(Vec<String>),
    /// A method call: `receiver.method(..)`.
    Method(String),
    /// Anything else: parenthesized function values, literals being
    /// called, and other forms that cannot be named statically.
    Opaque,
}

/// A call instruction. When present, the position equals the
/// opening-parenthesis position of the originating call expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallInst {
    pub position: Option<SourcePos>,
    pub callee: CalleeShape,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Call(CallInst),
    /// A closure literal; the child function may be invoked by whatever
    /// receives it.
    MakeClosure { func: FuncId },
    Branch { targets: Vec<BlockId> },
    Jump { target: BlockId },
    Ret,
}

#[derive(Clone, Debug, Default)]
pub struct BasicBlock {
    pub instructions: Vec<Instruction>,
}

#[derive(Clone, Debug)]
pub struct Function {
    pub id: FuncId,
    /// Simple name: `set_location`, `new`, `closure#1`.
    pub name: String,
    /// Impl type for methods, `None` for free functions and closures.
    pub owner: Option<String>,
    /// Module path: the file stem followed by inline module names.
    pub module_path: Vec<String>,
    pub file: FileId,
    pub line: u32,
    /// Enclosing function for closures.
    pub parent: Option<FuncId>,
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn is_closure(&self) -> bool {
        self.parent.is_some()
    }

    /// Package-qualified name used in diagnostics: closures format as
    /// `<parent>.<name>`, package-level functions as `<package>.<name>`,
    /// and functions with no package as the bare name.
    pub fn qualified_name(&self, program: &Program) -> String {
        if let Some(parent) = self.parent {
            format!("{}.{}", program.func(parent).qualified_name(program), self.name)
        } else if !self.module_path.is_empty() {
            format!("{}.{}", self.module_path.join("."), self.name)
        } else {
            self.name.clone()
        }
    }

    /// Iterate every call instruction in the body.
    pub fn call_instructions(&self) -> impl Iterator<Item = &CallInst> {
        self.blocks.iter().flat_map(|block| {
            block.instructions.iter().filter_map(|inst| match inst {
                Instruction::Call(call) => Some(call),
                _ => None,
            })
        })
    }
}

/// The lowered program plus the declaration indexes used for name
/// resolution: qualified-path candidates for path calls and simple-name
/// candidates for method calls.
#[derive(Clone, Debug, Default)]
pub struct Program {
    functions: Vec<Function>,
    path_index: HashMap<String, Vec<FuncId>>,
    method_index: HashMap<String, Vec<FuncId>>,
}

impl Program {
    pub(crate) fn from_functions(functions: Vec<Function>) -> Self {
        let mut program = Program {
            functions,
            path_index: HashMap::new(),
            method_index: HashMap::new(),
        };
        for func in &program.functions {
            // Closures cannot be named at call sites.
            if func.is_closure() {
                continue;
            }
            let id = func.id;
            match &func.owner {
                Some(owner) => {
                    program
                        .method_index
                        .entry(func.name.clone())
                        .or_default()
                        .push(id);
                    program
                        .path_index
                        .entry(format!("{owner}::{}", func.name))
                        .or_default()
                        .push(id);
                }
                None => {
                    program
                        .path_index
                        .entry(func.name.clone())
                        .or_default()
                        .push(id);
                    if let Some(module) = func.module_path.last() {
                        program
                            .path_index
                            .entry(format!("{module}::{}", func.name))
                            .or_default()
                            .push(id);
                    }
                }
            }
        }
        program
    }

    pub fn func(&self, id: FuncId) -> &Function {
        &self.functions[id.0 as usize]
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// All declared functions a path call could dispatch to. The most
    /// qualified matching index wins; an unknown path has no candidates.
    pub fn path_candidates(&self, segments: &[String]) -> &[FuncId] {
        let norm: Vec<&str> = segments
            .iter()
            .map(String::as_str)
            .skip_while(|seg| matches!(*seg, "crate" | "self" | "super"))
            .collect();
        if norm.is_empty() {
            return &[];
        }

        let full = norm.join("::");
        if let Some(candidates) = self.path_index.get(&full) {
            return candidates;
        }
        if norm.len() > 2 {
            let tail = norm[norm.len() - 2..].join("::");
            if let Some(candidates) = self.path_index.get(&tail) {
                return candidates;
            }
        }
        if norm.len() > 1 {
            if let Some(candidates) = self.path_index.get(norm[norm.len() - 1]) {
                return candidates;
            }
        }
        &[]
    }

    /// All declared methods with the given simple name.
    pub fn method_candidates(&self, name: &str) -> &[FuncId] {
        self.method_index.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve a path call to the function that would be executed; `None`
    /// unless the declaration is unique.
    pub fn resolve_path(&self, segments: &[String]) -> Option<FuncId> {
        match self.path_candidates(segments) {
            [single] => Some(*single),
            _ => None,
        }
    }

    /// Resolve a method call by its selected name; `None` unless the
    /// declaration is unique.
    pub fn resolve_method(&self, name: &str) -> Option<FuncId> {
        match self.method_candidates(name) {
            [single] => Some(*single),
            _ => None,
        }
    }

    /// Diagnostic name for a possibly-unresolved function reference.
    pub fn display_name(&self, func: Option<FuncId>) -> String {
        match func {
            Some(id) => self.func(id).qualified_name(self),
            None => "<unknown>".to_string(),
        }
    }
}
