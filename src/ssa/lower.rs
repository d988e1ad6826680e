//! Lowering from the parsed AST to the call-centric IR.
//!
//! One [`Function`] per declaration, plus one child function per closure
//! literal. Control flow splits the body into basic blocks; operands
//! lower before the call instruction they feed. Macro invocations are
//! opaque token streams and are not lowered.

use super::{BasicBlock, BlockId, CallInst, CalleeShape, FuncId, Function, Instruction, Program};
use crate::core::{FileId, SourceFile, SourcePos};
use std::collections::HashMap;
use std::path::Path;
use syn::spanned::Spanned;

/// Lower every source file into a single [`Program`].
pub fn lower_sources(files: &[SourceFile]) -> Program {
    let mut lowerer = Lowerer::new();
    for file in files {
        lowerer.file = file.id;
        lowerer.module_path = vec![module_name(&file.path)];
        lowerer.lower_items(&file.ast.items);
    }
    Program::from_functions(lowerer.functions)
}

/// The syntactic shape of a call expression's callee.
pub(crate) fn callee_shape(func: &syn::Expr) -> CalleeShape {
    match func {
        syn::Expr::Path(expr_path) if expr_path.qself.is_none() => CalleeShape::Path(
            expr_path
                .path
                .segments
                .iter()
                .map(|segment| segment.ident.to_string())
                .collect(),
        ),
        _ => CalleeShape::Opaque,
    }
}

/// Canonical identity of a call site: the position of its opening
/// parenthesis.
pub(crate) fn paren_pos(file: FileId, paren: &syn::token::Paren) -> SourcePos {
    SourcePos::new(file, paren.span.open().start())
}

fn module_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem == "mod" {
        if let Some(dir) = path.parent().and_then(|p| p.file_name()) {
            return dir.to_string_lossy().into_owned();
        }
    }
    stem
}

fn impl_type_name(ty: &syn::Type) -> Option<String> {
    match ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        syn::Type::Reference(reference) => impl_type_name(&reference.elem),
        _ => None,
    }
}

struct Lowerer {
    functions: Vec<Function>,
    closure_counts: HashMap<FuncId, u32>,
    file: FileId,
    module_path: Vec<String>,
}

/// Accumulates the basic blocks of one function body.
struct BodyBuilder {
    blocks: Vec<BasicBlock>,
    current: usize,
}

impl BodyBuilder {
    fn new() -> Self {
        Self {
            blocks: vec![BasicBlock::default()],
            current: 0,
        }
    }

    fn emit(&mut self, inst: Instruction) {
        self.blocks[self.current].instructions.push(inst);
    }

    fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::default());
        id
    }

    fn switch_to(&mut self, block: BlockId) {
        self.current = block.0 as usize;
    }

    fn finish(mut self) -> Vec<BasicBlock> {
        self.emit(Instruction::Ret);
        self.blocks
    }
}

impl Lowerer {
    fn new() -> Self {
        Self {
            functions: Vec::new(),
            closure_counts: HashMap::new(),
            file: FileId(0),
            module_path: Vec::new(),
        }
    }

    fn alloc_function(
        &mut self,
        name: String,
        owner: Option<String>,
        line: u32,
        parent: Option<FuncId>,
    ) -> FuncId {
        let id = FuncId(self.functions.len() as u32);
        self.functions.push(Function {
            id,
            name,
            owner,
            module_path: self.module_path.clone(),
            file: self.file,
            line,
            parent,
            blocks: Vec::new(),
        });
        id
    }

    fn lower_items(&mut self, items: &[syn::Item]) {
        for item in items {
            match item {
                syn::Item::Fn(item_fn) => {
                    self.lower_fn(
                        item_fn.sig.ident.to_string(),
                        None,
                        item_fn.sig.ident.span().start().line as u32,
                        &item_fn.block,
                    );
                }
                syn::Item::Impl(item_impl) => {
                    let owner = impl_type_name(&item_impl.self_ty);
                    for impl_item in &item_impl.items {
                        if let syn::ImplItem::Fn(method) = impl_item {
                            self.lower_fn(
                                method.sig.ident.to_string(),
                                owner.clone(),
                                method.sig.ident.span().start().line as u32,
                                &method.block,
                            );
                        }
                    }
                }
                syn::Item::Trait(item_trait) => {
                    let owner = Some(item_trait.ident.to_string());
                    for trait_item in &item_trait.items {
                        if let syn::TraitItem::Fn(method) = trait_item {
                            if let Some(block) = &method.default {
                                self.lower_fn(
                                    method.sig.ident.to_string(),
                                    owner.clone(),
                                    method.sig.ident.span().start().line as u32,
                                    block,
                                );
                            }
                        }
                    }
                }
                syn::Item::Mod(item_mod) => {
                    if let Some((_, items)) = &item_mod.content {
                        self.module_path.push(item_mod.ident.to_string());
                        self.lower_items(items);
                        self.module_path.pop();
                    }
                }
                _ => {}
            }
        }
    }

    fn lower_fn(
        &mut self,
        name: String,
        owner: Option<String>,
        line: u32,
        block: &syn::Block,
    ) -> FuncId {
        let id = self.alloc_function(name, owner, line, None);
        let mut body = BodyBuilder::new();
        self.lower_block(&mut body, id, block);
        self.functions[id.0 as usize].blocks = body.finish();
        id
    }

    fn lower_closure(&mut self, parent: FuncId, closure: &syn::ExprClosure) -> FuncId {
        let ordinal = {
            let count = self.closure_counts.entry(parent).or_insert(0);
            *count += 1;
            *count
        };
        let line = closure.or1_token.span().start().line as u32;
        let id = self.alloc_function(format!("closure#{ordinal}"), None, line, Some(parent));
        let mut body = BodyBuilder::new();
        self.lower_expr(&mut body, id, &closure.body);
        self.functions[id.0 as usize].blocks = body.finish();
        id
    }

    fn lower_block(&mut self, body: &mut BodyBuilder, func: FuncId, block: &syn::Block) {
        for stmt in &block.stmts {
            self.lower_stmt(body, func, stmt);
        }
    }

    fn lower_stmt(&mut self, body: &mut BodyBuilder, func: FuncId, stmt: &syn::Stmt) {
        match stmt {
            syn::Stmt::Local(local) => {
                if let Some(init) = &local.init {
                    self.lower_expr(body, func, &init.expr);
                    if let Some((_, diverge)) = &init.diverge {
                        self.lower_expr(body, func, diverge);
                    }
                }
            }
            syn::Stmt::Item(item) => self.lower_items(std::slice::from_ref(item)),
            syn::Stmt::Expr(expr, _) => self.lower_expr(body, func, expr),
            syn::Stmt::Macro(_) => {}
        }
    }

    fn lower_expr(&mut self, body: &mut BodyBuilder, func: FuncId, expr: &syn::Expr) {
        match expr {
            syn::Expr::Call(call) => {
                self.lower_expr(body, func, &call.func);
                for arg in &call.args {
                    self.lower_expr(body, func, arg);
                }
                body.emit(Instruction::Call(CallInst {
                    position: Some(paren_pos(self.file, &call.paren_token)),
                    callee: callee_shape(&call.func),
                }));
            }
            syn::Expr::MethodCall(call) => {
                self.lower_expr(body, func, &call.receiver);
                for arg in &call.args {
                    self.lower_expr(body, func, arg);
                }
                body.emit(Instruction::Call(CallInst {
                    position: Some(paren_pos(self.file, &call.paren_token)),
                    callee: CalleeShape::Method(call.method.to_string()),
                }));
            }
            syn::Expr::Closure(closure) => {
                let child = self.lower_closure(func, closure);
                body.emit(Instruction::MakeClosure { func: child });
            }
            syn::Expr::If(expr_if) => {
                self.lower_expr(body, func, &expr_if.cond);
                let then_block = body.new_block();
                let else_block = expr_if.else_branch.as_ref().map(|_| body.new_block());
                let join = body.new_block();
                body.emit(Instruction::Branch {
                    targets: vec![then_block, else_block.unwrap_or(join)],
                });
                body.switch_to(then_block);
                self.lower_block(body, func, &expr_if.then_branch);
                body.emit(Instruction::Jump { target: join });
                if let (Some(block), Some((_, else_expr))) =
                    (else_block, expr_if.else_branch.as_ref())
                {
                    body.switch_to(block);
                    self.lower_expr(body, func, else_expr);
                    body.emit(Instruction::Jump { target: join });
                }
                body.switch_to(join);
            }
            syn::Expr::Match(expr_match) => {
                self.lower_expr(body, func, &expr_match.expr);
                let arm_blocks: Vec<BlockId> =
                    expr_match.arms.iter().map(|_| body.new_block()).collect();
                let join = body.new_block();
                body.emit(Instruction::Branch {
                    targets: arm_blocks.clone(),
                });
                for (arm, block) in expr_match.arms.iter().zip(&arm_blocks) {
                    body.switch_to(*block);
                    if let Some((_, guard)) = &arm.guard {
                        self.lower_expr(body, func, guard);
                    }
                    self.lower_expr(body, func, &arm.body);
                    body.emit(Instruction::Jump { target: join });
                }
                body.switch_to(join);
            }
            syn::Expr::ForLoop(expr_for) => {
                self.lower_expr(body, func, &expr_for.expr);
                let header = body.new_block();
                let loop_body = body.new_block();
                let join = body.new_block();
                body.emit(Instruction::Jump { target: header });
                body.switch_to(header);
                body.emit(Instruction::Branch {
                    targets: vec![loop_body, join],
                });
                body.switch_to(loop_body);
                self.lower_block(body, func, &expr_for.body);
                body.emit(Instruction::Jump { target: header });
                body.switch_to(join);
            }
            syn::Expr::While(expr_while) => {
                let header = body.new_block();
                let loop_body = body.new_block();
                let join = body.new_block();
                body.emit(Instruction::Jump { target: header });
                body.switch_to(header);
                self.lower_expr(body, func, &expr_while.cond);
                body.emit(Instruction::Branch {
                    targets: vec![loop_body, join],
                });
                body.switch_to(loop_body);
                self.lower_block(body, func, &expr_while.body);
                body.emit(Instruction::Jump { target: header });
                body.switch_to(join);
            }
            syn::Expr::Loop(expr_loop) => {
                let header = body.new_block();
                let join = body.new_block();
                body.emit(Instruction::Jump { target: header });
                body.switch_to(header);
                self.lower_block(body, func, &expr_loop.body);
                body.emit(Instruction::Jump { target: header });
                body.switch_to(join);
            }
            syn::Expr::Return(expr_return) => {
                if let Some(inner) = &expr_return.expr {
                    self.lower_expr(body, func, inner);
                }
                body.emit(Instruction::Ret);
            }
            syn::Expr::Array(e) => {
                for elem in &e.elems {
                    self.lower_expr(body, func, elem);
                }
            }
            syn::Expr::Assign(e) => {
                self.lower_expr(body, func, &e.left);
                self.lower_expr(body, func, &e.right);
            }
            syn::Expr::Async(e) => self.lower_block(body, func, &e.block),
            syn::Expr::Await(e) => self.lower_expr(body, func, &e.base),
            syn::Expr::Binary(e) => {
                self.lower_expr(body, func, &e.left);
                self.lower_expr(body, func, &e.right);
            }
            syn::Expr::Block(e) => self.lower_block(body, func, &e.block),
            syn::Expr::Break(e) => {
                if let Some(inner) = &e.expr {
                    self.lower_expr(body, func, inner);
                }
            }
            syn::Expr::Cast(e) => self.lower_expr(body, func, &e.expr),
            syn::Expr::Const(e) => self.lower_block(body, func, &e.block),
            syn::Expr::Field(e) => self.lower_expr(body, func, &e.base),
            syn::Expr::Group(e) => self.lower_expr(body, func, &e.expr),
            syn::Expr::Index(e) => {
                self.lower_expr(body, func, &e.expr);
                self.lower_expr(body, func, &e.index);
            }
            syn::Expr::Let(e) => self.lower_expr(body, func, &e.expr),
            syn::Expr::Paren(e) => self.lower_expr(body, func, &e.expr),
            syn::Expr::Range(e) => {
                if let Some(start) = &e.start {
                    self.lower_expr(body, func, start);
                }
                if let Some(end) = &e.end {
                    self.lower_expr(body, func, end);
                }
            }
            syn::Expr::Reference(e) => self.lower_expr(body, func, &e.expr),
            syn::Expr::Repeat(e) => {
                self.lower_expr(body, func, &e.expr);
                self.lower_expr(body, func, &e.len);
            }
            syn::Expr::Struct(e) => {
                for field in &e.fields {
                    self.lower_expr(body, func, &field.expr);
                }
                if let Some(rest) = &e.rest {
                    self.lower_expr(body, func, rest);
                }
            }
            syn::Expr::Try(e) => self.lower_expr(body, func, &e.expr),
            syn::Expr::TryBlock(e) => self.lower_block(body, func, &e.block),
            syn::Expr::Tuple(e) => {
                for elem in &e.elems {
                    self.lower_expr(body, func, elem);
                }
            }
            syn::Expr::Unary(e) => self.lower_expr(body, func, &e.expr),
            syn::Expr::Unsafe(e) => self.lower_block(body, func, &e.block),
            syn::Expr::Yield(e) => {
                if let Some(inner) = &e.expr {
                    self.lower_expr(body, func, inner);
                }
            }
            // Paths, literals, macros, and the rest carry no lowerable calls.
            _ => {}
        }
    }
}
