//! Class-hierarchy construction of the call graph.
//!
//! CHA resolves a method call to every same-named method declared in the
//! program, so dynamic dispatch through trait objects is always
//! over-approximated: if any implementor touches the database, every
//! caller of the method is treated as potentially reaching it. Path
//! calls link to the declarations their path names. Calls into code the
//! program does not declare produce no edges, leaving those callees
//! outside the graph.

use super::{CallEdge, CallGraph, CallKind};
use crate::ssa::{CalleeShape, Instruction, Program};

/// Build the conservative call graph for a lowered program.
pub fn build_call_graph(program: &Program) -> CallGraph {
    let mut graph = CallGraph::new();

    for func in program.functions() {
        graph.add_node(func.id);
    }

    for func in program.functions() {
        for block in &func.blocks {
            for inst in &block.instructions {
                match inst {
                    Instruction::Call(call) => match &call.callee {
                        CalleeShape::Path(segments) => {
                            for callee in program.path_candidates(segments) {
                                graph.add_call(CallEdge {
                                    caller: func.id,
                                    callee: *callee,
                                    kind: CallKind::Static,
                                });
                            }
                        }
                        CalleeShape::Method(name) => {
                            for callee in program.method_candidates(name) {
                                graph.add_call(CallEdge {
                                    caller: func.id,
                                    callee: *callee,
                                    kind: CallKind::Dynamic,
                                });
                            }
                        }
                        CalleeShape::Opaque => {}
                    },
                    Instruction::MakeClosure { func: closure } => {
                        graph.add_call(CallEdge {
                            caller: func.id,
                            callee: *closure,
                            kind: CallKind::Closure,
                        });
                    }
                    _ => {}
                }
            }
        }
    }

    graph
}
