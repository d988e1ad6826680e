use nplusone::callgraph::cha::build_call_graph;
use nplusone::callgraph::CallKind;
use nplusone::ssa::lower::lower_sources;
use nplusone::ssa::{FuncId, Program};
use nplusone::{CallGraph, FileSet, SourceFile};
use std::collections::HashSet;
use std::path::PathBuf;

fn build(source: &str) -> (Program, CallGraph) {
    let mut file_set = FileSet::new();
    let path = PathBuf::from("example.rs");
    let id = file_set.add(path.clone());
    let files = [SourceFile {
        id,
        path,
        ast: syn::parse_file(source).unwrap(),
    }];
    let program = lower_sources(&files);
    let graph = build_call_graph(&program);
    (program, graph)
}

fn id_of(program: &Program, name: &str, owner: Option<&str>) -> FuncId {
    program
        .functions()
        .find(|f| f.name == name && f.owner.as_deref() == owner)
        .unwrap_or_else(|| panic!("no function {owner:?}::{name}"))
        .id
}

#[test]
fn method_calls_expand_over_every_same_named_method() {
    let source = r#"
trait Backend {
    fn persist(&self);
}

struct Sql;
struct Memory;

impl Sql {
    fn persist(&self) {
        run_query();
    }
}

impl Memory {
    fn persist(&self) {}
}

fn run_query() {}

fn store(backend: &dyn Backend) {
    backend.persist();
}
"#;
    let (program, graph) = build(source);

    let store = id_of(&program, "store", None);
    let sql_persist = id_of(&program, "persist", Some("Sql"));
    let memory_persist = id_of(&program, "persist", Some("Memory"));
    let run_query = id_of(&program, "run_query", None);

    let callees: HashSet<FuncId> = graph.callees(store).into_iter().collect();
    assert!(callees.contains(&sql_persist));
    assert!(callees.contains(&memory_persist));

    let dynamic_edges = graph
        .edges()
        .filter(|edge| edge.caller == store && edge.kind == CallKind::Dynamic)
        .count();
    assert_eq!(dynamic_edges, 2);

    // One implementor touches the query function, so the caller reaches it.
    let targets: HashSet<FuncId> = [run_query].into_iter().collect();
    assert!(graph.reaches_any(store, &targets));
    assert!(!graph.reaches_any(memory_persist, &targets));
}

#[test]
fn closures_are_linked_from_their_enclosing_function() {
    let source = r#"
fn compute(x: u32) {}

fn sched(items: Vec<u32>) {
    let f = |x: u32| compute(x);
    each(items, f);
}
"#;
    let (program, graph) = build(source);

    let sched = id_of(&program, "sched", None);
    let compute = id_of(&program, "compute", None);
    let closure = program
        .functions()
        .find(|f| f.is_closure())
        .expect("closure function")
        .id;

    let closure_edges: Vec<_> = graph
        .edges()
        .filter(|edge| edge.caller == sched && edge.kind == CallKind::Closure)
        .collect();
    assert_eq!(closure_edges.len(), 1);
    assert_eq!(closure_edges[0].callee, closure);

    let targets: HashSet<FuncId> = [compute].into_iter().collect();
    assert!(graph.reaches_any(sched, &targets));
}

#[test]
fn calls_into_undeclared_code_add_no_edges() {
    let source = r#"
fn isolated(items: Vec<u32>) {
    external::push_metrics(items);
    format!("{}", 1);
}
"#;
    let (program, graph) = build(source);

    let isolated = id_of(&program, "isolated", None);
    assert!(graph.callees(isolated).is_empty());
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn static_call_cycles_stay_bounded() {
    let source = r#"
fn alpha(n: u32) {
    beta(n);
}

fn beta(n: u32) {
    alpha(n);
}
"#;
    let (program, graph) = build(source);

    let alpha = id_of(&program, "alpha", None);
    let beta = id_of(&program, "beta", None);

    let unrelated: HashSet<FuncId> = [FuncId(999)].into_iter().collect();
    assert!(!graph.reaches_any(alpha, &unrelated));

    let targets: HashSet<FuncId> = [beta].into_iter().collect();
    assert!(graph.reaches_any(alpha, &targets));
}
