//! Derives the set of functions whose body directly issues a query call.

use super::bridge::SourceBridge;
use super::classifier::is_query_call;
use super::AnalyzeError;
use crate::config::QueryMethodSet;
use crate::core::FileSet;
use crate::ssa::{FuncId, Program};
use std::collections::HashSet;

/// Scan every lowered function's call instructions; the first one whose
/// position maps to an AST call classified as a query call puts the
/// enclosing function in the set (one witness suffices). Linear in the
/// total number of call instructions.
pub fn build_query_function_set(
    program: &Program,
    bridge: &SourceBridge,
    methods: &QueryMethodSet,
    file_set: &FileSet,
) -> Result<HashSet<FuncId>, AnalyzeError> {
    let mut query_functions = HashSet::new();

    'functions: for func in program.functions() {
        for call in func.call_instructions() {
            let Some(pos) = call.position else {
                continue;
            };
            let Some(site) = bridge.call_at(pos) else {
                return Err(AnalyzeError::UnmappedCallInstruction {
                    location: file_set.display_pos(pos),
                });
            };
            if is_query_call(site, methods) {
                query_functions.insert(func.id);
                continue 'functions;
            }
        }
    }

    Ok(query_functions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SourceFile;
    use crate::ssa::lower::lower_sources;
    use std::path::PathBuf;

    fn analyze(source: &str) -> (Program, HashSet<FuncId>) {
        let mut file_set = FileSet::new();
        let path = PathBuf::from("example.rs");
        let id = file_set.add(path.clone());
        let files = [SourceFile {
            id,
            path,
            ast: syn::parse_file(source).unwrap(),
        }];
        let bridge = SourceBridge::build(&files, &file_set).unwrap();
        let program = lower_sources(&files);
        let set =
            build_query_function_set(&program, &bridge, &QueryMethodSet::default(), &file_set)
                .unwrap();
        (program, set)
    }

    fn named(program: &Program, set: &HashSet<FuncId>, name: &str) -> bool {
        program
            .functions()
            .any(|f| f.name == name && set.contains(&f.id))
    }

    #[test]
    fn functions_with_direct_queries_are_members() {
        let (program, set) = analyze(
            r#"
fn save_user(db: &Db, user: &User) {
    db.Model(user).Updates(user);
}

fn format_user(user: &User) -> String {
    format_name(user)
}
"#,
        );

        assert!(named(&program, &set, "save_user"));
        assert!(!named(&program, &set, "format_user"));
    }

    #[test]
    fn closures_are_tracked_separately_from_their_parents() {
        let (program, set) = analyze(
            r#"
fn spawn_sync(db: &Db, users: Vec<User>) {
    let sync = |user: &User| db.Where(user).First(user);
    run_each(users, sync);
}
"#,
        );

        let closure_in_set = program
            .functions()
            .any(|f| f.is_closure() && set.contains(&f.id));
        assert!(closure_in_set);
        assert!(!named(&program, &set, "spawn_sync"));
    }
}
