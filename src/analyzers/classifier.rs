//! Decides whether a call expression is a direct query call.

use super::bridge::CallSite;
use crate::config::QueryMethodSet;
use crate::ssa::CalleeShape;

/// True iff the callee is a method selector `x.M(..)` and `M` is in the
/// configured query-method set. Bare path calls and opaque callees never
/// match. Matching is by name only; the receiver's type is not checked,
/// which accepts false positives in exchange for not depending on type
/// resolution of the receiver chain.
pub fn is_query_call(call: &CallSite, methods: &QueryMethodSet) -> bool {
    match &call.callee {
        CalleeShape::Method(name) => methods.contains(name),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FileId, SourcePos};

    fn site(callee: CalleeShape) -> CallSite {
        CallSite {
            pos: SourcePos {
                file: FileId(0),
                line: 1,
                column: 0,
            },
            callee,
        }
    }

    #[test]
    fn method_in_set_matches() {
        let methods = QueryMethodSet::default();

        assert!(is_query_call(
            &site(CalleeShape::Method("Updates".to_string())),
            &methods
        ));
        assert!(is_query_call(
            &site(CalleeShape::Method("Find".to_string())),
            &methods
        ));
    }

    #[test]
    fn method_outside_set_does_not_match() {
        let methods = QueryMethodSet::default();

        assert!(!is_query_call(
            &site(CalleeShape::Method("len".to_string())),
            &methods
        ));
    }

    #[test]
    fn path_calls_never_match() {
        let methods = QueryMethodSet::default();

        // `Find(..)` as a bare call is not a selector.
        assert!(!is_query_call(
            &site(CalleeShape::Path(vec!["Find".to_string()])),
            &methods
        ));
        assert!(!is_query_call(&site(CalleeShape::Opaque), &methods));
    }

    #[test]
    fn custom_roster_overrides_default() {
        let methods: QueryMethodSet = ["fetch_all"].into_iter().collect();

        assert!(is_query_call(
            &site(CalleeShape::Method("fetch_all".to_string())),
            &methods
        ));
        assert!(!is_query_call(
            &site(CalleeShape::Method("Find".to_string())),
            &methods
        ));
    }
}
