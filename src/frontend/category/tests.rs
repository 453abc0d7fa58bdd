//! Category graph tests

use proptest::prelude::*;

use super::*;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn arithmetic() -> CategoryGraph {
    let mut graph = CategoryGraph::new();
    graph.declare("Add", None, &[], &[]).unwrap();
    graph
        .declare("Mul", None, &names(&["Add"]), &[])
        .unwrap();
    graph
        .declare("Pow", None, &names(&["Mul"]), &[])
        .unwrap();
    graph
}

#[test]
fn test_transitive_tightness() {
    let graph = arithmetic();
    let add = graph.find("Add").unwrap();
    let pow = graph.find("Pow").unwrap();
    assert!(graph.tighter_than(pow, add));
    assert!(!graph.tighter_than(add, pow));
    assert!(!graph.tighter_than(add, add));
}

#[test]
fn test_incomparable_categories() {
    let mut graph = arithmetic();
    let concat = graph.declare("Concat", None, &[], &[]).unwrap();
    let add = graph.find("Add").unwrap();
    assert!(graph.incomparable(concat, add));
    assert!(!graph.incomparable(add, add));
    assert!(graph.comparable(graph.find("Pow").unwrap(), add));
}

#[test]
fn test_declare_between() {
    let mut graph = arithmetic();
    let neg = graph
        .declare("Neg", None, &names(&["Mul"]), &names(&["Pow"]))
        .unwrap();
    let mul = graph.find("Mul").unwrap();
    let pow = graph.find("Pow").unwrap();
    assert!(graph.tighter_than(neg, mul));
    assert!(graph.tighter_than(pow, neg));
}

#[test]
fn test_cycle_rejected_with_path() {
    let mut graph = arithmetic();
    let before = graph.clone();
    let err = graph
        .declare("Bad", None, &names(&["Pow"]), &names(&["Add"]))
        .unwrap_err();
    match err {
        RegistryError::CategoryCycle { category, cycle } => {
            assert_eq!(category, "Bad");
            assert_eq!(cycle, names(&["Pow", "Mul", "Add", "Bad", "Pow"]));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(graph, before);
    assert!(graph.find("Bad").is_none());
}

#[test]
fn test_relate_rejects_back_edge() {
    let mut graph = arithmetic();
    let err = graph.relate("Add", "Pow").unwrap_err();
    assert!(matches!(err, RegistryError::CategoryCycle { .. }));
    assert!(graph.relate("Pow", "Add").is_ok());
    assert!(matches!(
        graph.relate("Add", "Add"),
        Err(RegistryError::CategoryCycle { .. })
    ));
}

#[test]
fn test_unknown_and_duplicate() {
    let mut graph = arithmetic();
    assert!(matches!(
        graph.declare("X", None, &names(&["Nope"]), &[]),
        Err(RegistryError::UnknownCategory { .. })
    ));
    assert!(matches!(
        graph.declare("Add", None, &[], &[]),
        Err(RegistryError::DuplicateCategory { .. })
    ));
    assert!(matches!(
        graph.declare("Self", None, &names(&["Self"]), &[]),
        Err(RegistryError::CategoryCycle { .. })
    ));
}

#[test]
fn test_closure_invalidated_on_relate() {
    let mut graph = CategoryGraph::new();
    let a = graph.declare("A", None, &[], &[]).unwrap();
    let b = graph.declare("B", None, &[], &[]).unwrap();
    assert!(!graph.tighter_than(a, b));
    graph.relate("A", "B").unwrap();
    assert!(graph.tighter_than(a, b));
}

/// Random declarations: each new category picks some earlier categories to
/// be tighter than and some to be weaker than.
fn declarations() -> impl Strategy<Value = Vec<(Vec<usize>, Vec<usize>)>> {
    prop::collection::vec(
        (
            prop::collection::vec(0usize..16, 0..3),
            prop::collection::vec(0usize..16, 0..3),
        ),
        1..16,
    )
}

proptest! {
    #[test]
    fn prop_order_stays_strict(decls in declarations(), extra in prop::collection::vec((0usize..16, 0usize..16), 0..10)) {
        let mut graph = CategoryGraph::new();
        for (index, (tighter, weaker)) in decls.iter().enumerate() {
            let pick = |refs: &Vec<usize>| -> Vec<String> {
                if index == 0 {
                    return Vec::new();
                }
                refs.iter().map(|r| format!("C{}", r % index)).collect()
            };
            let snapshot = graph.clone();
            if graph.declare(&format!("C{}", index), None, &pick(tighter), &pick(weaker)).is_err() {
                prop_assert_eq!(&graph, &snapshot);
                // keep the numbering dense
                graph.declare(&format!("C{}", index), None, &[], &[]).unwrap();
            }
        }
        for (a, b) in extra {
            let count = graph.len();
            let snapshot = graph.clone();
            let (a, b) = (format!("C{}", a % count), format!("C{}", b % count));
            if graph.relate(&a, &b).is_err() {
                prop_assert_eq!(&graph, &snapshot);
            }
        }

        let ids: Vec<CategoryId> = graph.iter().map(|c| c.id).collect();
        for &a in &ids {
            // irreflexive
            prop_assert!(!graph.tighter_than(a, a));
            for &b in &ids {
                // asymmetric
                if graph.tighter_than(a, b) {
                    prop_assert!(!graph.tighter_than(b, a));
                }
                // transitive
                for &c in &ids {
                    if graph.tighter_than(a, b) && graph.tighter_than(b, c) {
                        prop_assert!(graph.tighter_than(a, c));
                    }
                }
            }
        }
    }
}
