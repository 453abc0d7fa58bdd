//! Inner parameters written inside operator syntax

use super::Fixture;
use crate::frontend::parser::ParseError;
use crate::frontend::registry::{OperatorDefinition, ParamSlot, ParamSpec, Tightness};
use crate::frontend::tree::{ParamValue, ParseNode};
use crate::util::diagnostic::ToDiagnostic;

fn springs() -> Fixture {
    Fixture::new().category("Spring", &[]).define(
        OperatorDefinition::from_notation("~~", "$a ~~ [] ~~ $b")
            .unwrap()
            .right(Tightness::Strict)
            .params(
                ParamSpec::new()
                    .with(ParamSlot::optional("tension", &["1", "1"]))
                    .with(ParamSlot::optional("damping", &["0"])),
            ),
        "Spring",
    )
}

fn params_of(node: &ParseNode) -> Vec<(String, Vec<String>, bool)> {
    let ParseNode::Apply { params, .. } = node else {
        panic!("expected an operator application, got {:?}", node);
    };
    params
        .iter()
        .map(|(name, value)| {
            (
                name.clone(),
                value.texts().into_iter().map(String::from).collect(),
                value.is_default(),
            )
        })
        .collect()
}

#[test]
fn test_supplied_parameters() {
    let fixture = springs();
    let node = fixture.node("a ~~ [ tension : 1.5 , 1 ] ~~ b");
    assert_eq!(
        params_of(&node),
        vec![
            ("tension".to_string(), vec!["1.5".to_string(), "1".to_string()], false),
            ("damping".to_string(), vec!["0".to_string()], true),
        ]
    );
    assert_eq!(
        node.sexp(&fixture.snapshot()).to_string(),
        "(~~ a b {tension: 1.5 1, damping: 0})"
    );
}

#[test]
fn test_omitted_list_binds_defaults() {
    let fixture = springs();
    let node = fixture.node("a ~~ ~~ b");
    assert!(params_of(&node).iter().all(|(_, _, default)| *default));
    assert_eq!(
        node.sexp(&fixture.snapshot()).to_string(),
        "(~~ a b {tension: 1 1, damping: 0})"
    );

    // an empty list means the same
    assert!(fixture
        .node("a ~~ [ ] ~~ b")
        .same_structure(&fixture.node("a ~~ ~~ b")));
}

#[test]
fn test_parameters_in_nested_applications() {
    let fixture = springs();
    assert_eq!(
        fixture.sexp("a ~~ [ damping : 2 ] ~~ b ~~ ~~ c"),
        "(~~ (~~ a b {tension: 1 1, damping: 2}) c {tension: 1 1, damping: 0})"
    );
}

#[test]
fn test_unknown_label_is_reported() {
    let fixture = springs();
    let error = fixture.error("a ~~ [ tensoin : 1 , 1 ] ~~ b");
    match &error {
        ParseError::UnknownParameter {
            operator,
            label,
            expected,
            span,
        } => {
            assert_eq!(operator, "~~");
            assert_eq!(label, "tensoin");
            assert_eq!(expected, &vec!["tension".to_string(), "damping".to_string()]);
            assert_eq!(span.start.column, 8);
        }
        other => panic!("unexpected: {:?}", other),
    }

    let diagnostic = error.to_diagnostic();
    assert_eq!(diagnostic.code, "E0304");
    assert!(diagnostic
        .related
        .iter()
        .any(|note| note.message.contains("did you mean 'tension'?")));
}

#[test]
fn test_wrong_value_count_is_reported() {
    let fixture = springs();
    let error = fixture.error("a ~~ [ tension : 2 ] ~~ b");
    assert_eq!(error.code(), "E0305");
    assert!(error.to_string().contains("expects 2 value(s), got 1"));
}

#[test]
fn test_supplied_value_tokens_keep_spans() {
    let fixture = springs();
    let node = fixture.node("a ~~ [ 3 , 4 ] ~~ b");
    let ParseNode::Apply { params, .. } = &node else {
        panic!("expected an operator application");
    };
    let ParamValue::Supplied(tokens) = &params["tension"] else {
        panic!("tension should be supplied");
    };
    assert_eq!(tokens[0].span.start.column, 8);
    assert_eq!(tokens[1].span.start.column, 12);
}
