//! Failure reporting

use super::{arithmetic, Fixture};
use crate::frontend::parser::{parse, ParseError, ParseOptions};
use crate::frontend::registry::ScopeId;
use crate::util::diagnostic::ToDiagnostic;

fn no_parse_reason(error: &ParseError) -> &str {
    match error {
        ParseError::NoParse { reason, .. } => reason,
        other => panic!("expected a no-parse, got {:?}", other),
    }
}

#[test]
fn test_adjacent_atoms_without_juxtaposition() {
    let fixture = arithmetic();
    let error = fixture.error("a b");
    assert_eq!(error.code(), "E0302");
    assert_eq!(
        no_parse_reason(&error),
        "no operator connects the expression to 'b'"
    );
    assert_eq!(error.span().start.column, 3);
}

#[test]
fn test_missing_operand() {
    let fixture = arithmetic();
    assert_eq!(
        no_parse_reason(&fixture.error("a +")),
        "operator '+' is missing an operand"
    );
    assert_eq!(
        no_parse_reason(&fixture.error("+ a")),
        "expression cannot start with '+'"
    );
    assert_eq!(
        no_parse_reason(&fixture.error("a * + b")),
        "operator '*' is missing an operand"
    );
}

#[test]
fn test_unbalanced_parentheses() {
    let fixture = arithmetic();
    assert_eq!(no_parse_reason(&fixture.error("( a + b")), "unclosed '('");
    assert_eq!(no_parse_reason(&fixture.error("a + b )")), "unmatched ')'");
    assert_eq!(no_parse_reason(&fixture.error("( a ]")), "'(' is closed by ']'");
}

#[test]
fn test_empty_expression() {
    let snapshot = arithmetic().snapshot();
    let errors = parse(&[], &snapshot.grammar(), ScopeId::ROOT, &ParseOptions::default())
        .unwrap_err();
    assert_eq!(no_parse_reason(&errors[0]), "empty expression");
}

#[test]
fn test_undeclared_symbols_are_all_reported() {
    let fixture = arithmetic().operator("concat", "$a ++ $b", "Add");
    let errors = fixture.parse("a +++ b %% c").unwrap_err();
    assert_eq!(errors.len(), 2);

    match &errors[0] {
        ParseError::UndeclaredOperatorSymbol {
            symbol,
            declared_by,
            suggestion,
            ..
        } => {
            assert_eq!(symbol, "+++");
            assert!(declared_by.is_empty());
            assert_eq!(suggestion.as_deref(), Some("++"));
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(errors[1].span().start.column, 9);
    assert_eq!(errors[0].to_string(), "operator symbol '+++' is not declared");

    let diagnostic = errors[0].to_diagnostic();
    assert_eq!(diagnostic.code, "E0301");
    assert!(diagnostic.message.contains("'+++'"));
}

#[test]
fn test_ambiguity_diagnostic_points_at_each_operator() {
    let fixture = Fixture::new()
        .category("Add", &[])
        .operator("minus", "$a - $b", "Add");
    let diagnostic = fixture.error("a - b - c").to_diagnostic();
    assert_eq!(diagnostic.code, "E0303");
    assert_eq!(diagnostic.related.len(), 2);
    assert_eq!(diagnostic.spans().len(), 3);
}

#[test]
fn test_juxtaposition_builds_applications() {
    let fixture = arithmetic().juxtaposition();
    assert_eq!(fixture.sexp("f x y"), "(apply f x y)");
    assert_eq!(
        fixture.sexp("f x + g ( y * z )"),
        "(plus (apply f x) (apply g (times y z)))"
    );
    // applications are curried, so a parenthesised head flattens
    assert_eq!(fixture.sexp("( f x ) y"), "(apply f x y)");
}

#[test]
fn test_juxtaposition_does_not_swallow_operators() {
    let fixture = arithmetic().juxtaposition();
    let error = fixture.error("f +");
    assert_eq!(error.code(), "E0302");
}
