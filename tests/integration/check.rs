//! Command-line checks against unit files

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn units_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("units")
}

/// Run the binary with a private config directory so a stray mixfix.ron
/// in the working directory cannot leak in
fn mixfix(args: &[&str]) -> Output {
    let config = tempfile::tempdir().unwrap();
    mixfix_with_config(args, config.path())
}

fn mixfix_with_config(
    args: &[&str],
    config: &Path,
) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mixfix"))
        .args(args)
        .arg("--config")
        .arg(config)
        .env_remove("MIXFIX_LOG")
        .env_remove("MIXFIX_JUXTAPOSITION")
        .output()
        .unwrap()
}

/// A unit whose only expression needs juxtaposition
fn application_unit(dir: &Path) -> PathBuf {
    let unit = dir.join("apply.ron");
    fs::write(
        &unit,
        r#"(
            directives: [
                Category((name: "Add")),
                Operator(name: "plus", form: "$a + $b", category: "Add"),
                Import(operator: "plus"),
            ],
            expressions: [(text: "f x + y")],
        )"#,
    )
    .unwrap();
    unit
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_check_sample_units() {
    let dir = units_dir();
    let output = mixfix(&["check", dir.to_str().unwrap(), "--color", "never"]);
    let out = stdout(&output);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(out.contains("(plus a (times b c))"), "{}", out);
    assert!(out.contains("(times (floor (plus a b)) (fact n))"), "{}", out);
    assert!(out.contains("(chain and a lt b le c)"), "{}", out);
    assert!(out.contains("(approx x y {eps: 0.1})"), "{}", out);
    assert!(out.contains("All checks passed (2 units)"), "{}", out);
}

#[test]
fn test_desugar_flag() {
    let unit = units_dir().join("relations.ron");
    let output = mixfix(&["check", unit.to_str().unwrap(), "--desugar"]);
    let out = stdout(&output);

    assert!(output.status.success());
    assert!(out.contains("(and (lt a b) (le b c))"), "{}", out);
}

#[test]
fn test_failing_expression_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let unit = dir.path().join("broken.ron");
    fs::write(
        &unit,
        r#"(
            directives: [
                Category((name: "Add")),
                Operator(name: "plus", form: "$a + $b", category: "Add"),
                Import(operator: "plus"),
            ],
            expressions: [(text: "a + b + c")],
        )"#,
    )
    .unwrap();

    let output = mixfix(&["check", unit.to_str().unwrap(), "--color", "never"]);
    let err = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(err.contains("E0303"), "{}", err);
    assert!(!stdout(&output).contains("All checks passed"));
}

#[test]
fn test_json_output() {
    let unit = units_dir().join("arithmetic.ron");
    let output = mixfix(&["check", unit.to_str().unwrap(), "--format", "json"]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let expressions = value[0]["expressions"].as_array().unwrap();
    assert_eq!(expressions.len(), 3);
    assert_eq!(expressions[0]["text"], "a + b * c");
    assert!(expressions[0]["tree"].is_object());
}

#[test]
fn test_explain_code() {
    let output = Command::new(env!("CARGO_BIN_EXE_mixfix"))
        .args(["explain", "e0303"])
        .output()
        .unwrap();
    let out = stdout(&output);

    assert!(output.status.success());
    assert!(out.starts_with("E0303 (Parse)"), "{}", out);
    assert!(out.contains("parentheses"), "{}", out);
}

#[test]
fn test_explain_unknown_code() {
    let output = Command::new(env!("CARGO_BIN_EXE_mixfix"))
        .args(["explain", "E9999"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_auto_color_off_when_piped() {
    let dir = tempfile::tempdir().unwrap();
    let unit = application_unit(dir.path());
    let output = mixfix(&["check", unit.to_str().unwrap()]);
    let err = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(err.contains("E0302"), "{}", err);
    assert!(!err.contains('\x1b'), "{:?}", err);

    let output = mixfix(&["check", unit.to_str().unwrap(), "--color", "always"]);
    assert!(String::from_utf8_lossy(&output.stderr).contains('\x1b'));
}

#[test]
fn test_flags_override_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let unit = application_unit(dir.path());
    fs::write(
        dir.path().join("mixfix.ron"),
        "(parser: (juxtaposition: true))",
    )
    .unwrap();
    let path = unit.to_str().unwrap();

    let output = mixfix_with_config(&["check", path], dir.path());
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("(plus (apply f x) y)"), "{}", stdout(&output));

    let output = mixfix_with_config(&["check", path, "--juxtaposition", "false"], dir.path());
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(err.contains("E0302"), "{}", err);

    // bare flag still switches it on
    let output = mixfix(&["check", path, "--juxtaposition"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
}
