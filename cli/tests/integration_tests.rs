use std::path::Path;
use std::process::{Command, Output};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn demo_with_env(args: &[&str], env: &[(&str, &Path)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_flagtree-demo"));
    cmd.args(args).env_remove("RUST_LOG").env_remove("FLAGTREE_USAGE");
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to run flagtree-demo")
}

fn demo(args: &[&str]) -> Output {
    demo_with_env(args, &[])
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

#[test]
fn flags_show_initialized_defaults() {
    let out = demo(&["flags"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        stdout(&out),
        "s: s-default\nb: false\ni: 0\nf: 0.000000\nsub.x: \nsub2.y: y-default\ntags: []\ntimeout: 2s\n"
    );
    assert_eq!(stderr(&out), "");
}

#[test]
fn flags_are_parsed_into_records() {
    let out = demo(&[
        "-s-flag", "hi", "-b", "-i", "3", "-f", "1.5", "-x", "X1", "--sub2.y=Y2", "-tag", "a",
        "-tag", "b", "-timeout", "500ms", "flags",
    ]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(
        stdout(&out),
        "s: hi\nb: true\ni: 3\nf: 1.500000\nsub.x: X1\nsub2.y: Y2\ntags: [a b]\ntimeout: 500ms\n"
    );
}

#[test]
fn invalid_flag_value_fails() {
    let out = demo(&["-i", "x", "flags"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).starts_with("invalid value \"x\" for flag -i"));
    assert_eq!(stdout(&out), "");
}

#[test]
fn oversized_timeout_is_rejected() {
    let out = demo(&["-timeout", "99999999999999999s", "flags"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).starts_with("invalid value \"99999999999999999s\" for flag -timeout"));
}

#[test]
fn undefined_flag_fails() {
    let out = demo(&["-zzz", "flags"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).starts_with("flag provided but not defined: -zzz\n"));
}

#[test]
fn excluded_record_has_no_flags() {
    let out = demo(&["-h"]);
    let text = stdout(&out);
    assert!(!text.contains("sub3"));
    assert!(!text.contains("-sub1"));
}

// ---------------------------------------------------------------------------
// Help
// ---------------------------------------------------------------------------

#[test]
fn root_help_lists_options_and_commands() {
    let out = demo(&["-h"]);
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.starts_with("demonstrate command usage\n\nDescription:\n"));
    assert!(text.contains("\nUsage:\nflagtree-demo [options] <command>\n"));
    assert!(text.contains("\nExamples:\nflagtree-demo -s hi -b -i 3 flags\n"));
    assert!(text.contains("\nGlobal Options:\n"));
    assert!(text.contains("  -b\t (default false)\n"));
    assert!(text.contains("  -s value\n    \tsame as --s-flag (default \"s-default\")\n"));
    assert!(text.contains("  -s-flag value\n    \tstring flag with two names (default \"s-default\")\n"));
    assert!(text.contains("  -sub2.y value\n    \tsub-2: Y (default \"y-default\")\n"));
    assert!(text.contains("  -tag label\n    \tattach a label, may be repeated (default none)\n"));
    assert!(text.contains("  -timeout value\n    \toperation timeout (default 2s)\n"));
    assert!(text.contains("  -x value\n    \tX (default \"\")\n"));
    assert!(text.contains("\nAvailable Commands:\n  docs    print the documentation of all commands\n"));
    assert!(text.contains("  version print the version\n"));
}

#[test]
fn no_arguments_prints_usage() {
    let out = demo(&[]);
    assert_eq!(out.status.code(), Some(0));
    assert!(stdout(&out).contains("Available Commands:"));
}

#[test]
fn subcommand_help_shows_all_levels() {
    let out = demo(&["hello", "-h"]);
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.starts_with("sub-command with args and additional flags\n"));
    assert!(text.contains("\nUsage:\nflagtree-demo [options] hello [options] <name>...\n"));
    let options = text.find("\nOptions:\n  -h\thelp\n  -prefix value").unwrap();
    let global = text.find("\nGlobal Options:\n").unwrap();
    assert!(options < global);
}

#[test]
fn unknown_command_fails() {
    let out = demo(&["nope"]);
    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.starts_with("no such command: nope\n"));
    assert!(err.contains("Available Commands:"));
    assert_eq!(stdout(&out), "");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[test]
fn handler_error_exits_with_failure() {
    let out = demo(&["error"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stderr(&out), "here's an error\n");
}

#[test]
fn hello_greets_each_name() {
    let out = demo(&["hello", "-prefix", "hi", "alice", "bob"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(stdout(&out).ends_with("timeout: 2s\nhi alice\nhi bob\n"));
}

#[test]
fn hello_without_names_is_a_usage_error() {
    let out = demo(&["hello"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stderr(&out), "usage: <name>...\n");
}

#[test]
fn typed_functions_check_arity() {
    let out = demo(&["two", "a", "b"]);
    assert_eq!(stdout(&out), "two: a b\n");

    let out = demo(&["two", "a"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stderr(&out), "not enough arguments: expected 2, got 1\n");

    let out = demo(&["two", "a", "b", "c"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stderr(&out), "too many arguments: expected 2, got 3\n");
}

#[test]
fn variadic_function_takes_the_rest() {
    assert_eq!(stdout(&demo(&["one+", "a"])), "one+: a []\n");
    assert_eq!(stdout(&demo(&["one+", "a", "b", "c"])), "one+: a [b c]\n");
    assert_eq!(demo(&["one+"]).status.code(), Some(1));
}

#[test]
fn mixed_function_converts_arguments() {
    assert_eq!(stdout(&demo(&["mixed", "x", "7"])), "a=x n=7\n");

    let out = demo(&["mixed", "x", "y"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).starts_with("argument 1 (\"y\"):"));
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn validation_failure_stops_the_command() {
    let out = demo(&["-s=", "flags"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stderr(&out), "missing -s\n");
    assert_eq!(stdout(&out), "");
}

#[test]
fn version_skips_validation() {
    let out = demo(&["-s=", "version"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        stdout(&out),
        format!("flagtree-demo {}\n", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn scratch_directory_is_removed_after_run() {
    let out = demo(&["scratch", "-name", "notes.txt"]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    let file = Path::new(text.trim_end());
    assert_eq!(file.file_name().and_then(|n| n.to_str()), Some("notes.txt"));
    assert!(!file.exists());
    assert!(!file.parent().unwrap().exists());
}

#[test]
fn scratch_rejects_invalid_name() {
    let out = demo(&["scratch", "-name="]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).starts_with("invalid scratch file name"));
}

// ---------------------------------------------------------------------------
// Documentation
// ---------------------------------------------------------------------------

#[test]
fn docs_yaml_exports_the_tree() {
    let out = demo(&["docs", "yaml"]);
    assert_eq!(out.status.code(), Some(0));
    let doc: serde_yaml::Value = serde_yaml::from_str(&stdout(&out)).unwrap();
    assert_eq!(doc["commands"]["hello"]["use"].as_str(), Some("<name>..."));
    assert_eq!(
        doc["commands"]["docs"]["commands"]["json"]["short"].as_str(),
        Some("print as JSON")
    );
}

#[test]
fn docs_json_exports_the_tree() {
    let out = demo(&["docs", "json"]);
    assert_eq!(out.status.code(), Some(0));
    let doc: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(doc["short"], "demonstrate command usage");
    assert_eq!(doc["commands"]["mixed"]["use"], "<string> <int>");
}

#[test]
fn usage_file_from_environment_overrides_embedded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("usage.yaml");
    std::fs::write(
        &path,
        "short: customized demo\ncommands:\n  two:\n    short: a pair of strings\n",
    )
    .unwrap();

    let out = demo_with_env(&["-h"], &[("FLAGTREE_USAGE", path.as_path())]);
    assert_eq!(out.status.code(), Some(0));
    let text = stdout(&out);
    assert!(text.starts_with("customized demo\n"));
    assert!(text.contains("  two     a pair of strings\n"));
    assert!(!text.contains("Description:"));
}
