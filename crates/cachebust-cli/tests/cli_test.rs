//! Integration tests for the cache-bust binary

use assert_cmd::prelude::*;
use cachebust_config::testing::TestEnvironment;
use predicates::prelude::*;
use std::process::{Command, Stdio};

const USAGE: &str = "Usage: cache-bust <input_file> <output_file>\n";

/// Helper to build a cache-bust command isolated inside `env`
fn cache_bust(env: &TestEnvironment, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cache-bust"));
    cmd.args(args).current_dir(&env.project_root);
    for (key, value) in env.command_env() {
        match value {
            Some(value) => cmd.env(key, value),
            None => cmd.env_remove(key),
        };
    }
    cmd
}

fn stamp_line() -> predicates::str::RegexPredicate {
    predicate::str::is_match(r"^/\* BUILD_VERSION: \d+ \*/\n").unwrap()
}

// ========== Usage errors ==========

#[test]
fn test_no_args_prints_usage() {
    let env = TestEnvironment::new().unwrap();
    cache_bust(&env, &[])
        .assert()
        .code(1)
        .stdout(USAGE);
}

#[test]
fn test_one_arg_prints_usage_and_touches_nothing() {
    let env = TestEnvironment::new().unwrap();
    let input = env.create_file("bundle.js", b"run();\n").unwrap();

    cache_bust(&env, &["bundle.js"])
        .assert()
        .code(1)
        .stdout(USAGE);

    assert_eq!(std::fs::read(&input).unwrap(), b"run();\n");
}

#[test]
fn test_three_args_prints_usage_and_writes_nothing() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("bundle.js", b"run();\n").unwrap();

    cache_bust(&env, &["bundle.js", "out.js", "extra.js"])
        .assert()
        .code(1)
        .stdout(USAGE);

    assert!(!env.path("out.js").exists());
    assert!(!env.path("extra.js").exists());
}

#[test]
fn test_version_alone_prints_usage() {
    let env = TestEnvironment::new().unwrap();
    cache_bust(&env, &["--version"])
        .assert()
        .code(1)
        .stdout(USAGE);
}

#[test]
fn test_help_alone_prints_usage() {
    let env = TestEnvironment::new().unwrap();
    cache_bust(&env, &["--help"])
        .assert()
        .code(1)
        .stdout(USAGE);
}

// ========== Flag-like paths ==========

#[test]
fn test_help_as_output_path_is_stamped() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("in.js", b"x").unwrap();

    cache_bust(&env, &["in.js", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  Output: --help\n"));

    let written = std::fs::read_to_string(env.path("--help")).unwrap();
    assert!(stamp_line().eval(&written));
    assert!(written.ends_with("*/\nx"));
}

#[test]
fn test_hyphen_prefixed_input_is_read() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("-x.js", b"dash();\n").unwrap();

    cache_bust(&env, &["-x.js", "out.js"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  Input:  -x.js\n"));

    let written = std::fs::read_to_string(env.path("out.js")).unwrap();
    assert!(written.ends_with("*/\ndash();\n"));
}

#[test]
fn test_missing_hyphen_prefixed_input_is_read_error() {
    let env = TestEnvironment::new().unwrap();

    cache_bust(&env, &["-missing.js", "out.js"])
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::starts_with("❌ Error:"));

    assert!(!env.path("out.js").exists());
}

// ========== Stamping ==========

#[test]
fn test_stamps_output_and_reports() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("bundle.js", b"console.log(\"hi\");\n")
        .unwrap();

    cache_bust(&env, &["bundle.js", "out.js"])
        .assert()
        .success()
        .stdout(
            predicate::str::is_match(
                r"^✓ Cache-bust added: \d+\n  Input:  bundle\.js\n  Output: out\.js\n$",
            )
            .unwrap(),
        );

    let written = std::fs::read_to_string(env.path("out.js")).unwrap();
    assert!(stamp_line().eval(&written));
    assert!(written.ends_with("*/\nconsole.log(\"hi\");\n"));
    assert_eq!(written.lines().count(), 2);
}

#[test]
fn test_report_stamp_matches_file() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("in.js", b"x").unwrap();

    let output = cache_bust(&env, &["in.js", "out.js"]).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stamp = stdout
        .lines()
        .next()
        .and_then(|l| l.strip_prefix("✓ Cache-bust added: "))
        .unwrap();
    let written = std::fs::read_to_string(env.path("out.js")).unwrap();
    assert_eq!(written, format!("/* BUILD_VERSION: {stamp} */\nx"));
}

#[test]
fn test_in_place() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("renderer.bundle.js.txt", b"a();\nb();")
        .unwrap();

    cache_bust(
        &env,
        &["renderer.bundle.js.txt", "renderer.bundle.js.txt"],
    )
    .assert()
    .success();

    let written = std::fs::read_to_string(env.path("renderer.bundle.js.txt")).unwrap();
    assert!(stamp_line().eval(&written));
    assert!(written.ends_with("*/\na();\nb();"));
}

// ========== Failures ==========

#[test]
fn test_missing_input_fails_without_output() {
    let env = TestEnvironment::new().unwrap();

    cache_bust(&env, &["missing.js", "out.js"])
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::starts_with("❌ Error:").and(predicate::str::contains("missing.js")));

    assert!(!env.path("out.js").exists());
}

#[test]
fn test_missing_input_leaves_existing_output() {
    let env = TestEnvironment::new().unwrap();
    let out = env.create_file("out.js", b"previous build").unwrap();

    cache_bust(&env, &["missing.js", "out.js"]).assert().code(1);

    assert_eq!(std::fs::read(&out).unwrap(), b"previous build");
}

#[test]
fn test_unwritable_output_fails() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("in.js", b"x").unwrap();

    cache_bust(&env, &["in.js", "no/such/dir/out.js"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("❌ Error:"));
}

#[test]
fn test_closed_stdout_exits_cleanly() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("in.js", b"x").unwrap();

    let mut child = cache_bust(&env, &["in.js", "out.js"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    drop(child.stdout.take());
    let output = child.wait_with_output().unwrap();

    // Exit 1 when the report hits the closed pipe; 0 if it was written first.
    // Never a signal.
    let stderr = String::from_utf8_lossy(&output.stderr);
    match output.status.code() {
        Some(0) => {}
        Some(1) => assert!(stderr.starts_with("❌ Error:"), "stderr: {stderr}"),
        other => panic!("unexpected exit {other:?}, stderr: {stderr}"),
    }
    assert!(stamp_line().eval(&std::fs::read_to_string(env.path("out.js")).unwrap()));
}

// ========== Configuration ==========

#[test]
fn test_project_config_label() {
    let env = TestEnvironment::new().unwrap();
    env.write_project_config("[stamp]\nlabel = \"ASSET_REV\"\n")
        .unwrap();
    env.create_file("in.css", b"body {}\n").unwrap();

    cache_bust(&env, &["in.css", "out.css"]).assert().success();

    let written = std::fs::read_to_string(env.path("out.css")).unwrap();
    assert!(written.starts_with("/* ASSET_REV: "));
    assert!(written.ends_with(" */\nbody {}\n"));
}

#[test]
fn test_env_label_overrides_config() {
    let env = TestEnvironment::new().unwrap();
    env.write_global_config("[stamp]\nlabel = \"FROM_HOME\"\n")
        .unwrap();
    env.create_file("in.js", b"x").unwrap();

    cache_bust(&env, &["in.js", "out.js"])
        .env("CACHE_BUST_LABEL", "FROM_ENV")
        .assert()
        .success();

    let written = std::fs::read_to_string(env.path("out.js")).unwrap();
    assert!(written.starts_with("/* FROM_ENV: "));
}

#[test]
fn test_env_label_closing_comment_is_ignored() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("in.js", b"x").unwrap();

    cache_bust(&env, &["in.js", "out.js"])
        .env("CACHE_BUST_LABEL", "A */ evil();\n/* B")
        .assert()
        .success();

    let written = std::fs::read_to_string(env.path("out.js")).unwrap();
    assert!(stamp_line().eval(&written));
    assert_eq!(written.lines().count(), 2);
    assert!(!written.contains("evil"));
}

#[test]
fn test_config_label_closing_comment_falls_back_to_default() {
    let env = TestEnvironment::new().unwrap();
    env.write_project_config("[stamp]\nlabel = \"A */ evil();\"\n")
        .unwrap();
    env.create_file("in.js", b"x").unwrap();

    cache_bust(&env, &["in.js", "out.js"]).assert().success();

    let written = std::fs::read_to_string(env.path("out.js")).unwrap();
    assert!(stamp_line().eval(&written));
    assert!(!written.contains("evil"));
}

#[test]
fn test_broken_config_falls_back_to_defaults() {
    let env = TestEnvironment::new().unwrap();
    env.write_project_config("[stamp\n").unwrap();
    env.create_file("in.js", b"x").unwrap();

    cache_bust(&env, &["in.js", "out.js"]).assert().success();

    let written = std::fs::read_to_string(env.path("out.js")).unwrap();
    assert!(stamp_line().eval(&written));
}
