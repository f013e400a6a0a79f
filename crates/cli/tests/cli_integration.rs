use std::process::Command;

fn argweave() -> Command {
    Command::new(env!("CARGO_BIN_EXE_argweave"))
}

#[test]
fn greet_runs_its_action() {
    let out = argweave()
        .args(["greet", "--name", "Ada"])
        .output()
        .expect("failed to run argweave greet");
    assert!(
        out.status.success(),
        "argweave greet failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains(r#""name": "Ada""#) && stdout.contains("hello, Ada"),
        "unexpected output:\n{stdout}"
    );
}

#[test]
fn serve_defaults_its_port() {
    let out = argweave()
        .arg("serve")
        .output()
        .expect("failed to run argweave serve");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains(r#""port": 8080.0"#) && stdout.contains("serving on port 8080"),
        "unexpected output:\n{stdout}"
    );
}

#[test]
fn missing_required_flag_fails_with_rendered_error() {
    let out = argweave()
        .arg("greet")
        .output()
        .expect("failed to run argweave greet");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("missing required flag --name for 'greet'"),
        "unexpected stderr:\n{stderr}"
    );
}

#[test]
fn unknown_token_fails() {
    let out = argweave()
        .arg("frobnicate")
        .output()
        .expect("failed to run argweave");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("frobnicate"),
        "unexpected stderr:\n{stderr}"
    );
}

#[test]
fn help_prints_grammar_data() {
    let out = argweave()
        .arg("--help")
        .output()
        .expect("failed to run argweave --help");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("help output should be JSON");
    assert_eq!(json["entry"]["name"], "argweave");
    let commands: Vec<&str> = json["commands"]
        .as_array()
        .expect("commands array")
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert!(commands.contains(&"greet") && commands.contains(&"serve"));
}

#[test]
fn subcommand_help_reports_parent() {
    let out = argweave()
        .args(["serve", "--help"])
        .output()
        .expect("failed to run argweave serve --help");
    assert!(out.status.success());
    let json: serde_json::Value =
        serde_json::from_str(&String::from_utf8_lossy(&out.stdout)).expect("JSON help");
    assert_eq!(json["entry"]["name"], "serve");
    assert_eq!(json["parent"]["name"], "argweave");
}
