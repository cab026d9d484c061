mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use regex::Regex;

fn cli(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("mapocket_cli").unwrap();
    cmd.env("MAPOCKET_CLI_SCRIPT", "1")
        .env("MAPOCKET_HOME", home)
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn script_mode_runs_basic_flow() {
    let home = common::temp_home();
    let input = "\
config set color_output off
project new Garden Party --template birthday
budget set \"Garden Party\" Food/Cake 400
expense add \"Garden Party\" 120 Cake --category Food
summary
exit
";
    cli(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Project `Garden Party` created"))
        .stdout(contains("Recorded 120,00 €"))
        .stdout(contains("=== Projects ==="));

    let stored = std::fs::read_to_string(home.join("store").join("mapocket_projects.json"))
        .expect("projects written");
    assert!(stored.contains("\"projectName\": \"Garden Party\""));
}

#[test]
fn data_persists_between_runs() {
    let home = common::temp_home();
    cli(&home)
        .write_stdin("config set color_output off\nwallet new 900 Holidays\n")
        .assert()
        .success();
    cli(&home)
        .write_stdin("wallet list\n")
        .assert()
        .success()
        .stdout(contains("Holidays").and(contains("900,00 €")));
}

#[test]
fn unknown_commands_are_reported_with_a_suggestion() {
    let home = common::temp_home();
    cli(&home)
        .write_stdin("config set color_output off\nprojet list\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `projet`"))
        .stdout(contains("Suggestion: `project`?"));
}

#[test]
fn failing_commands_do_not_abort_the_script() {
    let home = common::temp_home();
    cli(&home)
        .write_stdin(
            "config set color_output off\nproject show Nowhere\nproject new Still Runs\n",
        )
        .assert()
        .success()
        .stdout(contains("Project not found: Nowhere"))
        .stdout(contains("Project `Still Runs` created"));
}

#[test]
fn version_reports_package_and_paths() {
    let home = common::temp_home();
    let output = cli(&home)
        .write_stdin("config set color_output off\nversion\n")
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let header = Regex::new(r"=== MaPocket \d+\.\d+\.\d+ ===").expect("valid version pattern");
    assert!(header.is_match(&stdout), "unexpected output: {}", stdout);
    assert!(stdout.contains(&home.display().to_string()));
}
