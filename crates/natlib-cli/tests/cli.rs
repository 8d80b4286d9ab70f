//! Smoke tests for the platform-token CLI.

use std::process::Command;

fn run(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_natlib"))
        .args(args)
        .output()
        .expect("binary should run");
    assert!(output.status.success(), "exit status: {:?}", output.status);
    String::from_utf8(output.stdout).expect("utf8 stdout")
}

#[test]
fn default_output_is_one_token_pair() {
    let pair = run(&[]);
    let (os, arch) = pair.split_once('/').expect("os/arch separator");
    assert!(!os.is_empty());
    assert!(!arch.is_empty());
    // Bare output, no trailing newline, exactly one separator.
    assert!(!arch.contains('/'));
    assert!(!pair.ends_with('\n'));
}

#[test]
fn os_flag_prints_the_os_token() {
    let pair = run(&[]);
    let os = run(&["--os"]);
    assert!(!os.is_empty());
    assert!(!os.contains('/'));
    assert!(pair.starts_with(&os));
}

#[test]
fn arch_flag_prints_the_arch_token() {
    let pair = run(&[]);
    let arch = run(&["--arch"]);
    assert!(!arch.is_empty());
    assert!(pair.ends_with(&arch));
}

#[test]
fn os_wins_when_both_flags_are_given() {
    assert_eq!(run(&["--os", "--arch"]), run(&["--os"]));
}
