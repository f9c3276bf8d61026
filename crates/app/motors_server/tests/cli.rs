//! Smoke tests for the server binary.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_flags() {
    Command::cargo_bin("motors_server")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--in-memory"))
        .stdout(predicate::str::contains("--database-url"));
}

#[test]
fn refuses_to_start_without_a_signing_key() {
    Command::cargo_bin("motors_server")
        .unwrap()
        .arg("--in-memory")
        .env_remove("ACCESS_TOKEN_SECRET")
        .env_remove("JWT_SECRET")
        .env("BIND_ADDR", "127.0.0.1:0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ACCESS_TOKEN_SECRET"));
}

#[test]
fn rejects_a_bad_token_lifetime() {
    Command::cargo_bin("motors_server")
        .unwrap()
        .arg("--in-memory")
        .env("ACCESS_TOKEN_SECRET", "cli-test-secret")
        .env("TOKEN_TTL", "forever")
        .assert()
        .failure()
        .stderr(predicate::str::contains("forever"));
}

#[test]
fn rejects_a_token_lifetime_past_the_cap() {
    Command::cargo_bin("motors_server")
        .unwrap()
        .arg("--in-memory")
        .env("ACCESS_TOKEN_SECRET", "cli-test-secret")
        .env("TOKEN_TTL", "100000000d")
        .assert()
        .failure()
        .stderr(predicate::str::contains("100000000d"));
}
