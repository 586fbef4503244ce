//! Integration tests for the vaultkeep CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`. Every
//! command runs against a throwaway `--home` and takes its passphrase from
//! `VAULTKEEP_PASSWORD`, so nothing prompts. Each unlock pays the full KDF
//! cost, which keeps this suite deliberately small.

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;

const PASSPHRASE: &str = "correct horse battery";

/// Helper: a vaultkeep command rooted in `home` with the passphrase set.
fn vaultkeep(home: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("vaultkeep").expect("binary should exist");
    cmd.arg("--home")
        .arg(home.path())
        .env("VAULTKEEP_PASSWORD", PASSPHRASE)
        .env_remove("VAULTKEEP_LOG");
    cmd
}

/// Create a vault named `name` in `home`.
fn create_vault(home: &TempDir, name: &str) {
    vaultkeep(home)
        .args(["vault", "create", name])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Vault '{name}' created")));
}

/// Pull the short id out of an "Added ... (abcd1234)" line.
fn added_id(stdout: &[u8]) -> String {
    let text = String::from_utf8_lossy(stdout);
    let open = text.rfind('(').expect("id in output");
    text[open + 1..open + 9].to_string()
}

#[test]
fn help_flag_shows_usage() {
    #[allow(deprecated)]
    Command::cargo_bin("vaultkeep")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Local encrypted vault"))
        .stdout(predicate::str::contains("vault"))
        .stdout(predicate::str::contains("password"))
        .stdout(predicate::str::contains("totp"))
        .stdout(predicate::str::contains("note"))
        .stdout(predicate::str::contains("file"))
        .stdout(predicate::str::contains("category"));
}

#[test]
fn version_flag_shows_version() {
    #[allow(deprecated)]
    Command::cargo_bin("vaultkeep")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vaultkeep"));
}

#[test]
fn no_args_shows_help() {
    #[allow(deprecated)]
    Command::cargo_bin("vaultkeep")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn completions_are_generated() {
    #[allow(deprecated)]
    Command::cargo_bin("vaultkeep")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vaultkeep"));
}

#[test]
fn commands_without_a_vault_fail_cleanly() {
    let home = TempDir::new().unwrap();
    vaultkeep(&home)
        .args(["password", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No active vault"));
}

#[test]
fn short_passphrase_is_rejected_on_create() {
    let home = TempDir::new().unwrap();
    vaultkeep(&home)
        .env("VAULTKEEP_PASSWORD", "short")
        .args(["vault", "create", "personal"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8 characters"));
    assert!(!home.path().join("vaults").join("personal.vault").exists());
}

#[test]
fn invalid_vault_name_is_rejected() {
    let home = TempDir::new().unwrap();
    vaultkeep(&home)
        .args(["vault", "create", "Bad Name"])
        .assert()
        .failure();
}

#[test]
fn create_list_and_select_vaults() {
    let home = TempDir::new().unwrap();
    create_vault(&home, "personal");
    assert!(home.path().join("vaults").join("personal.vault").exists());
    assert!(home.path().join("config.toml").exists());

    vaultkeep(&home)
        .args(["vault", "create", "personal"])
        .assert()
        .failure();

    vaultkeep(&home)
        .args(["vault", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("personal"));

    vaultkeep(&home)
        .args(["vault", "use", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not registered"));
}

#[test]
fn password_add_show_and_wrong_passphrase() {
    let home = TempDir::new().unwrap();
    create_vault(&home, "personal");

    let added = vaultkeep(&home)
        .args([
            "password", "add", "GitHub", "-u", "octocat", "-p", "hunter2hunter2", "-c", "Work",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added password 'GitHub'"));
    let id = added_id(&added.get_output().stdout);

    vaultkeep(&home)
        .args(["password", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("octocat"))
        .stdout(predicate::str::contains("hunter2hunter2").not());

    vaultkeep(&home)
        .args(["password", "show", &id, "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2hunter2"));

    vaultkeep(&home)
        .env("VAULTKEEP_PASSWORD", "not the passphrase")
        .args(["password", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication failed"));
}

#[test]
fn unknown_category_is_reported() {
    let home = TempDir::new().unwrap();
    create_vault(&home, "personal");

    vaultkeep(&home)
        .args(["note", "add", "trip", "--content", "passport in drawer", "-c", "Travel"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Travel"));

    vaultkeep(&home)
        .args(["category", "add", "Travel"])
        .assert()
        .success();

    vaultkeep(&home)
        .args(["note", "add", "trip", "--content", "passport in drawer", "-c", "Travel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added note 'trip'"));
}

#[test]
fn totp_code_from_uri() {
    let home = TempDir::new().unwrap();
    create_vault(&home, "personal");

    let added = vaultkeep(&home)
        .args([
            "totp",
            "add",
            "otpauth://totp/Example:alice?secret=JBSWY3DPEHPK3PXP&issuer=Example",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 2FA entry"));
    let id = added_id(&added.get_output().stdout);

    vaultkeep(&home)
        .args(["totp", "uri", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("otpauth://totp/Example:alice?secret=JBSWY3DPEHPK3PXP"));
}

#[test]
fn config_set_and_show() {
    let home = TempDir::new().unwrap();

    vaultkeep(&home)
        .args(["config", "set", "clipboard_clear_seconds", "42"])
        .assert()
        .success();

    vaultkeep(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("42"));

    vaultkeep(&home)
        .args(["config", "set", "clipboard_clear_seconds", "0"])
        .assert()
        .failure();

    vaultkeep(&home)
        .args(["config", "set", "no_such_key", "1"])
        .assert()
        .failure();
}

#[test]
fn totp_edit_changes_parameters_and_rejects_bad_digits() {
    let home = TempDir::new().unwrap();
    create_vault(&home, "personal");

    let added = vaultkeep(&home)
        .args([
            "totp",
            "add",
            "otpauth://totp/Old:alice?secret=JBSWY3DPEHPK3PXP&issuer=Old",
        ])
        .assert()
        .success();
    let id = added_id(&added.get_output().stdout);

    vaultkeep(&home)
        .args(["totp", "edit", &id, "--period", "60", "--issuer", "New"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Updated 2FA entry {id}")));

    vaultkeep(&home)
        .args(["totp", "edit", &id, "--digits", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("digits"));

    vaultkeep(&home)
        .args(["totp", "uri", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("issuer=New"))
        .stdout(predicate::str::contains("digits=6"))
        .stdout(predicate::str::contains("period=60"));
}

#[test]
fn vault_with_missing_container_can_still_be_deleted() {
    let home = TempDir::new().unwrap();
    create_vault(&home, "gone");
    std::fs::remove_file(home.path().join("vaults").join("gone.vault")).unwrap();

    vaultkeep(&home)
        .args(["vault", "delete", "gone", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted vault 'gone'"));

    vaultkeep(&home)
        .args(["vault", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gone").not());
}

#[test]
fn keep_files_unregisters_without_the_passphrase() {
    let home = TempDir::new().unwrap();
    create_vault(&home, "old");

    vaultkeep(&home)
        .env("VAULTKEEP_PASSWORD", "forgotten long ago")
        .args(["vault", "delete", "old", "--force", "--keep-files"])
        .assert()
        .success();
    assert!(!home.path().join("vaults").join("old.vault").exists());

    vaultkeep(&home)
        .args(["vault", "use", "old"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not registered"));
}
