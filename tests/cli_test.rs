use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn run_command(args: &[&str], test_dir: &str) -> (bool, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_craftpm"))
        .args(args)
        .env("CRAFTPM_DIR", test_dir)
        .env_remove("RUST_LOG")
        .env_remove("GITHUB_TOKEN")
        .output()
        .expect("Failed to execute command");

    let success = output.status.success();
    let stdout = String::from_utf8(output.stdout).unwrap_or_default();
    let stderr = String::from_utf8(output.stderr).unwrap_or_default();

    // Combine stdout and stderr for checking messages
    let combined_output = if stdout.is_empty() {
        stderr
    } else if stderr.is_empty() {
        stdout
    } else {
        format!("{}\n{}", stdout, stderr)
    };

    (success, combined_output)
}

fn setup_test_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

fn write_manifest(test_dir: &str, dependencies: &str) {
    let content = format!(
        "[server]\nimplementation = \"paper\"\nversion = \"1.20.1\"\n\n{}",
        dependencies
    );
    fs::write(format!("{}/craftpm.toml", test_dir), content).unwrap();
}

#[test]
fn test_init_creates_manifest() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output) = run_command(&["init", "--version", "1.21.0"], test_dir);

    assert!(success, "Init command should succeed. output: {}", output);
    assert!(
        output.contains("Initialized craftpm.toml for paper 1.21.0"),
        "Unexpected output: {}",
        output
    );

    let content = fs::read_to_string(format!("{}/craftpm.toml", test_dir)).unwrap();
    assert!(content.contains("[server]"));
    assert!(content.contains("implementation = \"paper\""));
    assert!(content.contains("version = \"1.21.0\""));
}

#[test]
fn test_init_with_mod_server() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output) = run_command(&["init", "--server", "Fabric"], test_dir);

    assert!(success, "output: {}", output);
    let content = fs::read_to_string(format!("{}/craftpm.toml", test_dir)).unwrap();
    assert!(content.contains("implementation = \"fabric\""));
}

#[test]
fn test_init_skips_existing_manifest() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();
    write_manifest(test_dir, "");

    let (success, output) = run_command(&["init", "--version", "1.8.8"], test_dir);

    assert!(success);
    assert!(output.contains("Manifest detected"), "output: {}", output);
    let content = fs::read_to_string(format!("{}/craftpm.toml", test_dir)).unwrap();
    assert!(content.contains("1.20.1"));
}

#[test]
fn test_remove_without_manifest() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output) = run_command(&["remove", "luckperms"], test_dir);

    assert!(!success);
    assert!(output.contains("Run 'craftpm init' first"), "output: {}", output);
}

#[test]
fn test_remove_unknown_dependency() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();
    write_manifest(test_dir, "");

    let (success, output) = run_command(&["remove", "luckperms"], test_dir);

    assert!(!success);
    assert!(
        output.contains("Dependency 'luckperms' not found"),
        "output: {}",
        output
    );
}

#[test]
fn test_remove_deletes_record_and_file() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();
    write_manifest(
        test_dir,
        r#"[dependencies.luckperms]
source = "modrinth"
id = "Vebnzrzj"
version = "5.4.0"
file_name = "LuckPerms-5.4.0.jar"
"#,
    );
    fs::create_dir_all(format!("{}/plugins", test_dir)).unwrap();
    fs::write(format!("{}/plugins/LuckPerms-5.4.0.jar", test_dir), b"jar").unwrap();

    let (success, output) = run_command(&["remove", "luckperms"], test_dir);

    assert!(success, "output: {}", output);
    assert!(output.contains("Removed luckperms"));
    assert!(!Path::new(&format!("{}/plugins/LuckPerms-5.4.0.jar", test_dir)).exists());
    let content = fs::read_to_string(format!("{}/craftpm.toml", test_dir)).unwrap();
    assert!(!content.contains("luckperms"));
}

#[test]
fn test_outdated_without_dependencies() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();
    write_manifest(test_dir, "");

    let (success, output) = run_command(&["outdated"], test_dir);

    assert!(success, "output: {}", output);
    assert!(output.contains("No dependencies installed"));
}

#[test]
fn test_outdated_skips_local_files() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();
    write_manifest(
        test_dir,
        r#"[dependencies.custom]
source = "filesystem"
id = "Custom.jar"
version = "1.0"
"#,
    );

    let (success, output) = run_command(&["outdated", "--safe"], test_dir);

    assert!(success, "output: {}", output);
    assert!(
        output.contains("custom skipped: not managed by a remote repository"),
        "output: {}",
        output
    );
    assert!(output.contains("Everything is up to date"));
}

#[test]
fn test_update_dry_run_makes_no_changes() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();
    write_manifest(
        test_dir,
        r#"[dependencies.custom]
source = "filesystem"
id = "Custom.jar"
"#,
    );
    let before = fs::read_to_string(format!("{}/craftpm.toml", test_dir)).unwrap();

    let (success, output) = run_command(&["update", "--dry-run"], test_dir);

    assert!(success, "output: {}", output);
    assert!(output.contains("[DRY RUN] No changes made"), "output: {}", output);
    let after = fs::read_to_string(format!("{}/craftpm.toml", test_dir)).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_add_requires_manifest() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();

    let (success, output) = run_command(&["add", "modrinth:luckperms"], test_dir);

    assert!(!success);
    assert!(output.contains("Run 'craftpm init' first"), "output: {}", output);
}

#[test]
fn test_add_rejects_empty_spec() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();
    write_manifest(test_dir, "");

    let (success, output) = run_command(&["add", ""], test_dir);

    assert!(!success);
    assert!(output.contains("Nothing to look up"), "output: {}", output);
}

#[test]
fn test_repos_lists_builtin_and_configured() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();
    fs::write(
        format!("{}/repositories.toml", test_dir),
        r#"
[[repository]]
id = "acme"
name = "Acme Plugins"
base_url = "https://repo.example"

[repository.endpoints]
search = "/search?q={{query}}"
resource = "/plugins/{{id}}"
latest = "/plugins/{{id}}/latest"
"#,
    )
    .unwrap();

    let (success, output) = run_command(&["repos"], test_dir);

    assert!(success, "output: {}", output);
    for id in ["modrinth", "spigot", "github", "acme"] {
        assert!(output.contains(id), "missing {} in: {}", id, output);
    }
    assert!(output.contains("Acme Plugins"));
}

#[test]
fn test_invalid_repository_config() {
    let temp_dir = setup_test_dir();
    let test_dir = temp_dir.path().to_str().unwrap();
    fs::write(format!("{}/repositories.toml", test_dir), "[settings\n").unwrap();

    let (success, output) = run_command(&["repos"], test_dir);

    assert!(!success);
    assert!(output.contains("Failed to parse"), "output: {}", output);
}
