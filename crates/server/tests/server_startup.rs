use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config
fn minimal_config(port: u16, artifact_dir: &std::path::Path) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[fetcher]
binary = "/nonexistent/downloader"

[storage]
artifact_dir = "{}"
"#,
        port,
        artifact_dir.display()
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_tubefetch"))
        .env("TUBEFETCH_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_health_endpoint() {
    let port = get_available_port();
    let artifacts = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, &artifacts.path().join("downloads")));

    let mut server = spawn_server(config.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["artifactCount"], 0);

    // Artifact directory is created on startup
    assert!(artifacts.path().join("downloads").is_dir());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_downloader_reports_spawn_error() {
    let port = get_available_port();
    let artifacts = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, artifacts.path()));

    let mut server = spawn_server(config.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = client
        .post(format!("http://127.0.0.1:{}/download", port))
        .json(&serde_json::json!({ "url": "https://youtu.be/dQw4w9WgXcQ" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 500);
    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["kind"], "SpawnError");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_env_overrides_config_file() {
    let file_port = get_available_port();
    let env_port = get_available_port();
    let artifacts = TempDir::new().unwrap();
    let config = write_config(&minimal_config(file_port, artifacts.path()));

    let mut server = tokio::process::Command::new(env!("CARGO_BIN_EXE_tubefetch"))
        .env("TUBEFETCH_CONFIG", config.path())
        .env("TUBEFETCH_SERVER__PORT", env_port.to_string())
        .env("RUST_LOG", "error")
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server");

    assert!(
        wait_for_server(env_port, 40).await,
        "Server did not start on the overridden port"
    );

    server.kill().await.ok();
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let invalid = r#"
[server]
port = 8080

[storage]
ttl_secs = 10
"#;
    let config = write_config(invalid);

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_tubefetch"))
            .env("TUBEFETCH_CONFIG", config.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_malformed_config_exits_with_error() {
    let config = write_config("[server\nport = ");

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_tubefetch"))
            .env("TUBEFETCH_CONFIG", config.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}
