use anyhow::{anyhow, bail, Context, Result};
use std::process::Command;
use std::time::Duration;

const QDRANT_CONTAINER_NAME: &str = "rag-mcp-qdrant";
// Named volume so the collection survives container removal.
const QDRANT_STORAGE_VOLUME: &str = "rag-mcp-qdrant-storage:/qdrant/storage";
const HEALTH_CHECK_RETRIES: u32 = 10;

/// Makes sure a Qdrant instance answers at `health_url`, starting a local
/// container through Docker if nothing is listening yet.
pub async fn ensure_qdrant_via_docker(health_url: String) -> Result<()> {
    tokio::task::spawn_blocking(move || ensure_qdrant_sync(&health_url))
        .await
        .context("Failed to execute blocking task")?
}

/// REST health endpoint for a Qdrant gRPC url (`:6334` → `:6333/collections`).
pub fn health_url_for(grpc_url: &str) -> String {
    let base = grpc_url.trim_end_matches('/');
    let base = base.strip_suffix(":6334").map(|b| format!("{b}:6333")).unwrap_or_else(|| base.to_string());
    format!("{base}/collections")
}

fn is_healthy(health_url: &str) -> bool {
    matches!(
        ureq::get(health_url).timeout(Duration::from_secs(2)).call(),
        Ok(resp) if resp.status() == 200
    )
}

fn ensure_qdrant_sync(health_url: &str) -> Result<()> {
    if is_healthy(health_url) {
        log::info!("Qdrant is already reachable at {}.", health_url);
        return Ok(());
    }

    Command::new("docker")
        .arg("--version")
        .output()
        .context("Docker is not installed or not runnable")?;
    log::info!("Docker found.");

    log::info!("Checking for Qdrant container: {}", QDRANT_CONTAINER_NAME);
    let ps = Command::new("docker")
        .args(["ps", "-a", "--filter", &format!("name={}", QDRANT_CONTAINER_NAME), "--format", "{{.Status}}"])
        .output()
        .context("Failed to execute docker ps")?;
    if !ps.status.success() {
        bail!("Failed to check container status: {}", String::from_utf8_lossy(&ps.stderr));
    }

    let ps_stdout = String::from_utf8_lossy(&ps.stdout);
    log::debug!("docker ps output: {}", ps_stdout);

    if ps_stdout.contains("Up") {
        log::info!("Qdrant container '{}' is already running.", QDRANT_CONTAINER_NAME);
    } else if !ps_stdout.trim().is_empty() {
        log::info!("Qdrant container '{}' exists but is not running. Starting it...", QDRANT_CONTAINER_NAME);
        let start = Command::new("docker")
            .args(["start", QDRANT_CONTAINER_NAME])
            .output()
            .context("Failed to execute docker start")?;
        if !start.status.success() {
            bail!(
                "Failed to start existing Qdrant container '{}': {}",
                QDRANT_CONTAINER_NAME,
                String::from_utf8_lossy(&start.stderr)
            );
        }
    } else {
        log::info!("Qdrant container '{}' not found. Creating and starting new container...", QDRANT_CONTAINER_NAME);
        let run = Command::new("docker")
            .args([
                "run",
                "-d",
                "--name",
                QDRANT_CONTAINER_NAME,
                "-p",
                "6333:6333",
                "-p",
                "6334:6334",
                "-v",
                QDRANT_STORAGE_VOLUME,
                "qdrant/qdrant",
            ])
            .output()
            .context("Failed to execute docker run")?;
        if !run.status.success() {
            bail!(
                "Failed to start new Qdrant container '{}': {}",
                QDRANT_CONTAINER_NAME,
                String::from_utf8_lossy(&run.stderr)
            );
        }
        log::info!("Qdrant container '{}' created and started.", QDRANT_CONTAINER_NAME);
    }

    log::info!("Performing health check on Qdrant...");
    for i in 1..=HEALTH_CHECK_RETRIES {
        if is_healthy(health_url) {
            log::info!("Qdrant is running and connected!");
            return Ok(());
        }
        log::warn!("Qdrant not ready yet. Waiting... (Retry {}/{})", i, HEALTH_CHECK_RETRIES);
        std::thread::sleep(Duration::from_secs(3));
    }
    Err(anyhow!(
        "Failed to connect to Qdrant at {} after retries. Check Docker container logs and network settings.",
        health_url
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_url_for_grpc_port() {
        assert_eq!(health_url_for("http://localhost:6334"), "http://localhost:6333/collections");
        assert_eq!(health_url_for("http://qdrant:6334/"), "http://qdrant:6333/collections");
        assert_eq!(health_url_for("http://qdrant.internal"), "http://qdrant.internal/collections");
    }
}
