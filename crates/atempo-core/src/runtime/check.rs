//! Tool detection for installers and local services

use super::process;
use async_trait::async_trait;
use std::process::Command;

/// Tool detection result
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub name: String,
    pub version: Option<String>,
    pub available: bool,
}

/// Check whether a CLI tool is on PATH by asking for its version
pub fn check_tool(program: &str) -> RuntimeInfo {
    let output = Command::new(program).arg("--version").output();

    match output {
        Ok(out) if out.status.success() => {
            let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
            RuntimeInfo {
                name: program.to_string(),
                version: Some(version),
                available: true,
            }
        }
        _ => RuntimeInfo {
            name: program.to_string(),
            version: None,
            available: false,
        },
    }
}

/// Check if the Docker CLI is installed
pub fn check_docker() -> RuntimeInfo {
    check_tool("docker")
}

/// Check if a Docker daemon answers `docker info`
pub async fn docker_daemon_running() -> bool {
    process::succeeds("docker", &["info"]).await
}

/// Describe why Docker cannot be used, or None when it is ready
pub async fn docker_problem() -> Option<String> {
    let docker = check_docker();
    if !docker.available {
        return Some("the docker CLI was not found on PATH (install from https://docs.docker.com/get-docker/)".to_string());
    }
    if !docker_daemon_running().await {
        return Some("the Docker daemon is not running (`docker info` failed)".to_string());
    }
    tracing::debug!(version = docker.version.as_deref().unwrap_or("unknown"), "docker available");
    None
}

/// Decides whether Docker can be used for installers and local services
#[async_trait]
pub trait DockerProbe: Send + Sync {
    /// Why Docker cannot be used, or None when it is ready
    async fn problem(&self) -> Option<String>;
}

/// Probes the Docker CLI and daemon on this machine
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDocker;

#[async_trait]
impl DockerProbe for SystemDocker {
    async fn problem(&self) -> Option<String> {
        docker_problem().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_unavailable() {
        let info = check_tool("atempo-definitely-missing-binary");
        assert!(!info.available);
        assert!(info.version.is_none());
        assert_eq!(info.name, "atempo-definitely-missing-binary");
    }
}
