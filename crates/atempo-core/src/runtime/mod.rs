//! Tool detection and external process execution
//!
//! This module provides:
//! - Docker and installer tool detection
//! - Streaming command execution used by the installer and post-install steps

pub mod check;
pub mod process;

pub use check::{
    check_docker, check_tool, docker_daemon_running, docker_problem, DockerProbe, RuntimeInfo,
    SystemDocker,
};
pub use process::{run_streaming, CommandError, CommandSpec, Stream};
