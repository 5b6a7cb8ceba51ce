//! Container orchestration through `docker compose`.

use std::path::Path;

use crate::error::InstallResult;

use super::{CommandRunner, ContainerRuntime, ShellRunner};

/// Container runtime shelling out to the `docker` CLI with the compose
/// plugin.
pub struct DockerComposeRuntime {
	runner: ShellRunner,
}

impl DockerComposeRuntime {
	pub fn new() -> Self {
		Self { runner: ShellRunner }
	}
}

impl Default for DockerComposeRuntime {
	fn default() -> Self {
		Self::new()
	}
}

/// Split a compose-file argument string (`-f docker-compose.yml`) into argv
/// entries. The strings come from [`crate::config::DatabaseBackend`], never
/// from operator input, so whitespace splitting is sufficient.
fn split_compose_args(compose_args: &str) -> Vec<&str> {
	compose_args.split_whitespace().collect()
}

impl ContainerRuntime for DockerComposeRuntime {
	fn is_available(&mut self) -> InstallResult<bool> {
		if !self.runner.lookup("docker") {
			return Ok(false);
		}
		// The compose plugin ships separately from the engine.
		let output = self.runner.run("docker", &["compose", "version"])?;
		Ok(output.success)
	}

	fn compose_up(&mut self, dir: &Path, compose_args: &str) -> InstallResult<()> {
		let mut args = vec!["compose"];
		args.extend(split_compose_args(compose_args));
		args.extend(["up", "-d"]);
		self.runner
			.run_in(dir, "docker", &args)?
			.require_success("docker compose up")?;
		Ok(())
	}

	fn compose_down(
		&mut self,
		dir: &Path,
		compose_args: &str,
		remove_volumes: bool,
	) -> InstallResult<()> {
		let mut args = vec!["compose"];
		args.extend(split_compose_args(compose_args));
		args.push("down");
		if remove_volumes {
			args.push("--volumes");
		}
		self.runner
			.run_in(dir, "docker", &args)?
			.require_success("docker compose down")?;
		Ok(())
	}
}
