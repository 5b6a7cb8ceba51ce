//! Dependency provisioning.
//!
//! Every system dependency is check-then-install: presence is probed first
//! and installation only happens when the probe fails, so re-running the
//! installer on a provisioned host is a no-op. Which branch was taken is
//! printed either way.

use colored::Colorize;

use crate::config::DeployMode;
use crate::error::{InstallError, InstallResult};
use crate::system::Host;
use crate::system::node::{NODESOURCE_SETUP_URL, major_satisfies, parse_node_version};

/// Print the already-present branch.
fn log_present(what: &str) {
	println!("{} {what} already installed", "✓".green());
}

/// Print the newly-installed branch.
fn log_installed(what: &str) {
	println!("{} installed {what}", "+".green());
}

/// Install `package` unless `tool` already resolves on `$PATH`.
fn ensure_tool(host: &mut Host, tool: &str, package: &str) -> InstallResult<()> {
	if host.runner.lookup(tool) {
		log_present(tool);
		return Ok(());
	}
	host.packages.install(&[package])?;
	log_installed(package);
	Ok(())
}

/// Provision everything the chosen deployment mode needs.
///
/// # Errors
///
/// Any package installation or runtime setup failure is fatal; nothing is
/// rolled back.
pub fn provision(host: &mut Host, mode: DeployMode) -> InstallResult<()> {
	host.packages.update_index()?;

	ensure_tool(host, "nginx", "nginx")?;
	ensure_tool(host, "certbot", "certbot")?;
	ensure_tool(host, "ufw", "ufw")?;
	ensure_tool(host, "git", "git")?;

	match mode {
		DeployMode::Docker => provision_docker(host)?,
		DeployMode::Node => provision_node(host)?,
	}

	provision_firewall(host)?;
	Ok(())
}

/// Ensure the Docker engine and the compose plugin are present.
fn provision_docker(host: &mut Host) -> InstallResult<()> {
	if host.containers.is_available()? {
		log_present("docker (with compose plugin)");
		return Ok(());
	}
	host.packages.install(&["docker.io", "docker-compose-v2"])?;
	if !host.containers.is_available()? {
		return Err(InstallError::Precondition {
			message: "docker compose is still unavailable after installation".to_string(),
		});
	}
	host.services.enable_now("docker")?;
	log_installed("docker.io docker-compose-v2");
	Ok(())
}

/// Ensure Node.js at or above the minimum major version.
///
/// An older runtime is upgraded through the NodeSource repository rather
/// than rejected outright; the gate never silently accepts a version below
/// the threshold.
fn provision_node(host: &mut Host) -> InstallResult<()> {
	if host.runner.lookup("node") {
		let output = host.runner.run("node", &["--version"])?;
		if output.success {
			let version = parse_node_version(&output.stdout)?;
			if major_satisfies(version, crate::NODE_MIN_MAJOR) {
				log_present(&format!("node v{}.{}.{}", version.0, version.1, version.2));
				return Ok(());
			}
			println!(
				"{} node v{}.{}.{} is below the required major version {}, upgrading",
				"!".yellow(),
				version.0,
				version.1,
				version.2,
				crate::NODE_MIN_MAJOR
			);
		}
	}

	let setup = format!("curl -fsSL {NODESOURCE_SETUP_URL} | bash -");
	host.runner
		.run("bash", &["-c", &setup])?
		.require_success("nodesource setup")?;
	host.packages.install(&["nodejs"])?;

	// Re-probe: the gate must hold after installation too.
	let output = host
		.runner
		.run("node", &["--version"])?
		.require_success("node --version")?;
	let version = parse_node_version(&output.stdout)?;
	if !major_satisfies(version, crate::NODE_MIN_MAJOR) {
		return Err(InstallError::Precondition {
			message: format!(
				"node v{}.{}.{} still below required major {}",
				version.0,
				version.1,
				version.2,
				crate::NODE_MIN_MAJOR
			),
		});
	}
	log_installed("nodejs");
	Ok(())
}

/// Open the firewall for SSH and the proxy. `ufw allow` is idempotent.
fn provision_firewall(host: &mut Host) -> InstallResult<()> {
	host.runner
		.run("ufw", &["allow", "OpenSSH"])?
		.require_success("ufw allow OpenSSH")?;
	host.runner
		.run("ufw", &["allow", "Nginx Full"])?
		.require_success("ufw allow 'Nginx Full'")?;
	Ok(())
}
