//! Debian package management through `apt-get` and `dpkg`.

use super::{CommandOutput, CommandRunner, PackageManager, ShellRunner};
use crate::error::InstallResult;

/// Package manager shelling out to `apt-get`.
///
/// All install calls run non-interactively (`DEBIAN_FRONTEND` is left to the
/// environment; `-y` answers the package prompts).
pub struct AptPackageManager {
	runner: ShellRunner,
}

impl AptPackageManager {
	pub fn new() -> Self {
		Self { runner: ShellRunner }
	}
}

impl Default for AptPackageManager {
	fn default() -> Self {
		Self::new()
	}
}

impl PackageManager for AptPackageManager {
	fn is_installed(&mut self, package: &str) -> InstallResult<bool> {
		// `dpkg -s` exits non-zero for unknown or removed packages.
		let output: CommandOutput = self.runner.run("dpkg", &["-s", package])?;
		Ok(output.success && output.stdout.contains("Status: install ok installed"))
	}

	fn update_index(&mut self) -> InstallResult<()> {
		self.runner
			.run("apt-get", &["update", "-q"])?
			.require_success("apt-get update")?;
		Ok(())
	}

	fn install(&mut self, packages: &[&str]) -> InstallResult<()> {
		let mut args = vec!["install", "-y", "-q"];
		args.extend_from_slice(packages);
		self.runner
			.run("apt-get", &args)?
			.require_success("apt-get install")?;
		Ok(())
	}

	fn remove(&mut self, packages: &[&str]) -> InstallResult<()> {
		let mut args = vec!["remove", "-y", "-q"];
		args.extend_from_slice(packages);
		self.runner
			.run("apt-get", &args)?
			.require_success("apt-get remove")?;
		Ok(())
	}
}
