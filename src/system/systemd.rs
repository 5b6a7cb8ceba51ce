//! systemd unit management through `systemctl`.

use std::path::PathBuf;

use super::{CommandRunner, ServiceSupervisor, ShellRunner};
use crate::error::InstallResult;

/// Directory units are written to.
const UNIT_DIR: &str = "/etc/systemd/system";

/// Service supervisor shelling out to `systemctl`.
pub struct SystemdSupervisor {
	runner: ShellRunner,
	unit_dir: PathBuf,
}

impl SystemdSupervisor {
	pub fn new() -> Self {
		Self {
			runner: ShellRunner,
			unit_dir: PathBuf::from(UNIT_DIR),
		}
	}

	fn unit_path(&self, name: &str) -> PathBuf {
		self.unit_dir.join(name)
	}

	fn daemon_reload(&mut self) -> InstallResult<()> {
		self.runner
			.run("systemctl", &["daemon-reload"])?
			.require_success("systemctl daemon-reload")?;
		Ok(())
	}
}

impl Default for SystemdSupervisor {
	fn default() -> Self {
		Self::new()
	}
}

impl ServiceSupervisor for SystemdSupervisor {
	fn write_unit(&mut self, name: &str, content: &str) -> InstallResult<()> {
		std::fs::write(self.unit_path(name), content)?;
		self.daemon_reload()
	}

	fn enable_now(&mut self, name: &str) -> InstallResult<()> {
		self.runner
			.run("systemctl", &["enable", "--now", name])?
			.require_success("systemctl enable --now")?;
		Ok(())
	}

	fn enable(&mut self, name: &str) -> InstallResult<()> {
		self.runner
			.run("systemctl", &["enable", name])?
			.require_success("systemctl enable")?;
		Ok(())
	}

	fn restart(&mut self, name: &str) -> InstallResult<()> {
		self.runner
			.run("systemctl", &["restart", name])?
			.require_success("systemctl restart")?;
		Ok(())
	}

	fn stop_disable(&mut self, name: &str) -> InstallResult<()> {
		self.runner
			.run("systemctl", &["disable", "--now", name])?
			.require_success("systemctl disable --now")?;
		Ok(())
	}

	fn remove_unit(&mut self, name: &str) -> InstallResult<()> {
		let path = self.unit_path(name);
		if path.exists() {
			std::fs::remove_file(path)?;
		}
		self.daemon_reload()
	}

	fn is_active(&mut self, name: &str) -> InstallResult<bool> {
		// Exit status is the answer; `--quiet` suppresses output.
		let output = self.runner.run("systemctl", &["is-active", "--quiet", name])?;
		Ok(output.success)
	}

	fn unit_exists(&mut self, name: &str) -> InstallResult<bool> {
		Ok(self.unit_path(name).exists())
	}
}
