//! Nginx control: site files, the enable symlink, syntax check, reload.

use std::path::PathBuf;

use crate::error::{InstallError, InstallResult};

use super::{CommandRunner, ReverseProxyController, ShellRunner};

const SITES_AVAILABLE: &str = "/etc/nginx/sites-available";
const SITES_ENABLED: &str = "/etc/nginx/sites-enabled";

/// Reverse-proxy controller shelling out to `nginx` and `systemctl`.
pub struct NginxController {
	runner: ShellRunner,
	sites_available: PathBuf,
	sites_enabled: PathBuf,
}

impl NginxController {
	pub fn new() -> Self {
		Self {
			runner: ShellRunner,
			sites_available: PathBuf::from(SITES_AVAILABLE),
			sites_enabled: PathBuf::from(SITES_ENABLED),
		}
	}

	fn available_path(&self, name: &str) -> PathBuf {
		self.sites_available.join(name)
	}

	fn enabled_path(&self, name: &str) -> PathBuf {
		self.sites_enabled.join(name)
	}
}

impl Default for NginxController {
	fn default() -> Self {
		Self::new()
	}
}

impl ReverseProxyController for NginxController {
	fn write_site(&mut self, name: &str, content: &str) -> InstallResult<()> {
		std::fs::write(self.available_path(name), content)?;
		Ok(())
	}

	fn enable_site(&mut self, name: &str) -> InstallResult<()> {
		let link = self.enabled_path(name);
		if link.exists() {
			return Ok(());
		}
		#[cfg(unix)]
		std::os::unix::fs::symlink(self.available_path(name), link)?;
		Ok(())
	}

	fn validate(&mut self) -> InstallResult<()> {
		let output = self.runner.run("nginx", &["-t"])?;
		if !output.success {
			return Err(InstallError::ProxyValidation {
				message: output.stderr.trim().to_string(),
			});
		}
		Ok(())
	}

	fn reload(&mut self) -> InstallResult<()> {
		self.runner
			.run("systemctl", &["reload", "nginx"])?
			.require_success("systemctl reload nginx")?;
		Ok(())
	}

	fn site_exists(&mut self, name: &str) -> InstallResult<bool> {
		Ok(self.available_path(name).exists())
	}

	fn remove_site(&mut self, name: &str) -> InstallResult<()> {
		let link = self.enabled_path(name);
		// Symlink removal first so a half-removed site is never active.
		if link.symlink_metadata().is_ok() {
			std::fs::remove_file(link)?;
		}
		let available = self.available_path(name);
		if available.exists() {
			std::fs::remove_file(available)?;
		}
		Ok(())
	}
}
