//! Let's Encrypt certificate lifecycle through `certbot`.

use std::path::{Path, PathBuf};

use crate::error::{InstallError, InstallResult};

use super::{CertificateClient, CommandRunner, ShellRunner};

/// Deploy hook installed for automatic renewal: certbot runs everything in
/// this directory after each successful renewal.
const RENEWAL_HOOK_PATH: &str = "/etc/letsencrypt/renewal-hooks/deploy/kutt-reload-nginx.sh";

/// Hook body. Reloading is safe to repeat on every renewal.
const RENEWAL_HOOK: &str = "#!/bin/sh\nsystemctl reload nginx\n";

/// Certificate client shelling out to `certbot`.
pub struct CertbotClient {
	runner: ShellRunner,
	hook_path: PathBuf,
}

impl CertbotClient {
	pub fn new() -> Self {
		Self {
			runner: ShellRunner,
			hook_path: PathBuf::from(RENEWAL_HOOK_PATH),
		}
	}
}

impl Default for CertbotClient {
	fn default() -> Self {
		Self::new()
	}
}

impl CertificateClient for CertbotClient {
	fn issue(&mut self, domain: &str, email: &str) -> InstallResult<()> {
		// Webroot challenge: the phase-1 HTTP site must already serve the
		// ACME path. `--agree-tos` and `--non-interactive` are the
		// documented defaults of this tool, not silent behavior.
		let output = self.runner.run(
			"certbot",
			&[
				"certonly",
				"--webroot",
				"-w",
				crate::ACME_WEBROOT,
				"-d",
				domain,
				"--email",
				email,
				"--agree-tos",
				"--no-eff-email",
				"--non-interactive",
			],
		)?;
		if !output.success {
			return Err(InstallError::Certificate {
				domain: domain.to_string(),
				message: output.stderr.trim().to_string(),
			});
		}
		Ok(())
	}

	fn revoke(&mut self, domain: &str) -> InstallResult<()> {
		let output = self.runner.run(
			"certbot",
			&[
				"revoke",
				"--cert-name",
				domain,
				"--delete-after-revoke",
				"--non-interactive",
			],
		)?;
		if !output.success {
			return Err(InstallError::Certificate {
				domain: domain.to_string(),
				message: output.stderr.trim().to_string(),
			});
		}
		Ok(())
	}

	fn certificate_exists(&mut self, domain: &str) -> InstallResult<bool> {
		Ok(Path::new(&crate::nginx::live_cert_dir(domain)).exists())
	}

	fn install_renewal_hook(&mut self) -> InstallResult<()> {
		if let Some(parent) = self.hook_path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&self.hook_path, RENEWAL_HOOK)?;
		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			std::fs::set_permissions(&self.hook_path, std::fs::Permissions::from_mode(0o755))?;
		}
		Ok(())
	}

	fn remove_renewal_hook(&mut self) -> InstallResult<()> {
		if self.hook_path.exists() {
			std::fs::remove_file(&self.hook_path)?;
		}
		Ok(())
	}

	fn hook_exists(&mut self) -> InstallResult<bool> {
		Ok(self.hook_path.exists())
	}
}
