//! System capabilities.
//!
//! Every external tool the installer drives sits behind a small trait:
//! production implementations shell out, the test suite substitutes
//! in-memory fakes. [`Host`] bundles one implementation of each so the
//! orchestration code takes a single handle.

use std::path::Path;

use crate::error::{InstallError, InstallResult};

pub mod apt;
pub mod certbot;
pub mod command;
pub mod docker;
pub mod nginxctl;
pub mod node;
pub mod systemd;

pub use apt::AptPackageManager;
pub use certbot::CertbotClient;
pub use command::{ShellRunner, require_root};
pub use docker::DockerComposeRuntime;
pub use nginxctl::NginxController;
pub use systemd::SystemdSupervisor;

/// Captured result of an external command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
	pub success: bool,
	pub stdout: String,
	pub stderr: String,
}

impl CommandOutput {
	/// Turn a non-zero exit into [`InstallError::Command`].
	pub fn require_success(self, command: &str) -> InstallResult<CommandOutput> {
		if !self.success {
			let message = if self.stderr.trim().is_empty() {
				"exited with non-zero status".to_string()
			} else {
				self.stderr.trim().to_string()
			};
			return Err(InstallError::command(command, message));
		}
		Ok(self)
	}
}

/// Generic command execution plus `$PATH` lookup.
///
/// Spawn failures are `Err`; a command that runs but exits non-zero is
/// `Ok` with `success == false`, so callers choose between fatal and
/// best-effort handling.
pub trait CommandRunner {
	fn run(&mut self, program: &str, args: &[&str]) -> InstallResult<CommandOutput>;
	fn run_in(&mut self, dir: &Path, program: &str, args: &[&str])
	-> InstallResult<CommandOutput>;
	/// Whether `program` resolves on `$PATH`.
	fn lookup(&mut self, program: &str) -> bool;
}

/// Debian package management.
pub trait PackageManager {
	fn is_installed(&mut self, package: &str) -> InstallResult<bool>;
	fn update_index(&mut self) -> InstallResult<()>;
	fn install(&mut self, packages: &[&str]) -> InstallResult<()>;
	fn remove(&mut self, packages: &[&str]) -> InstallResult<()>;
}

/// systemd unit lifecycle.
pub trait ServiceSupervisor {
	fn write_unit(&mut self, name: &str, content: &str) -> InstallResult<()>;
	/// Enable start-on-boot and start immediately.
	fn enable_now(&mut self, name: &str) -> InstallResult<()>;
	/// Enable start-on-boot without starting (timers).
	fn enable(&mut self, name: &str) -> InstallResult<()>;
	fn restart(&mut self, name: &str) -> InstallResult<()>;
	fn stop_disable(&mut self, name: &str) -> InstallResult<()>;
	fn remove_unit(&mut self, name: &str) -> InstallResult<()>;
	fn is_active(&mut self, name: &str) -> InstallResult<bool>;
	fn unit_exists(&mut self, name: &str) -> InstallResult<bool>;
}

/// Reverse-proxy site management (Nginx).
pub trait ReverseProxyController {
	fn write_site(&mut self, name: &str, content: &str) -> InstallResult<()>;
	/// Enable the site via the `sites-enabled` symlink. Idempotent.
	fn enable_site(&mut self, name: &str) -> InstallResult<()>;
	/// Syntax-check the active configuration.
	///
	/// # Errors
	///
	/// Returns [`InstallError::ProxyValidation`] when the check fails.
	fn validate(&mut self) -> InstallResult<()>;
	fn reload(&mut self) -> InstallResult<()>;
	fn site_exists(&mut self, name: &str) -> InstallResult<bool>;
	fn remove_site(&mut self, name: &str) -> InstallResult<()>;
}

/// ACME certificate lifecycle (certbot).
pub trait CertificateClient {
	fn issue(&mut self, domain: &str, email: &str) -> InstallResult<()>;
	fn revoke(&mut self, domain: &str) -> InstallResult<()>;
	fn certificate_exists(&mut self, domain: &str) -> InstallResult<bool>;
	/// Install the post-renewal hook that reloads the proxy. Idempotent.
	fn install_renewal_hook(&mut self) -> InstallResult<()>;
	fn remove_renewal_hook(&mut self) -> InstallResult<()>;
	fn hook_exists(&mut self) -> InstallResult<bool>;
}

/// Container orchestration (`docker compose`).
pub trait ContainerRuntime {
	fn is_available(&mut self) -> InstallResult<bool>;
	fn compose_up(&mut self, dir: &Path, compose_args: &str) -> InstallResult<()>;
	fn compose_down(
		&mut self,
		dir: &Path,
		compose_args: &str,
		remove_volumes: bool,
	) -> InstallResult<()>;
}

/// One implementation of each capability, bundled.
pub struct Host {
	pub packages: Box<dyn PackageManager>,
	pub services: Box<dyn ServiceSupervisor>,
	pub proxy: Box<dyn ReverseProxyController>,
	pub certificates: Box<dyn CertificateClient>,
	pub containers: Box<dyn ContainerRuntime>,
	pub runner: Box<dyn CommandRunner>,
}

impl Host {
	/// Capabilities backed by the real host tools.
	pub fn live() -> Self {
		Self {
			packages: Box::new(AptPackageManager::new()),
			services: Box::new(SystemdSupervisor::new()),
			proxy: Box::new(NginxController::new()),
			certificates: Box::new(CertbotClient::new()),
			containers: Box::new(DockerComposeRuntime::new()),
			runner: Box::new(ShellRunner),
		}
	}
}
