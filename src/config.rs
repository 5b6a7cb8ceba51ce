//! Typed configuration records for an install run.
//!
//! The installer holds configuration in memory for the duration of a run and
//! serializes it only at defined commit points (the rendered `.env` file).
//! Nothing here reads the filesystem.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// How the application is deployed on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployMode {
	/// Run under `docker compose`, supervised by a oneshot systemd unit.
	Docker,
	/// Run directly with Node.js as a dedicated system user.
	Node,
}

impl DeployMode {
	/// Human-readable label used in prompts and reports.
	pub fn label(&self) -> &'static str {
		match self {
			DeployMode::Docker => "docker",
			DeployMode::Node => "node",
		}
	}
}

/// Which database backend the application uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
	/// Single-file embedded database; no server process.
	Sqlite,
	/// PostgreSQL server, run as a sidecar container in Docker mode.
	Postgres,
}

impl DatabaseBackend {
	/// Value written to the `DB_CLIENT` environment key.
	pub fn db_client(&self) -> &'static str {
		match self {
			DatabaseBackend::Sqlite => "better-sqlite3",
			DatabaseBackend::Postgres => "pg",
		}
	}

	/// Compose-file arguments selecting the variant for this backend.
	pub fn compose_args(&self) -> &'static str {
		match self {
			DatabaseBackend::Sqlite => "-f docker-compose.sqlite.yml",
			DatabaseBackend::Postgres => "-f docker-compose.yml",
		}
	}
}

/// SMTP settings, present only when the operator enables mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailSettings {
	pub host: String,
	pub port: u16,
	pub user: String,
	pub password: String,
	pub from_address: String,
}

/// Everything the installer needs to know, gathered once per run.
///
/// Invariant: `database` is always [`DatabaseBackend::Sqlite`] when `mode` is
/// [`DeployMode::Node`]; the collector enforces this and tells the operator.
#[derive(Debug, Clone, Serialize)]
pub struct InstallConfig {
	/// Public domain the instance is served on, no trailing slash.
	pub domain: String,
	/// Contact email passed to Let's Encrypt.
	pub le_email: String,
	pub mode: DeployMode,
	pub database: DatabaseBackend,
	/// `None` means mail stays disabled.
	pub mail: Option<MailSettings>,
	/// `true` allows public account signup.
	pub allow_registration: bool,
	/// `true` allows link creation without an account.
	pub allow_anonymous_links: bool,
}

/// OIDC block written by the reconfiguration entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OidcConfig {
	/// Issuer URL, trailing slash stripped.
	pub issuer: String,
	pub client_id: String,
	pub client_secret: String,
	pub scope: String,
	pub email_claim: String,
	/// Keep the password login form alongside OIDC.
	pub keep_password_login: bool,
}

impl OidcConfig {
	/// Callback URL the operator must register with the identity provider.
	/// Derived output only; nothing consumes it programmatically.
	pub fn callback_url(&self, domain: &str) -> String {
		format!("https://{domain}/api/auth/oidc/callback")
	}
}

/// Filesystem layout of an installation.
///
/// Only the install root varies (tests point it at a temp directory); every
/// other path is derived from it or fixed by the host conventions.
#[derive(Debug, Clone)]
pub struct InstallLayout {
	pub install_dir: PathBuf,
}

impl Default for InstallLayout {
	fn default() -> Self {
		Self {
			install_dir: PathBuf::from("/opt/kutt"),
		}
	}
}

impl InstallLayout {
	pub fn at(install_dir: impl Into<PathBuf>) -> Self {
		Self {
			install_dir: install_dir.into(),
		}
	}

	/// Path of the persisted environment file.
	pub fn env_path(&self) -> PathBuf {
		self.install_dir.join(".env")
	}

	pub fn install_dir(&self) -> &Path {
		&self.install_dir
	}
}

/// Strip a single trailing slash from operator-supplied URLs and domains.
pub fn strip_trailing_slash(value: &str) -> String {
	value.trim().trim_end_matches('/').to_string()
}
