//! The persisted environment file.
//!
//! The `.env` artifact is the only durable form of an install run's
//! configuration: newline-delimited `KEY=value` pairs, `#` comments, owner
//! read-write only. Rendering is pure (records in, text out); writing sets
//! permissions; reading back returns a typed [`EnvFile`] so that
//! "detect existing config" is an explicit parse, not ambient lookup.

use std::path::Path;

use crate::config::{DatabaseBackend, InstallConfig, OidcConfig};
use crate::error::InstallResult;
use crate::secrets::Secrets;

/// Env keys owned by the OIDC block, removed before every rewrite.
pub const OIDC_KEYS: [&str; 7] = [
	"OIDC_ENABLED",
	"OIDC_ISSUER",
	"OIDC_CLIENT_ID",
	"OIDC_CLIENT_SECRET",
	"OIDC_SCOPE",
	"OIDC_EMAIL_CLAIM",
	"DISALLOW_LOGIN_FORM",
];

/// Render the full environment file for a fresh install.
pub fn render_env(config: &InstallConfig, secrets: &Secrets) -> String {
	let mut lines: Vec<String> = Vec::new();
	lines.push("# Kutt server configuration".to_string());
	lines.push("# Generated by kutt-install; edits are preserved until the next reinstall.".to_string());
	lines.push(String::new());

	lines.push("SITE_NAME=Kutt".to_string());
	lines.push(format!("DEFAULT_DOMAIN={}", config.domain));
	lines.push("LINK_LENGTH=6".to_string());
	lines.push(format!("PORT={}", crate::APP_PORT));
	lines.push(format!("JWT_SECRET={}", secrets.jwt_secret));
	lines.push(String::new());

	lines.push(format!("DB_CLIENT={}", config.database.db_client()));
	match config.database {
		DatabaseBackend::Postgres => {
			lines.push("DB_HOST=postgres".to_string());
			lines.push("DB_PORT=5432".to_string());
			lines.push("DB_NAME=kutt".to_string());
			lines.push("DB_USER=kutt".to_string());
			lines.push(format!("DB_PASSWORD={}", secrets.db_password));
		}
		DatabaseBackend::Sqlite => {
			lines.push("DB_FILENAME=db/data".to_string());
		}
	}
	lines.push(String::new());

	match &config.mail {
		Some(mail) => {
			lines.push("MAIL_ENABLED=true".to_string());
			lines.push(format!("MAIL_HOST={}", mail.host));
			lines.push(format!("MAIL_PORT={}", mail.port));
			lines.push(format!("MAIL_USER={}", mail.user));
			lines.push(format!("MAIL_PASSWORD={}", mail.password));
			lines.push(format!("MAIL_FROM={}", mail.from_address));
		}
		None => lines.push("MAIL_ENABLED=false".to_string()),
	}
	lines.push(String::new());

	lines.push(format!(
		"DISALLOW_REGISTRATION={}",
		!config.allow_registration
	));
	lines.push(format!(
		"DISALLOW_ANONYMOUS_LINKS={}",
		!config.allow_anonymous_links
	));

	let mut out = lines.join("\n");
	out.push('\n');
	out
}

/// Render the OIDC block as `(key, value)` pairs, one per entry of
/// [`OIDC_KEYS`] in that order.
pub fn render_oidc_block(oidc: &OidcConfig) -> Vec<(String, String)> {
	let values = [
		"true".to_string(),
		oidc.issuer.clone(),
		oidc.client_id.clone(),
		oidc.client_secret.clone(),
		oidc.scope.clone(),
		oidc.email_claim.clone(),
		(!oidc.keep_password_login).to_string(),
	];
	OIDC_KEYS
		.iter()
		.map(|key| (*key).to_string())
		.zip(values)
		.collect()
}

/// Remove every line assigning one of `keys`, then append the new pairs.
///
/// This is how rewrites stay duplicate-free: a key is deleted wherever it
/// appears before its replacement is appended, so re-running a
/// reconfiguration leaves exactly one line per key.
pub fn upsert_keys(content: &str, pairs: &[(String, String)]) -> String {
	let mut kept: Vec<&str> = content
		.lines()
		.filter(|line| {
			let trimmed = line.trim_start();
			!pairs.iter().any(|(key, _)| {
				trimmed
					.strip_prefix(key.as_str())
					.is_some_and(|rest| rest.starts_with('='))
			})
		})
		.collect();

	// Drop trailing blank lines so the appended block sits flush.
	while kept.last().is_some_and(|line| line.trim().is_empty()) {
		kept.pop();
	}

	let mut out = kept.join("\n");
	if !out.is_empty() {
		out.push('\n');
	}
	out.push('\n');
	for (key, value) in pairs {
		out.push_str(&format!("{key}={value}\n"));
	}
	out
}

/// Write the environment file with owner-only permissions.
///
/// # Errors
///
/// Returns [`crate::error::InstallError::Io`] if directory creation, the
/// write, or the permission change fails.
pub fn write_env(path: &Path, content: &str) -> InstallResult<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, content)?;
	#[cfg(unix)]
	{
		use std::os::unix::fs::PermissionsExt;
		std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
	}
	Ok(())
}

/// Parsed view of an environment file.
#[derive(Debug, Clone)]
pub struct EnvFile {
	raw: String,
	entries: Vec<(String, String)>,
}

impl EnvFile {
	/// Parse `KEY=value` lines, ignoring comments and blanks.
	pub fn parse(content: &str) -> Self {
		let entries = content
			.lines()
			.filter_map(|line| {
				let trimmed = line.trim();
				if trimmed.is_empty() || trimmed.starts_with('#') {
					return None;
				}
				let (key, value) = trimmed.split_once('=')?;
				Some((key.trim().to_string(), value.to_string()))
			})
			.collect();
		Self {
			raw: content.to_string(),
			entries,
		}
	}

	/// Load and parse the file at `path`; `Ok(None)` when it does not exist.
	///
	/// # Errors
	///
	/// Returns [`crate::error::InstallError::Io`] on any read failure other
	/// than the file being absent.
	pub fn load(path: &Path) -> InstallResult<Option<Self>> {
		match std::fs::read_to_string(path) {
			Ok(content) => Ok(Some(Self::parse(&content))),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	/// Last value assigned to `key`, if any.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries
			.iter()
			.rev()
			.find(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
	}

	/// Whether an OIDC block is already enabled.
	pub fn oidc_enabled(&self) -> bool {
		self.get("OIDC_ENABLED") == Some("true")
	}

	/// The raw text as read from disk.
	pub fn raw(&self) -> &str {
		&self.raw
	}

	/// Count of lines assigning `key`; rewrites must keep this at one.
	pub fn occurrences(&self, key: &str) -> usize {
		self.entries.iter().filter(|(k, _)| k == key).count()
	}
}
