//! Parameter collection.
//!
//! Turns a sequence of prompts into typed configuration records. Required
//! fields left blank are fatal before any provisioning or file write;
//! optional fields fall back to their stated defaults.

use colored::Colorize;

use crate::config::{
	DatabaseBackend, DeployMode, InstallConfig, MailSettings, OidcConfig, strip_trailing_slash,
};
use crate::error::{InstallError, InstallResult};
use crate::prompt::Prompter;

/// Default OIDC scope string.
pub const DEFAULT_OIDC_SCOPE: &str = "openid profile email";
/// Default claim carrying the user's email address.
pub const DEFAULT_EMAIL_CLAIM: &str = "email";

/// Reject a blank required answer.
fn require(value: String, field: &str) -> InstallResult<String> {
	if value.trim().is_empty() {
		return Err(InstallError::MissingInput {
			field: field.to_string(),
		});
	}
	Ok(value)
}

/// Gather the full install configuration from the operator.
///
/// # Errors
///
/// Returns [`InstallError::MissingInput`] when a required field is left
/// blank and [`InstallError::Prompt`] when a prompt cannot be read.
pub fn collect_install_config(prompter: &mut dyn Prompter) -> InstallResult<InstallConfig> {
	let domain = require(
		strip_trailing_slash(&prompter.text("Domain the instance will be served on (e.g. kutt.example.com)", None)?),
		"domain",
	)?;
	let le_email = require(
		prompter.text("Contact email for Let's Encrypt", None)?,
		"letsencrypt email",
	)?;

	let mode = match prompter.select("Deployment mode", &["docker", "node"])? {
		1 => DeployMode::Node,
		_ => DeployMode::Docker,
	};

	let database = match mode {
		DeployMode::Docker => {
			match prompter.select("Database backend", &["sqlite", "postgres"])? {
				1 => DatabaseBackend::Postgres,
				_ => DatabaseBackend::Sqlite,
			}
		}
		DeployMode::Node => {
			// Node mode always runs on the embedded backend; say so instead
			// of silently skipping the choice.
			println!(
				"{} node mode uses the embedded sqlite backend; the database prompt is skipped",
				"note:".yellow()
			);
			DatabaseBackend::Sqlite
		}
	};

	let mail = if prompter.confirm("Enable outgoing mail (SMTP)?", false)? {
		let host = require(prompter.text("SMTP host", None)?, "mail host")?;
		let port_text = prompter.text("SMTP port", Some("587"))?;
		let port: u16 = port_text
			.trim()
			.parse()
			.map_err(|_| InstallError::Precondition {
				message: format!("invalid SMTP port: {port_text}"),
			})?;
		let user = require(prompter.text("SMTP user", None)?, "mail user")?;
		let password = require(prompter.password("SMTP password")?, "mail password")?;
		let default_from = format!("kutt@{domain}");
		let from_address = prompter.text("Mail from address", Some(&default_from))?;
		Some(MailSettings {
			host,
			port,
			user,
			password,
			from_address,
		})
	} else {
		None
	};

	let allow_registration = prompter.confirm("Allow public account registration?", false)?;
	let allow_anonymous_links =
		prompter.confirm("Allow link creation without an account?", false)?;

	Ok(InstallConfig {
		domain,
		le_email,
		mode,
		database,
		mail,
		allow_registration,
		allow_anonymous_links,
	})
}

/// Gather the OIDC block for the reconfiguration entry point.
///
/// # Errors
///
/// Same contract as [`collect_install_config`].
pub fn collect_oidc_config(prompter: &mut dyn Prompter) -> InstallResult<OidcConfig> {
	let issuer = require(
		strip_trailing_slash(&prompter.text("OIDC issuer URL", None)?),
		"oidc issuer",
	)?;
	let client_id = require(prompter.text("OIDC client id", None)?, "oidc client id")?;
	let client_secret = require(prompter.password("OIDC client secret")?, "oidc client secret")?;
	let scope = prompter.text("OIDC scope", Some(DEFAULT_OIDC_SCOPE))?;
	let email_claim = prompter.text("Claim containing the email address", Some(DEFAULT_EMAIL_CLAIM))?;
	let keep_password_login =
		prompter.confirm("Keep the password login form alongside OIDC?", true)?;

	Ok(OidcConfig {
		issuer,
		client_id,
		client_secret,
		scope,
		email_claim,
		keep_password_login,
	})
}
