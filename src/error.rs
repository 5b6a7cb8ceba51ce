//! Error types for the installer.
//!
//! One error enum covers all three entry points; variants map onto the
//! failure taxonomy (preconditions, input validation, mid-procedure
//! failures). Operator-declined confirmations are not errors and are
//! represented by [`crate::RunOutcome::Declined`] instead.

use thiserror::Error;

/// Errors that can occur during install, teardown, or reconfiguration.
#[derive(Debug, Error)]
pub enum InstallError {
	/// The entry point was invoked without root privileges.
	#[error("this command must be run as root (try sudo)")]
	NotRoot,

	/// A required interactive field was left empty.
	#[error("required input missing: {field}")]
	MissingInput {
		/// Name of the field that was left blank.
		field: String,
	},

	/// A precondition was not met before any side effect was attempted.
	#[error("precondition failed: {message}")]
	Precondition { message: String },

	/// An interactive prompt could not be read.
	#[error("prompt failed: {message}")]
	Prompt { message: String },

	/// An external command exited unsuccessfully or could not be spawned.
	#[error("command failed: {command}: {message}")]
	Command { command: String, message: String },

	/// The reverse proxy rejected a rendered site configuration.
	#[error("nginx rejected the generated configuration: {message}")]
	ProxyValidation { message: String },

	/// Certificate issuance or revocation failed.
	#[error("certificate operation failed for {domain}: {message}")]
	Certificate { domain: String, message: String },

	/// The OS random source was unavailable. Never falls back to a
	/// weaker source.
	#[error("system random source unavailable: {message}")]
	Entropy { message: String },

	/// Template loading or rendering failed.
	#[error("template error: {message}")]
	Template { message: String },

	/// I/O operation failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// Report serialization failed.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Result type alias for installer operations.
pub type InstallResult<T> = Result<T, InstallError>;

impl From<tera::Error> for InstallError {
	fn from(e: tera::Error) -> Self {
		InstallError::Template {
			message: e.to_string(),
		}
	}
}

impl InstallError {
	/// Shorthand for a [`InstallError::Command`] from a program name and
	/// a failure description.
	pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
		InstallError::Command {
			command: command.into(),
			message: message.into(),
		}
	}
}
