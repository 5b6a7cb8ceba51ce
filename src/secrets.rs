//! Secret generation.
//!
//! Secrets are drawn from the OS cryptographic random source on every run and
//! are never derived from user input or other predictable material. An
//! entropy failure is fatal; there is no fallback source.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::{InstallError, InstallResult};

/// Byte length of the JWT signing secret before encoding.
const JWT_SECRET_BYTES: usize = 32;
/// Byte length of the generated database password before encoding.
const DB_PASSWORD_BYTES: usize = 24;

/// Secrets generated fresh for each install run.
///
/// The database password is generated even for the embedded backend so that
/// the generation path is identical across backends; rendering simply does
/// not use it for sqlite.
#[derive(Debug, Clone)]
pub struct Secrets {
	pub jwt_secret: String,
	pub db_password: String,
}

impl Secrets {
	/// Generate both secrets from the OS random source.
	///
	/// # Errors
	///
	/// Returns [`InstallError::Entropy`] if the random source is
	/// unavailable.
	pub fn generate() -> InstallResult<Self> {
		Ok(Self {
			jwt_secret: random_token(JWT_SECRET_BYTES)?,
			db_password: random_token(DB_PASSWORD_BYTES)?,
		})
	}
}

/// Produce a base64url token from `bytes` random bytes.
///
/// URL-safe alphabet without padding keeps the value safe to embed in
/// `KEY=value` lines and connection strings without quoting.
fn random_token(bytes: usize) -> InstallResult<String> {
	let mut buf = vec![0u8; bytes];
	getrandom::getrandom(&mut buf).map_err(|e| InstallError::Entropy {
		message: e.to_string(),
	})?;
	Ok(URL_SAFE_NO_PAD.encode(&buf))
}
