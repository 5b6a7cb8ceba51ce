//! Install run reporting.
//!
//! The installer records a result per stage and prints a summary when the
//! run ends. Human output goes to the terminal; the JSON form is available
//! for scripting around the installer.

use serde::{Deserialize, Serialize};

use crate::error::InstallResult;

/// Stages of the install sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallStage {
	Preflight,
	Collect,
	Provision,
	FetchSource,
	RenderEnv,
	ProxyHttp,
	Certificate,
	ProxyHttps,
	Activate,
}

impl InstallStage {
	pub fn label(&self) -> &'static str {
		match self {
			InstallStage::Preflight => "preflight",
			InstallStage::Collect => "collect parameters",
			InstallStage::Provision => "provision dependencies",
			InstallStage::FetchSource => "fetch application source",
			InstallStage::RenderEnv => "write environment file",
			InstallStage::ProxyHttp => "nginx phase 1 (http)",
			InstallStage::Certificate => "obtain certificate",
			InstallStage::ProxyHttps => "nginx phase 2 (https)",
			InstallStage::Activate => "activate service",
		}
	}
}

/// Result of one install stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
	pub stage: InstallStage,
	pub success: bool,
	pub message: String,
}

/// Complete record of an install run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallReport {
	pub version: String,
	pub timestamp: String,
	pub domain: String,
	pub mode: String,
	pub success: bool,
	pub stages: Vec<StageResult>,
}

impl InstallReport {
	pub fn new(domain: &str, mode: &str) -> Self {
		Self {
			version: env!("CARGO_PKG_VERSION").to_string(),
			timestamp: chrono::Utc::now().to_rfc3339(),
			domain: domain.to_string(),
			mode: mode.to_string(),
			success: true,
			stages: Vec::new(),
		}
	}

	/// Record a stage result; any failed stage marks the run failed.
	pub fn add_stage(&mut self, stage: InstallStage, success: bool, message: impl Into<String>) {
		if !success {
			self.success = false;
		}
		self.stages.push(StageResult {
			stage,
			success,
			message: message.into(),
		});
	}

	/// First failed stage, if any.
	pub fn failed_stage(&self) -> Option<&StageResult> {
		self.stages.iter().find(|s| !s.success)
	}

	/// Format the report as human-readable terminal output.
	pub fn format_human(&self) -> String {
		let mut output = String::new();
		output.push_str("=== INSTALL REPORT ===\n");
		output.push_str(&format!("Domain:    {}\n", self.domain));
		output.push_str(&format!("Mode:      {}\n", self.mode));
		output.push_str(&format!("Timestamp: {}\n", self.timestamp));
		output.push('\n');

		for stage in &self.stages {
			let mark = if stage.success { "[OK]" } else { "[FAIL]" };
			output.push_str(&format!(
				"{mark} {}: {}\n",
				stage.stage.label(),
				stage.message
			));
		}

		output.push('\n');
		if self.success {
			output.push_str(&format!(
				"Install complete. The instance will be served at https://{}\n",
				self.domain
			));
		} else {
			output.push_str("Install FAILED; completed stages are left in place.\n");
		}
		output
	}

	/// Format the report as pretty-printed JSON.
	///
	/// # Errors
	///
	/// Returns [`crate::error::InstallError::Json`] if serialization fails.
	pub fn format_json(&self) -> InstallResult<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}
}
