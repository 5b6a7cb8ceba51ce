//! Interactive prompting.
//!
//! All operator input flows through the [`Prompter`] capability so the
//! collection logic can be exercised without a terminal. The production
//! implementation wraps `inquire`; [`ScriptedPrompter`] plays back canned
//! answers for the test suite.

use std::collections::VecDeque;

use crate::error::{InstallError, InstallResult};

/// Capability for asking the operator questions.
///
/// Blank answers are returned as-is (after default substitution); deciding
/// whether blank is fatal belongs to the collector, not the prompter.
pub trait Prompter {
	/// Free-text question. `default` is applied when the answer is blank.
	fn text(&mut self, message: &str, default: Option<&str>) -> InstallResult<String>;

	/// Hidden-input question for credentials.
	fn password(&mut self, message: &str) -> InstallResult<String>;

	/// Yes/no question with a default answer.
	fn confirm(&mut self, message: &str, default: bool) -> InstallResult<bool>;

	/// Pick one of `options`; returns the chosen index. The first-listed
	/// option is the default.
	fn select(&mut self, message: &str, options: &[&str]) -> InstallResult<usize>;
}

/// Terminal prompter backed by `inquire`.
pub struct ConsolePrompter;

fn prompt_err(e: inquire::InquireError) -> InstallError {
	InstallError::Prompt {
		message: e.to_string(),
	}
}

impl Prompter for ConsolePrompter {
	fn text(&mut self, message: &str, default: Option<&str>) -> InstallResult<String> {
		let mut prompt = inquire::Text::new(message);
		if let Some(default) = default {
			prompt = prompt.with_default(default);
		}
		prompt.prompt().map(|s| s.trim().to_string()).map_err(prompt_err)
	}

	fn password(&mut self, message: &str) -> InstallResult<String> {
		inquire::Password::new(message)
			.without_confirmation()
			.prompt()
			.map_err(prompt_err)
	}

	fn confirm(&mut self, message: &str, default: bool) -> InstallResult<bool> {
		inquire::Confirm::new(message)
			.with_default(default)
			.prompt()
			.map_err(prompt_err)
	}

	fn select(&mut self, message: &str, options: &[&str]) -> InstallResult<usize> {
		let chosen = inquire::Select::new(message, options.to_vec())
			.prompt()
			.map_err(prompt_err)?;
		Ok(options
			.iter()
			.position(|o| *o == chosen)
			.unwrap_or_default())
	}
}

/// Prompter that replays a fixed sequence of answers.
///
/// Answers are consumed in prompt order. An empty string means "operator
/// pressed enter": text falls back to its default (or stays empty), confirm
/// and select fall back to their defaults.
pub struct ScriptedPrompter {
	answers: VecDeque<String>,
}

impl ScriptedPrompter {
	pub fn new<I, S>(answers: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			answers: answers.into_iter().map(Into::into).collect(),
		}
	}

	fn next(&mut self, message: &str) -> InstallResult<String> {
		self.answers
			.pop_front()
			.ok_or_else(|| InstallError::Prompt {
				message: format!("script exhausted at prompt: {message}"),
			})
	}
}

impl Prompter for ScriptedPrompter {
	fn text(&mut self, message: &str, default: Option<&str>) -> InstallResult<String> {
		let answer = self.next(message)?;
		if answer.is_empty() {
			return Ok(default.unwrap_or("").to_string());
		}
		Ok(answer.trim().to_string())
	}

	fn password(&mut self, message: &str) -> InstallResult<String> {
		self.next(message)
	}

	fn confirm(&mut self, message: &str, default: bool) -> InstallResult<bool> {
		let answer = self.next(message)?;
		match answer.trim().to_ascii_lowercase().as_str() {
			"" => Ok(default),
			"y" | "yes" | "true" => Ok(true),
			"n" | "no" | "false" => Ok(false),
			other => Err(InstallError::Prompt {
				message: format!("unrecognized scripted answer {other:?} for: {message}"),
			}),
		}
	}

	fn select(&mut self, message: &str, options: &[&str]) -> InstallResult<usize> {
		let answer = self.next(message)?;
		let trimmed = answer.trim();
		if trimmed.is_empty() {
			return Ok(0);
		}
		if let Ok(index) = trimmed.parse::<usize>() {
			if index < options.len() {
				return Ok(index);
			}
		}
		options
			.iter()
			.position(|o| o.eq_ignore_ascii_case(trimmed))
			.ok_or_else(|| InstallError::Prompt {
				message: format!("scripted answer {trimmed:?} matches no option for: {message}"),
			})
	}
}
