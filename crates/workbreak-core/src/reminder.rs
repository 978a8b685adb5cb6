//! Reminder payload and delivery.
//!
//! The engine decides *when* a reminder is due; a [`ReminderSink`] decides
//! *how* it reaches the user. The default sink speaks the configured
//! utterance through an external text-to-speech command and falls back to
//! the terminal bell.

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ReminderError;

/// Fixed reminder text and the locale it should be spoken in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub locale: String,
    pub text: String,
}

impl Utterance {
    pub fn new(locale: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            text: text.into(),
        }
    }

    /// Decode a base64 payload wrapping percent-encoded UTF-8 text.
    pub fn from_encoded(locale: impl Into<String>, encoded: &str) -> Result<Self, ReminderError> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
        let percent = String::from_utf8(bytes)
            .map_err(|e| ReminderError::InvalidText(e.to_string()))?;
        let text = urlencoding::decode(&percent)
            .map_err(|e| ReminderError::InvalidText(e.to_string()))?;
        Ok(Self::new(locale, text.into_owned()))
    }
}

/// Delivers a reminder to the user. Must not block.
pub trait ReminderSink: Send + Sync {
    fn remind(&self, utterance: &Utterance) -> Result<(), ReminderError>;
}

/// Rings the terminal bell.
#[derive(Debug, Default, Clone, Copy)]
pub struct BellSink;

impl ReminderSink for BellSink {
    fn remind(&self, _utterance: &Utterance) -> Result<(), ReminderError> {
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
        Ok(())
    }
}

/// Discards reminders.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReminderSink for NullSink {
    fn remind(&self, _utterance: &Utterance) -> Result<(), ReminderError> {
        Ok(())
    }
}

/// Spawns a speech command for each reminder.
///
/// The command line is split on whitespace; `{locale}` and `{message}`
/// placeholders in any argument are substituted. Quotes are not
/// interpreted. The child runs with its output discarded and is reaped on a
/// background thread.
#[derive(Debug, Clone)]
pub struct CommandSink {
    program: String,
    args: Vec<String>,
    fallback_to_bell: bool,
}

impl CommandSink {
    pub fn new(command_line: &str) -> Self {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_default();
        let args = parts.collect();
        Self {
            program,
            args,
            fallback_to_bell: true,
        }
    }

    /// `say` on macOS, `espeak` elsewhere.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("say {message}")
        } else {
            Self::new("espeak -v {locale} {message}")
        }
    }

    pub fn without_fallback(mut self) -> Self {
        self.fallback_to_bell = false;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with placeholders filled in for `utterance`.
    pub fn render_args(&self, utterance: &Utterance) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{locale}", &speech_voice(&utterance.locale))
                    .replace("{message}", &utterance.text)
            })
            .collect()
    }
}

impl ReminderSink for CommandSink {
    fn remind(&self, utterance: &Utterance) -> Result<(), ReminderError> {
        let args = self.render_args(utterance);
        debug!(program = %self.program, ?args, "spawning reminder command");
        let spawned = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                let program = self.program.clone();
                thread::spawn(move || match child.wait() {
                    Ok(status) if !status.success() => {
                        debug!(program = %program, %status, "reminder command exited with failure");
                    }
                    Ok(_) => {}
                    Err(e) => warn!(program = %program, error = %e, "failed to wait on reminder command"),
                });
                Ok(())
            }
            Err(source) if self.fallback_to_bell => {
                warn!(program = %self.program, error = %source, "reminder command failed, ringing bell");
                BellSink.remind(utterance)
            }
            Err(source) => Err(ReminderError::SpawnFailed {
                command: self.program.clone(),
                source,
            }),
        }
    }
}

/// espeak voices are named by language ("sk"), not full locale ("sk-SK").
fn speech_voice(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or(locale)
        .to_ascii_lowercase()
}
