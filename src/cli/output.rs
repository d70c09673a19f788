use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use crate::error::{HsError, Result, StructuredError};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable formatted output with colors (default)
    #[default]
    Human,
    /// Pretty-printed JSON envelope on stdout
    Json,
    /// Plain text without colors
    Plain,
}

impl OutputFormat {
    #[must_use]
    pub const fn use_colors(&self) -> bool {
        matches!(self, Self::Human)
    }

    #[must_use]
    pub const fn is_machine_readable(&self) -> bool {
        matches!(self, Self::Json)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineStatus {
    Ok,
    Error,
}

/// Envelope for every machine-mode response.
#[derive(Debug, Serialize)]
pub struct MachineResponse<T> {
    pub status: MachineStatus,
    pub version: &'static str,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

pub fn machine_ok<T: Serialize>(data: T) -> MachineResponse<T> {
    MachineResponse {
        status: MachineStatus::Ok,
        version: crate::VERSION,
        data,
        warnings: Vec::new(),
    }
}

#[must_use]
pub fn machine_error(err: &HsError) -> MachineResponse<StructuredError> {
    MachineResponse {
        status: MachineStatus::Error,
        version: crate::VERSION,
        data: err.to_structured(),
        warnings: Vec::new(),
    }
}

impl<T> MachineResponse<T> {
    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)?;
    println!("{payload}");
    Ok(())
}

/// Line-oriented builder for human output.
pub struct HumanLayout {
    lines: Vec<String>,
    key_width: usize,
    colors: bool,
}

impl HumanLayout {
    #[must_use]
    pub const fn new(colors: bool) -> Self {
        Self {
            lines: Vec::new(),
            key_width: 14,
            colors,
        }
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        let line = if self.colors { text.bold().to_string() } else { text.to_string() };
        self.lines.push(line);
        self.lines.push(String::new());
        self
    }

    pub fn kv(&mut self, key: &str, value: &str) -> &mut Self {
        let key = format!("{key:width$}", width = self.key_width);
        let key = if self.colors { key.as_str().dimmed().to_string() } else { key };
        self.lines.push(format!("{key} {value}"));
        self
    }

    pub fn bullet(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("- {text}"));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    pub fn push_line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    #[must_use]
    pub fn build(self) -> String {
        self.lines.join("\n")
    }
}

pub fn emit_human(layout: HumanLayout) {
    println!("{}", layout.build());
}
