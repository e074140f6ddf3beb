//! Output document and diagnostic logging.

use ecsgen_core::GenerationOutput;
use ecsgen_decl::{Diagnostic, GeneratorConfig, Severity};
use serde::Serialize;
use tracing::{error, warn};

/// The document handed to the code emitter.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub config: GeneratorConfig,
    #[serde(flatten)]
    pub output: &'a GenerationOutput<'a>,
    pub diagnostics: Vec<&'a Diagnostic>,
}

impl<'a> Report<'a> {
    #[must_use]
    pub fn new(config: GeneratorConfig, output: &'a GenerationOutput<'a>) -> Self {
        Self {
            config,
            output,
            diagnostics: output.diagnostics().collect(),
        }
    }

    /// Render as JSON.
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    /// Number of diagnostics with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Log every diagnostic at a level matching its severity.
pub fn log_diagnostics<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) {
    for diagnostic in diagnostics {
        match diagnostic.severity {
            Severity::Warning => warn!(code = %diagnostic.code, "{diagnostic}"),
            Severity::Error => error!(code = %diagnostic.code, "{diagnostic}"),
        }
    }
}
