//! Tagged result for stages that can fail per item, per kind, or per batch.

use serde::{Serialize, Serializer};

use crate::diagnostic::Diagnostic;

/// Result of one generation stage.
///
/// Stages never abort the pass: they either produce their output, produce it
/// with some items dropped, or reject the whole batch. Callers decide whether
/// a degraded output is good enough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// Complete output, nothing to report.
    Ok(T),
    /// Output is usable but diagnostics were raised (items may be missing).
    PartialOk(T, Vec<Diagnostic>),
    /// No output for this batch.
    Rejected(Vec<Diagnostic>),
}

impl<T> Outcome<T> {
    /// Build an outcome from a value and whatever diagnostics were collected.
    #[must_use]
    pub fn from_parts(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        if diagnostics.is_empty() {
            Outcome::Ok(value)
        } else {
            Outcome::PartialOk(value, diagnostics)
        }
    }

    /// The output value, if the batch was not rejected.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Ok(value) | Outcome::PartialOk(value, _) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Ok(value) | Outcome::PartialOk(value, _) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    /// Diagnostics raised while producing this outcome.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Outcome::Ok(_) => &[],
            Outcome::PartialOk(_, diagnostics) | Outcome::Rejected(diagnostics) => diagnostics,
        }
    }

    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }

    /// Prepend earlier diagnostics (e.g. from validation) to this outcome,
    /// keeping the overall order stable.
    #[must_use]
    pub fn with_leading(self, mut leading: Vec<Diagnostic>) -> Self {
        if leading.is_empty() {
            return self;
        }
        match self {
            Outcome::Ok(value) => Outcome::PartialOk(value, leading),
            Outcome::PartialOk(value, rest) => {
                leading.extend(rest);
                Outcome::PartialOk(value, leading)
            }
            Outcome::Rejected(rest) => {
                leading.extend(rest);
                Outcome::Rejected(leading)
            }
        }
    }

    /// Transform the value, keeping diagnostics.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ok(value) => Outcome::Ok(f(value)),
            Outcome::PartialOk(value, diagnostics) => Outcome::PartialOk(f(value), diagnostics),
            Outcome::Rejected(diagnostics) => Outcome::Rejected(diagnostics),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum Status {
    Ok,
    PartialOk,
    Rejected,
}

#[derive(Serialize)]
struct OutcomeView<'a, T> {
    status: Status,
    value: Option<&'a T>,
    diagnostics: &'a [Diagnostic],
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let status = match self {
            Outcome::Ok(_) => Status::Ok,
            Outcome::PartialOk(..) => Status::PartialOk,
            Outcome::Rejected(_) => Status::Rejected,
        };
        OutcomeView {
            status,
            value: self.value(),
            diagnostics: self.diagnostics(),
        }
        .serialize(serializer)
    }
}
