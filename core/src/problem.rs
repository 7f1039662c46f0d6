use std::fmt::Formatter;

use ariadne::{Config, Label, Report, ReportKind, Source};
use strum::Display;

use crate::theory::Loc;
use crate::Error;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
pub enum Severity {
    #[strum(serialize = "info")]
    Info,
    #[strum(serialize = "goal")]
    Goal,
    #[strum(serialize = "error")]
    Error,
    #[strum(serialize = "warning")]
    Warn,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
pub enum Stage {
    Parse,
    Resolve,
    Tyck,
    Terck,
    Other,
}

#[derive(Debug)]
pub struct Problem {
    pub severity: Severity,
    pub stage: Stage,
    pub error: Error,
}

impl Problem {
    pub fn new(error: Error) -> Self {
        Self {
            severity: error.severity(),
            stage: error.stage(),
            error,
        }
    }

    pub fn loc(&self) -> Loc {
        self.error.loc()
    }

    pub fn describe(&self) -> String {
        self.error.to_string()
    }

    /// Render against the source text of `file`, without colors.
    pub fn render(&self, file: &str, src: &str) -> String {
        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warn => ReportKind::Warning,
            _ => ReportKind::Advice,
        };
        let loc = self.loc();
        let end = loc.end.max(loc.start).min(src.len());
        let start = loc.start.min(end);
        let mut out = Vec::default();
        let written = Report::build(kind, file, start)
            .with_config(Config::default().with_color(false))
            .with_message(format!("{} ({})", self.describe(), self.stage))
            .with_label(Label::new((file, start..end)).with_message(self.describe()))
            .finish()
            .write((file, Source::from(src)), &mut out);
        match written {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.loc(), self.severity, self.error)
    }
}

pub trait Reporter {
    fn report(&mut self, problem: Problem);
}

/// Keeps every problem in report order.
#[derive(Debug, Default)]
pub struct Problems {
    problems: Vec<Problem>,
}

impl Problems {
    pub fn iter(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Problem> {
        self.iter().filter(|p| p.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Problem> {
        self.iter().filter(|p| p.severity == Severity::Warn)
    }

    pub fn into_vec(self) -> Vec<Problem> {
        self.problems
    }
}

impl Reporter for Problems {
    fn report(&mut self, problem: Problem) {
        log::debug!("{problem}");
        self.problems.push(problem);
    }
}
