use std::ops::Range;

use crate::error::ConvertError;
use crate::ir::FeatureUniverse;

/// A conversion diagnostic (error or warning).
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Byte range into the offending file, if the error points at one.
    pub span: Option<Range<usize>>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span: None,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            span: None,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Render to stderr using ariadne. Without a span, or when the span
    /// does not fit `source`, only the message, notes and help are shown.
    pub fn render(&self, filename: &str, source: &str) {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };

        let color = match self.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let span = self
            .span
            .clone()
            .filter(|s| s.start <= s.end && s.end <= source.len());
        let offset = span.as_ref().map_or(0, |s| s.start);

        let mut report = Report::build(kind, filename, offset).with_message(&self.message);
        if let Some(span) = span {
            report = report.with_label(
                Label::new((filename, span))
                    .with_message(&self.message)
                    .with_color(color),
            );
        }

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        if report
            .finish()
            .eprint((filename, Source::from(source)))
            .is_err()
        {
            let label = match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            eprintln!("{}: {}", label, self.message);
        }
    }
}

impl From<&ConvertError> for Diagnostic {
    fn from(err: &ConvertError) -> Self {
        let mut diag = Diagnostic::error(err.to_string());
        if let Some(span) = err.span() {
            diag = diag.with_span(span);
        }
        match err {
            ConvertError::MalformedTree { tree, node, .. } => {
                diag = diag.with_note(match node {
                    Some(id) => format!("raw dump of tree {}, node id {}", tree, id),
                    None => format!("raw dump of tree {}", tree),
                });
            }
            ConvertError::UnknownFeature { feature_count, .. } => {
                diag = diag.with_help(format!(
                    "declare the feature, or use f0 .. f{} to address features by position",
                    feature_count.saturating_sub(1)
                ));
            }
            ConvertError::UnresolvedPlaceholder { template, .. } => {
                diag = diag
                    .with_note(format!("while checking template '{}'", template))
                    .with_help("write '{{' and '}}' for literal braces".to_string());
            }
            ConvertError::InvalidTreeLimit { available, .. } => {
                diag = diag.with_help(format!("choose a tree limit between 1 and {}", available));
            }
            ConvertError::DuplicateFeature { .. } => {
                diag = diag.with_help("feature names must be unique".to_string());
            }
            _ => {}
        }
        diag
    }
}

/// Report `err` on stderr. Errors that point into a file are rendered
/// against that file's text when it can be read.
pub fn report_error(err: &ConvertError) {
    let diag = Diagnostic::from(err);
    match err {
        ConvertError::Config { path, .. } if diag.span.is_some() => {
            match std::fs::read_to_string(path) {
                Ok(source) => diag.render(&path.to_string_lossy(), &source),
                Err(_) => diag.render(&path.to_string_lossy(), ""),
            }
        }
        _ => diag.render("forestc", ""),
    }
}

/// Warnings for a feature list that loads but reads ambiguously: declared
/// `f<N>` names at an index other than N.
pub fn feature_warnings(universe: &FeatureUniverse) -> Vec<Diagnostic> {
    universe
        .misplaced_positional_names()
        .into_iter()
        .map(|(index, name)| {
            Diagnostic::warning(format!("feature '{}' is declared at index {}", name, index))
                .with_note(
                    "positional f<N> references are disabled for this feature list".to_string(),
                )
                .with_help(format!(
                    "rename the feature, or move it to index {}",
                    &name[1..]
                ))
        })
        .collect()
}

/// Render a list of diagnostics.
pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: &str) {
    for diag in diagnostics {
        diag.render(filename, source);
    }
}
