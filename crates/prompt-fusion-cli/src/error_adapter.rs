//! Rendering of [`FusionError`] through miette.
//!
//! A failed compile can carry several diagnostics, for example one per
//! undefined `$name`. Each becomes its own [`Reportable`] so the CLI prints
//! one snippet per problem.
//!
//! Diagnostics from variable resolution (`E2xx`) point into the prompt as
//! written, while structural diagnostics (`E1xx`) point into the prompt after
//! variables were substituted. The snippet title says which text is shown.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, NamedSource, SourceSpan};

use prompt_fusion::FusionError;
use prompt_fusion_parser::error::Diagnostic;

/// Which text a diagnostic's spans index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptText {
    /// The prompt as the user wrote it.
    Written,
    /// The prompt after `$name` references were substituted.
    Resolved,
}

impl PromptText {
    /// The text a diagnostic refers to, judged by its code.
    ///
    /// Resolver codes refer to the written prompt. Everything else is raised
    /// after resolution.
    pub fn of(diag: &Diagnostic) -> Self {
        match diag.code() {
            Some(code) if code.as_str().starts_with("E2") => Self::Written,
            _ => Self::Resolved,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Written => "prompt",
            Self::Resolved => "prompt (variables resolved)",
        }
    }
}

/// One prompt diagnostic, rendered against the text its spans index.
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    source: NamedSource<String>,
}

impl<'a> DiagnosticAdapter<'a> {
    pub fn new(diag: &'a Diagnostic, src: &str) -> Self {
        let title = PromptText::of(diag).title();
        Self {
            diag,
            source: NamedSource::new(title, src.to_string()),
        }
    }

    /// The snippet title shown above the source.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .field("source", &self.source_name())
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|code| Box::new(code) as Box<dyn fmt::Display>)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|help| Box::new(help) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.source)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let span = SourceSpan::new(label.span().start().into(), label.span().len());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// A [`FusionError`] that has no source location: reading the prompt file,
/// a bad configuration, or a report that could not be serialized.
pub struct ErrorAdapter<'a>(pub &'a FusionError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            FusionError::Io(_) => "prompt_fusion::io",
            FusionError::Parse { .. } => return None,
            FusionError::Config(_) => "prompt_fusion::config",
            FusionError::Serialize(_) => "prompt_fusion::serialize",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            FusionError::Io(_) => "check that the prompt file exists and is readable",
            FusionError::Config(_) => {
                "`[schedule] steps` and `--steps` must be positive; \
                 `[tensor] max_interpolation_leaves` caps interpolated weights"
            }
            FusionError::Parse { .. } | FusionError::Serialize(_) => return None,
        };
        Some(Box::new(help))
    }
}

/// Anything the CLI prints as a miette report.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A prompt diagnostic with a source snippet.
    Diagnostic(DiagnosticAdapter<'a>),
    /// An error without a source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(_) => None,
        }
    }
}

/// Split a [`FusionError`] into the reports the CLI prints.
///
/// A parse failure yields one report per diagnostic, in source order.
pub fn to_reportables(err: &FusionError) -> Vec<Reportable<'_>> {
    match err {
        FusionError::Parse {
            err: parse_err,
            src,
        } => parse_err
            .diagnostics()
            .iter()
            .map(|diag| Reportable::Diagnostic(DiagnosticAdapter::new(diag, src)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}
