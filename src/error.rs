use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};
use std::fmt;

/// Character-offset range into the program source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: &Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    RuntimeError,
}

impl ErrorKind {
    fn label(&self) -> &'static str {
        match self {
            ErrorKind::LexError => "Lexical Error",
            ErrorKind::ParseError => "Parse Error",
            ErrorKind::RuntimeError => "Runtime Error",
        }
    }

    fn color(&self) -> Color {
        match self {
            ErrorKind::LexError => Color::Red,
            ErrorKind::ParseError => Color::Yellow,
            ErrorKind::RuntimeError => Color::Magenta,
        }
    }
}

/// A failure raised by one pipeline stage.
#[derive(Debug, Clone)]
pub struct CypeError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl CypeError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
        }
    }

    pub fn new_with_help(kind: ErrorKind, span: Span, message: String, help: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: Some(help),
        }
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::LexError, span, message)
    }

    pub fn parse_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::ParseError, span, message)
    }

    pub fn parse_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::ParseError, span, message, help)
    }

    pub fn runtime_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::RuntimeError, span, message, help)
    }

    /// Print the diagnostic to stderr.
    pub fn report(&self, source: &str, filename: Option<&str>) {
        self.eprint(ReportKind::Error, source, filename);
    }

    /// Print the diagnostic to stderr as a warning. Used for lexical
    /// anomalies that were skipped rather than raised.
    pub fn warn(&self, source: &str, filename: Option<&str>) {
        self.eprint(ReportKind::Warning, source, filename);
    }

    /// Render the diagnostic without colour.
    pub fn render(&self, source: &str, filename: Option<&str>) -> String {
        let filename = filename.unwrap_or("<input>");
        let mut buffer = Vec::new();
        let written = self
            .build(ReportKind::Error, filename, source, false)
            .write((filename, Source::from(source)), &mut buffer);

        match written {
            Ok(()) => String::from_utf8_lossy(&buffer).into_owned(),
            Err(_) => format!("{}: {}", self.kind.label(), self.message),
        }
    }

    fn eprint(&self, report_kind: ReportKind<'static>, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<input>");
        let printed = self
            .build(report_kind, filename, source, true)
            .eprint((filename, Source::from(source)));

        if printed.is_err() {
            eprintln!("{}: {}", self.kind.label(), self.message);
        }
    }

    fn build<'a>(
        &self,
        report_kind: ReportKind<'a>,
        filename: &'a str,
        source: &str,
        colored: bool,
    ) -> Report<'a, (&'a str, std::ops::Range<usize>)> {
        let color = self.kind.color();
        let range = self.label_range(source);
        let title = if colored {
            format!("{}: {}", self.kind.label().fg(color), self.message)
        } else {
            format!("{}: {}", self.kind.label(), self.message)
        };

        let offset = range.start;
        let mut label = Label::new((filename, range)).with_message(&self.message);
        if colored {
            label = label.with_color(color);
        }

        let mut report_builder = Report::build(report_kind, filename, offset)
            .with_config(Config::default().with_color(colored))
            .with_message(title)
            .with_label(label);

        if let Some(ref help_text) = self.help {
            let note = if colored {
                format!("{}: {}", "help".fg(Color::Cyan), help_text)
            } else {
                format!("help: {}", help_text)
            };
            report_builder = report_builder.with_note(note);
        }

        report_builder.finish()
    }

    /// The span clamped to the source. End-of-input errors point just past
    /// the last character, so they are pulled back onto it.
    fn label_range(&self, source: &str) -> std::ops::Range<usize> {
        let len = source.chars().count();
        if len == 0 {
            return 0..0;
        }
        let start = self.span.start.min(len - 1);
        let end = self.span.end.clamp(start + 1, len);
        start..end
    }
}

impl fmt::Display for CypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CypeError {}

/// The single failure type seen by callers of the driver. Whatever stage
/// failed, it displays as `Runtime Error: <message>`.
#[derive(Debug, Clone)]
pub struct ExecuteError {
    pub error: CypeError,
}

impl ExecuteError {
    pub fn kind(&self) -> &ErrorKind {
        &self.error.kind
    }
}

impl From<CypeError> for ExecuteError {
    fn from(error: CypeError) -> Self {
        Self { error }
    }
}

impl fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Runtime Error: {}", self.error.message)
    }
}

impl std::error::Error for ExecuteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
