//! The `stropt` run: read the source, lay the type out, print the report.

use std::io::{self, IsTerminal, Write};

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use stropt_cparse::{parse_source_with, ParseError, ParseErrorKind, Span};
use stropt_layout::{optimize, resolve, CatalogError, LayoutError};
use thiserror::Error;

use crate::options::{Input, Options};
use crate::render;

/// Name shown for source text passed on the command line.
const INLINE_SOURCE: &str = "<source>";

/// A failed run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Keeps the source text so the error can be shown in context.
    #[error("{error}")]
    Parse {
        path: String,
        text: String,
        #[source]
        error: ParseError,
    },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("cannot write the report: {0}")]
    Write(#[from] io::Error),
}

/// Run one invocation, writing the report to `out`.
#[tracing::instrument(level = "debug", skip_all, fields(type_name = %options.type_name))]
pub fn run(options: &Options, out: &mut impl Write) -> Result<(), CliError> {
    let (path, text) = read_input(&options.input)?;
    let catalog = options.catalog()?;
    let mut index = match parse_source_with(&text, &catalog) {
        Ok(index) => index,
        Err(error) => return Err(CliError::Parse { path, text, error }),
    };

    let name = options.type_name.as_str();
    let meta = resolve(&index, &catalog, name)?;

    if options.bare {
        write!(out, "{}", render::bare("(def)", name, &meta, options.verbose))?;
    } else {
        write!(out, "{}", render::title(name))?;
        write!(out, "{}", render::table("Type", name, &meta, options.verbose))?;
    }

    if !options.optimize {
        return Ok(());
    }

    let optimized = optimize(&mut index, &catalog, name, &meta)?;
    if optimized.size == meta.size {
        writeln!(out, "The passed layout is already minimal")?;
        return Ok(());
    }

    if options.bare {
        write!(out, "{}", render::bare("(opt)", name, &optimized, options.verbose))?;
    } else {
        write!(out, "{}", render::table("Type (opt)", name, &optimized, options.verbose))?;
    }

    if let Some(aggregate) = index.lookup(name) {
        let before = render::listing("// default", aggregate, &meta);
        let after = render::listing("// optimized", aggregate, &optimized);
        write!(out, "{}", render::side_by_side(&before, &after))?;
    }
    Ok(())
}

fn read_input(input: &Input) -> Result<(String, String), CliError> {
    match input {
        Input::Inline(text) => Ok((INLINE_SOURCE.to_owned(), text.clone())),
        Input::File(path) => {
            let shown = path.display().to_string();
            match std::fs::read_to_string(path) {
                Ok(text) => Ok((shown, text)),
                Err(source) => Err(CliError::Read { path: shown, source }),
            }
        }
    }
}

/// Print `err` on stderr. Parse errors are drawn against their source.
pub fn report(err: &CliError) {
    match err {
        CliError::Parse { path, text, error } => {
            let color = io::stderr().is_terminal();
            eprint!("{}", render_parse_error(path, text, error, color));
        }
        other => eprintln!("error: {other}"),
    }
}

/// Draw a parse error with its source line, label and help.
pub(crate) fn render_parse_error(path: &str, text: &str, error: &ParseError, color: bool) -> String {
    let span = clamp_to_source(error.span.clone(), text);
    let mut report = Report::build(ReportKind::Error, path, span.start)
        .with_config(
            Config::default()
                .with_color(color)
                .with_index_type(IndexType::Byte),
        )
        .with_message(error.to_string())
        .with_label(
            Label::new((path, span))
                .with_message(label_for(&error.kind))
                .with_color(Color::Red),
        );
    if let Some(help) = &error.help {
        report = report.with_help(help);
    }

    let mut buffer = Vec::new();
    match report.finish().write((path, Source::from(text)), &mut buffer) {
        Ok(()) => String::from_utf8_lossy(&buffer).into_owned(),
        Err(_) => format!("error: {error}\n"),
    }
}

/// Errors at end of input point at the last character instead.
fn clamp_to_source(span: Span, text: &str) -> Span {
    if span.start < text.len() {
        return span.start..span.end.min(text.len());
    }
    let last = text.char_indices().next_back().map_or(0, |(at, _)| at);
    last..text.len()
}

fn label_for(kind: &ParseErrorKind) -> &'static str {
    match kind {
        ParseErrorKind::UnexpectedToken { .. } | ParseErrorKind::UnexpectedEof { .. } => "unexpected here",
        ParseErrorKind::BitField { .. } => "declared as a bit-field",
        ParseErrorKind::InvalidExtent(_) => "in this array extent",
        ParseErrorKind::UnknownSizeof(_) => "size unknown here",
        _ => "here",
    }
}
