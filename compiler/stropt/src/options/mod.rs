//! Command-line options.
//!
//! Arguments are parsed by hand. Flags take one or two leading dashes
//! (`-optimize` and `--optimize` are the same flag), and valued flags
//! accept both `--flag value` and `--flag=value`. Everything after `--` is
//! positional.

use std::path::PathBuf;

use stropt_layout::{CatalogError, Category, Preset, TypeCatalog};
use thiserror::Error;

pub const USAGE: &str = "\
usage: stropt [options] <type-name> <source>
       stropt [options] --file <path> <type-name>";

pub const HELP: &str = "
stropt analyzes the C aggregate types you pass in and prints their size,
alignment and layout, padding bytes included, along with a field order that
needs less padding.

The type is looked up in the source code given as the second argument, or in
the file given with --file. Names can be tags (`struct point`, `point`) or
typedef names.

Options:
  --file <path>                     read the type definitions from <path>
  --bare                            print plain lines instead of tables
  --verbose                         also show the rows of nested aggregates
  --optimize                        suggest a layout with less padding
  --preset <64bit|32bit|avr8>       target platform (default: 64bit)
  --set <category>=<size>:<align>   override a type category (repeatable);
                                    categories: pointer, enum, char, short,
                                    int, long, long-long, float, double,
                                    long-double
  --set-type <type>=<size>:<align>  override a single type spelling, such as
                                    int64_t (repeatable)
  --help                            show this message
  --version                         print the version

Overrides apply after the preset, in command-line order.
Set STROPT_LOG (or RUST_LOG), e.g. STROPT_LOG=debug, to trace resolution
on stderr.";

/// What the command line asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Run(Options),
    Help,
    Version,
}

/// Where the C source comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// Source text passed as an argument.
    Inline(String),
    File(PathBuf),
}

/// A fully parsed `stropt` invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    pub type_name: String,
    pub input: Input,
    pub bare: bool,
    pub verbose: bool,
    pub optimize: bool,
    pub preset: Preset,
    /// Catalog overrides, in command-line order.
    pub overrides: Vec<Override>,
}

/// One `--set` or `--set-type` option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Override {
    Category {
        category: Category,
        size: u64,
        alignment: u64,
    },
    Type {
        spelling: String,
        size: u64,
        alignment: u64,
    },
}

impl Options {
    /// The catalog these options describe: the preset, then every override.
    pub fn catalog(&self) -> Result<TypeCatalog, CatalogError> {
        let mut catalog = TypeCatalog::with_preset(self.preset);
        for entry in &self.overrides {
            match entry {
                Override::Category {
                    category,
                    size,
                    alignment,
                } => catalog.set(*category, *size, *alignment)?,
                Override::Type {
                    spelling,
                    size,
                    alignment,
                } => catalog.set_type(spelling, *size, *alignment)?,
            }
        }
        Ok(catalog)
    }
}

/// Misuse of the command line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("unknown option `{0}`")]
    UnknownOption(String),

    #[error("option `{0}` needs a value")]
    MissingValue(&'static str),

    #[error("option `{0}` does not take a value")]
    UnexpectedValue(&'static str),

    #[error("invalid value `{value}` for `{flag}`, expected {expected}")]
    InvalidValue {
        flag: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("missing type name")]
    MissingTypeName,

    #[error("missing source code: pass it after the type name or use --file")]
    MissingSource,

    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flag {
    Help,
    Version,
    Bare,
    Verbose,
    Optimize,
    File,
    Preset,
    Set,
    SetType,
}

impl Flag {
    const ALL: [Flag; 9] = [
        Flag::Help,
        Flag::Version,
        Flag::Bare,
        Flag::Verbose,
        Flag::Optimize,
        Flag::File,
        Flag::Preset,
        Flag::Set,
        Flag::SetType,
    ];

    fn name(self) -> &'static str {
        match self {
            Flag::Help => "--help",
            Flag::Version => "--version",
            Flag::Bare => "--bare",
            Flag::Verbose => "--verbose",
            Flag::Optimize => "--optimize",
            Flag::File => "--file",
            Flag::Preset => "--preset",
            Flag::Set => "--set",
            Flag::SetType => "--set-type",
        }
    }

    fn takes_value(self) -> bool {
        matches!(self, Flag::File | Flag::Preset | Flag::Set | Flag::SetType)
    }

    /// Look a flag up by its name without dashes; `-h` is accepted for help.
    fn lookup(name: &str) -> Option<Flag> {
        if name == "h" {
            return Some(Flag::Help);
        }
        Flag::ALL.into_iter().find(|flag| &flag.name()[2..] == name)
    }
}

/// Parse the arguments that follow the program name.
pub fn parse_args<I, S>(args: I) -> Result<Command, OptionsError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);

    let mut positional = Vec::new();
    let mut help = false;
    let mut version = false;
    let mut bare = false;
    let mut verbose = false;
    let mut optimize = false;
    let mut file = None;
    let mut preset = Preset::default();
    let mut overrides = Vec::new();

    while let Some(arg) = args.next() {
        if arg == "--" {
            positional.extend(args.by_ref());
            break;
        }
        let Some(body) = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')) else {
            positional.push(arg);
            continue;
        };

        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value.to_owned())),
            None => (body, None),
        };
        let flag = Flag::lookup(name).ok_or_else(|| OptionsError::UnknownOption(arg.clone()))?;

        let value = match (flag.takes_value(), inline) {
            (true, Some(value)) => value,
            (true, None) => args.next().ok_or(OptionsError::MissingValue(flag.name()))?,
            (false, Some(_)) => return Err(OptionsError::UnexpectedValue(flag.name())),
            (false, None) => String::new(),
        };

        match flag {
            Flag::Help => help = true,
            Flag::Version => version = true,
            Flag::Bare => bare = true,
            Flag::Verbose => verbose = true,
            Flag::Optimize => optimize = true,
            Flag::File => file = Some(PathBuf::from(value)),
            Flag::Preset => preset = value.parse()?,
            Flag::Set => {
                let (name, size, alignment) = split_override(flag, &value)?;
                overrides.push(Override::Category {
                    category: name.parse()?,
                    size,
                    alignment,
                });
            }
            Flag::SetType => {
                let (spelling, size, alignment) = split_override(flag, &value)?;
                overrides.push(Override::Type {
                    spelling: spelling.to_owned(),
                    size,
                    alignment,
                });
            }
        }
    }

    if help {
        return Ok(Command::Help);
    }
    if version {
        return Ok(Command::Version);
    }

    let mut positional = positional.into_iter();
    let type_name = positional.next().ok_or(OptionsError::MissingTypeName)?;
    let input = match file {
        Some(path) => Input::File(path),
        None => Input::Inline(positional.next().ok_or(OptionsError::MissingSource)?),
    };
    if let Some(extra) = positional.next() {
        return Err(OptionsError::UnexpectedArgument(extra));
    }

    Ok(Command::Run(Options {
        type_name,
        input,
        bare,
        verbose,
        optimize,
        preset,
        overrides,
    }))
}

/// Split `<name>=<size>:<alignment>`.
fn split_override(flag: Flag, value: &str) -> Result<(&str, u64, u64), OptionsError> {
    let invalid = || OptionsError::InvalidValue {
        flag: flag.name(),
        value: value.to_owned(),
        expected: "<name>=<size>:<alignment>",
    };

    let (name, numbers) = value.rsplit_once('=').ok_or_else(invalid)?;
    let (size, alignment) = numbers.split_once(':').ok_or_else(invalid)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid());
    }

    let size = size.trim().parse().map_err(|_| invalid())?;
    let alignment = alignment.trim().parse().map_err(|_| invalid())?;
    Ok((name, size, alignment))
}
