//! Aggregate fields.
//!
//! A [`Field`] is one entry of a struct, union or enum. The variants carry
//! exactly what the resolver needs to size them: a type spelling for value
//! and array fields, nothing for pointers (their size is the pointer size
//! whatever they point to), and only a name for enumerators.

use std::fmt;

/// Qualifiers that affect access or storage but never layout.
const NON_LAYOUT_QUALIFIERS: &[&str] = &[
    "const", "volatile", "restrict", "_Atomic", "static", "extern", "register", "auto",
];

/// Shared behavior of every field variant.
pub trait FieldType {
    /// Full type spelling, qualifiers included (`const unsigned int`).
    fn type_spelling(&self) -> String;

    /// Type spelling with access/storage qualifiers stripped, in the
    /// canonical word order used as catalog keys (`unsigned long int`).
    fn unqualified_type(&self) -> String;

    /// Field name as it appears in a declaration (`arr[8]` for arrays).
    fn declaration(&self) -> String;
}

/// A value field of a primitive or aggregate type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Basic {
    /// Every specifier before the last one, in source order
    /// (`["const", "unsigned", "long"]` for `const unsigned long long`).
    pub qualifiers: Vec<String>,
    /// The last specifier (`long`, `int32_t`, `struct inner`).
    pub type_name: String,
    pub name: String,
}

impl Basic {
    pub fn new(qualifiers: Vec<String>, type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Basic {
            qualifiers,
            type_name: type_name.into(),
            name: name.into(),
        }
    }
}

impl FieldType for Basic {
    fn type_spelling(&self) -> String {
        let mut words: Vec<&str> = self.qualifiers.iter().map(String::as_str).collect();
        words.push(&self.type_name);
        words.join(" ")
    }

    fn unqualified_type(&self) -> String {
        let words: Vec<&str> = self
            .qualifiers
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.type_name.as_str()))
            .filter(|word| !NON_LAYOUT_QUALIFIERS.contains(word))
            .collect();
        canonical_spelling(&words)
    }

    fn declaration(&self) -> String {
        self.name.clone()
    }
}

/// A pointer to any type, possibly several levels deep.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pointer {
    pub basic: Basic,
    /// Qualifiers on the outermost pointer (`const` in `int *const p`).
    pub pointer_qualifiers: Vec<String>,
    /// Number of `*` levels; at least one.
    pub depth: u32,
}

impl Pointer {
    pub fn new(basic: Basic, pointer_qualifiers: Vec<String>) -> Self {
        Pointer {
            basic,
            pointer_qualifiers,
            depth: 1,
        }
    }

    #[must_use]
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth.max(1);
        self
    }

    fn stars(&self) -> String {
        "*".repeat(self.depth as usize)
    }
}

impl FieldType for Pointer {
    fn type_spelling(&self) -> String {
        let mut spelling = format!("{} {}", self.basic.type_spelling(), self.stars());
        for qualifier in &self.pointer_qualifiers {
            spelling.push(' ');
            spelling.push_str(qualifier);
        }
        spelling
    }

    fn unqualified_type(&self) -> String {
        format!("{} {}", self.basic.unqualified_type(), self.stars())
    }

    fn declaration(&self) -> String {
        self.basic.name.clone()
    }
}

/// A fixed-size array; multi-dimensional arrays are flattened.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Array {
    pub basic: Basic,
    pub elements: u64,
}

impl Array {
    pub fn new(basic: Basic, elements: u64) -> Self {
        Array { basic, elements }
    }
}

impl FieldType for Array {
    fn type_spelling(&self) -> String {
        format!("{}[{}]", self.basic.type_spelling(), self.elements)
    }

    /// The element type: this is what the catalog is queried with.
    fn unqualified_type(&self) -> String {
        self.basic.unqualified_type()
    }

    fn declaration(&self) -> String {
        format!("{}[{}]", self.basic.name, self.elements)
    }
}

/// A function pointer: `ret (*name)(args)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FuncPointer {
    pub return_type: String,
    pub name: String,
    pub args: Vec<String>,
}

impl FuncPointer {
    pub fn new(return_type: impl Into<String>, name: impl Into<String>, args: Vec<String>) -> Self {
        FuncPointer {
            return_type: return_type.into(),
            name: name.into(),
            args,
        }
    }
}

impl FieldType for FuncPointer {
    fn type_spelling(&self) -> String {
        format!("{} (*)({})", self.return_type, self.args.join(", "))
    }

    fn unqualified_type(&self) -> String {
        self.type_spelling()
    }

    fn declaration(&self) -> String {
        self.name.clone()
    }
}

/// One entry of a struct, union or enum.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Field {
    Basic(Basic),
    Pointer(Pointer),
    Array(Array),
    FuncPointer(FuncPointer),
    /// An enumerator; it carries no layout of its own.
    EnumEntry(String),
}

impl Field {
    /// The field name, without array extents.
    pub fn name(&self) -> &str {
        match self {
            Field::Basic(basic) => &basic.name,
            Field::Pointer(pointer) => &pointer.basic.name,
            Field::Array(array) => &array.basic.name,
            Field::FuncPointer(fp) => &fp.name,
            Field::EnumEntry(name) => name,
        }
    }
}

impl FieldType for Field {
    fn type_spelling(&self) -> String {
        match self {
            Field::Basic(basic) => basic.type_spelling(),
            Field::Pointer(pointer) => pointer.type_spelling(),
            Field::Array(array) => array.type_spelling(),
            Field::FuncPointer(fp) => fp.type_spelling(),
            Field::EnumEntry(name) => name.clone(),
        }
    }

    fn unqualified_type(&self) -> String {
        match self {
            Field::Basic(basic) => basic.unqualified_type(),
            Field::Pointer(pointer) => pointer.unqualified_type(),
            Field::Array(array) => array.unqualified_type(),
            Field::FuncPointer(fp) => fp.unqualified_type(),
            Field::EnumEntry(name) => name.clone(),
        }
    }

    fn declaration(&self) -> String {
        match self {
            Field::Basic(basic) => basic.declaration(),
            Field::Pointer(pointer) => pointer.declaration(),
            Field::Array(array) => array.declaration(),
            Field::FuncPointer(fp) => fp.declaration(),
            Field::EnumEntry(name) => name.clone(),
        }
    }
}

impl From<Basic> for Field {
    fn from(basic: Basic) -> Self {
        Field::Basic(basic)
    }
}

impl From<Pointer> for Field {
    fn from(pointer: Pointer) -> Self {
        Field::Pointer(pointer)
    }
}

impl From<Array> for Field {
    fn from(array: Array) -> Self {
        Field::Array(array)
    }
}

impl From<FuncPointer> for Field {
    fn from(fp: FuncPointer) -> Self {
        Field::FuncPointer(fp)
    }
}

/// Renders the field as a C member declaration, without the trailing `;`.
impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Basic(basic) => write!(f, "{} {}", basic.type_spelling(), basic.name),
            Field::Pointer(pointer) => {
                write!(f, "{} {}", pointer.basic.type_spelling(), pointer.stars())?;
                if !pointer.pointer_qualifiers.is_empty() {
                    write!(f, "{} ", pointer.pointer_qualifiers.join(" "))?;
                }
                f.write_str(&pointer.basic.name)
            }
            Field::Array(array) => write!(
                f,
                "{} {}[{}]",
                array.basic.type_spelling(),
                array.basic.name,
                array.elements
            ),
            Field::FuncPointer(fp) => {
                write!(f, "{} (*{})({})", fp.return_type, fp.name, fp.args.join(", "))
            }
            Field::EnumEntry(name) => f.write_str(name),
        }
    }
}

/// Whether an unqualified spelling denotes a data or function pointer
/// (`char *`, `void (*)(int)`), as array element types do.
pub(crate) fn is_pointer_spelling(spelling: &str) -> bool {
    spelling.ends_with('*') || spelling.contains("(*)")
}

/// Put a run of arithmetic keywords in catalog order: sign, then
/// `short`/`long`, then the base keyword. Anything else keeps source order.
fn canonical_spelling(words: &[&str]) -> String {
    const ARITHMETIC: &[&str] = &["signed", "unsigned", "short", "long", "int", "char", "double"];

    if words.len() < 2 || !words.iter().all(|word| ARITHMETIC.contains(word)) {
        return words.join(" ");
    }

    let rank = |word: &str| match word {
        "signed" | "unsigned" => 0,
        "short" | "long" => 1,
        _ => 2,
    };
    let mut ordered = words.to_vec();
    ordered.sort_by_key(|word| rank(word));
    ordered.join(" ")
}
