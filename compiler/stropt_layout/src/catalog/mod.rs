//! Primitive type catalog.
//!
//! Maps canonical primitive spellings (`unsigned long long`, `int32_t`, ...)
//! to their size and alignment on the target, alongside the pointer and enum
//! entries. A catalog is configured once, from a [`Preset`] plus optional
//! overrides, and then lent immutably to the resolver.
//!
//! # Categories
//!
//! Every C integer and floating spelling belongs to exactly one
//! [`Category`]; setting a category updates all of its spellings at once.
//! The `<stdint.h>` names are seeded with their 64-bit values and only
//! change through [`TypeCatalog::set_type`].

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;

use crate::CatalogError;

/// Size and alignment of a primitive, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeMeta {
    pub size: u64,
    pub alignment: u64,
}

impl TypeMeta {
    #[inline]
    pub const fn new(size: u64, alignment: u64) -> Self {
        Self { size, alignment }
    }
}

/// A configurable group of primitive spellings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Pointer,
    Enum,
    Char,
    Short,
    Int,
    Long,
    LongLong,
    Float,
    Double,
    LongDouble,
}

impl Category {
    /// All categories, in the order presets apply them.
    pub const ALL: [Category; 10] = [
        Category::Pointer,
        Category::Enum,
        Category::Char,
        Category::Short,
        Category::Int,
        Category::Long,
        Category::LongLong,
        Category::Float,
        Category::Double,
        Category::LongDouble,
    ];

    /// The name used on the command line and in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Category::Pointer => "pointer",
            Category::Enum => "enum",
            Category::Char => "char",
            Category::Short => "short",
            Category::Int => "int",
            Category::Long => "long",
            Category::LongLong => "long-long",
            Category::Float => "float",
            Category::Double => "double",
            Category::LongDouble => "long-double",
        }
    }

    /// The catalog spellings covered by this category.
    ///
    /// Pointer and enum have no spellings: they live in dedicated slots.
    pub fn spellings(self) -> &'static [&'static str] {
        match self {
            Category::Pointer | Category::Enum => &[],
            Category::Char => &["char", "signed char", "unsigned char"],
            Category::Short => &[
                "short",
                "short int",
                "signed short",
                "signed short int",
                "unsigned short",
                "unsigned short int",
            ],
            Category::Int => &["int", "signed", "signed int", "unsigned", "unsigned int"],
            Category::Long => &[
                "long",
                "long int",
                "signed long",
                "signed long int",
                "unsigned long",
                "unsigned long int",
            ],
            Category::LongLong => &[
                "long long",
                "long long int",
                "signed long long",
                "signed long long int",
                "unsigned long long",
                "unsigned long long int",
            ],
            Category::Float => &["float"],
            Category::Double => &["double"],
            Category::LongDouble => &["long double"],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Category::ALL
            .into_iter()
            .find(|category| category.name() == normalized)
            .ok_or_else(|| CatalogError::UnknownCategory(s.to_owned()))
    }
}

/// A named bundle of category values describing a target platform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Preset {
    /// LP64: 8-byte pointers and longs, 16-byte `long double`.
    #[default]
    Bits64,
    /// ILP32 (i386 System V): 8-byte `long long`/`double` aligned to 4.
    Bits32,
    /// AVR-like 8-bit target: 16-bit `int` and pointers, everything byte aligned.
    Avr8,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Bits64, Preset::Bits32, Preset::Avr8];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Bits64 => "64bit",
            Preset::Bits32 => "32bit",
            Preset::Avr8 => "avr8",
        }
    }

    /// Size and alignment of `category` under this preset.
    pub fn meta(self, category: Category) -> TypeMeta {
        use Category as C;

        let (size, alignment) = match (self, category) {
            (Preset::Bits64, C::Pointer | C::Long | C::LongLong | C::Double) => (8, 8),
            (Preset::Bits64, C::Enum | C::Int | C::Float) => (4, 4),
            (Preset::Bits64, C::Char) => (1, 1),
            (Preset::Bits64, C::Short) => (2, 2),
            (Preset::Bits64, C::LongDouble) => (16, 16),

            (Preset::Bits32, C::Pointer | C::Enum | C::Int | C::Long | C::Float) => (4, 4),
            (Preset::Bits32, C::Char) => (1, 1),
            (Preset::Bits32, C::Short) => (2, 2),
            (Preset::Bits32, C::LongLong | C::Double) => (8, 4),
            (Preset::Bits32, C::LongDouble) => (12, 4),

            (Preset::Avr8, C::Char) => (1, 1),
            (Preset::Avr8, C::Pointer | C::Enum | C::Short | C::Int) => (2, 1),
            (Preset::Avr8, C::Long | C::Float | C::Double) => (4, 1),
            (Preset::Avr8, C::LongLong | C::LongDouble) => (8, 1),
        };
        TypeMeta::new(size, alignment)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == normalized)
            .ok_or_else(|| CatalogError::UnknownPreset(s.to_owned()))
    }
}

/// Spellings outside any category, with their 64-bit values.
const FIXED_WIDTH: &[(&str, u64)] = &[
    ("_Bool", 1),
    ("int8_t", 1),
    ("uint8_t", 1),
    ("int16_t", 2),
    ("uint16_t", 2),
    ("int32_t", 4),
    ("uint32_t", 4),
    ("int64_t", 8),
    ("uint64_t", 8),
    ("intptr_t", 8),
    ("uintptr_t", 8),
    ("int_least8_t", 1),
    ("uint_least8_t", 1),
    ("int_least16_t", 2),
    ("uint_least16_t", 2),
    ("int_least32_t", 4),
    ("uint_least32_t", 4),
    ("int_least64_t", 8),
    ("uint_least64_t", 8),
    ("int_fast8_t", 1),
    ("uint_fast8_t", 1),
    ("int_fast16_t", 8),
    ("uint_fast16_t", 8),
    ("int_fast32_t", 8),
    ("uint_fast32_t", 8),
    ("int_fast64_t", 8),
    ("uint_fast64_t", 8),
    ("intmax_t", 8),
    ("uintmax_t", 8),
    ("size_t", 8),
    ("ptrdiff_t", 8),
];

/// Size/alignment table for primitive types on one target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeCatalog {
    primitives: FxHashMap<String, TypeMeta>,
    pointer: TypeMeta,
    enumeration: TypeMeta,
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::with_preset(Preset::default())
    }
}

impl TypeCatalog {
    /// A catalog for the default 64-bit target.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog configured with `preset`.
    pub fn with_preset(preset: Preset) -> Self {
        let mut primitives = FxHashMap::default();
        for &(spelling, width) in FIXED_WIDTH {
            primitives.insert(spelling.to_owned(), TypeMeta::new(width, width));
        }

        let mut catalog = TypeCatalog {
            primitives,
            pointer: TypeMeta::new(8, 8),
            enumeration: TypeMeta::new(4, 4),
        };
        catalog.apply_preset(preset);
        catalog
    }

    /// Overwrite every category with the values of `preset`.
    ///
    /// Equivalent to calling [`set`](Self::set) once per category.
    pub fn apply_preset(&mut self, preset: Preset) {
        tracing::debug!(%preset, "applying catalog preset");
        for category in Category::ALL {
            let meta = preset.meta(category);
            self.store(category, meta);
        }
    }

    /// Set the size and alignment of every spelling in `category`.
    ///
    /// Fails without touching the table if either value is zero.
    pub fn set(&mut self, category: Category, size: u64, alignment: u64) -> Result<(), CatalogError> {
        if size == 0 || alignment == 0 {
            return Err(CatalogError::InvalidSizeAlignment {
                category: category.name().to_owned(),
            });
        }
        tracing::debug!(%category, size, alignment, "catalog override");
        self.store(category, TypeMeta::new(size, alignment));
        Ok(())
    }

    /// Set the size and alignment of a single spelling.
    ///
    /// Adds the spelling if the catalog did not know it, which is how
    /// target-specific typedefs (`int64_t` on a 32-bit target, say) are
    /// adjusted.
    pub fn set_type(&mut self, spelling: &str, size: u64, alignment: u64) -> Result<(), CatalogError> {
        if size == 0 || alignment == 0 {
            return Err(CatalogError::InvalidSizeAlignment {
                category: spelling.to_owned(),
            });
        }
        tracing::debug!(spelling, size, alignment, "catalog spelling override");
        self.primitives
            .insert(spelling.to_owned(), TypeMeta::new(size, alignment));
        Ok(())
    }

    fn store(&mut self, category: Category, meta: TypeMeta) {
        match category {
            Category::Pointer => self.pointer = meta,
            Category::Enum => self.enumeration = meta,
            _ => {
                for spelling in category.spellings() {
                    self.primitives.insert((*spelling).to_owned(), meta);
                }
            }
        }
    }

    /// Look up an unqualified primitive spelling.
    #[inline]
    pub fn lookup(&self, unqualified: &str) -> Option<TypeMeta> {
        self.primitives.get(unqualified).copied()
    }

    /// Whether `unqualified` names a primitive.
    #[inline]
    pub fn contains(&self, unqualified: &str) -> bool {
        self.primitives.contains_key(unqualified)
    }

    /// Size and alignment of any data or function pointer.
    #[inline]
    pub fn pointer(&self) -> TypeMeta {
        self.pointer
    }

    /// Size and alignment of any enum.
    #[inline]
    pub fn enumeration(&self) -> TypeMeta {
        self.enumeration
    }
}
