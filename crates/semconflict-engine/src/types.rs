//! Core coordinate and tag types shared by the diff and conflict engine.
//!
//! All positions are byte offsets into the source text of one tree version.
//! A [`SpanInterval`] never carries the tree it belongs to; the owner of the
//! span (a change record or conflict side) decides which coordinate space
//! it lives in.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

/// Half-open byte interval `[start, start + length)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SpanInterval {
    pub start: usize,
    pub length: usize,
}

impl SpanInterval {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Build from `[start, end)`. An inverted pair yields an empty span at `start`.
    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self {
            start,
            length: end.saturating_sub(start),
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// True if `other` lies entirely within `self`.
    pub fn contains_span(&self, other: &SpanInterval) -> bool {
        other.start >= self.start && other.end() <= self.end()
    }

    /// Boundary-inclusive overlap: touching endpoints count, and an empty
    /// span sitting on either boundary of the other intersects it.
    pub fn intersects(&self, other: &SpanInterval) -> bool {
        (other.start <= self.start && self.start <= other.end())
            || (self.start <= other.start && other.start <= self.end())
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(&self, other: &SpanInterval) -> SpanInterval {
        SpanInterval::from_bounds(self.start.min(other.start), self.end().max(other.end()))
    }
}

/// Spans order by `start`; `length` only breaks ties so that `Ord` agrees with `Eq`.
impl Ord for SpanInterval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then(self.length.cmp(&other.length))
    }
}

impl PartialOrd for SpanInterval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Range<usize>> for SpanInterval {
    fn from(range: Range<usize>) -> Self {
        SpanInterval::from_bounds(range.start, range.end)
    }
}

impl fmt::Display for SpanInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end())
    }
}

/// Which side of a three-way comparison an edit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OriginTag {
    /// The working copy edit.
    Local,
    /// The collaborator's in-progress edit.
    Remote,
}

impl fmt::Display for OriginTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginTag::Local => write!(f, "local"),
            OriginTag::Remote => write!(f, "remote"),
        }
    }
}

/// Supported programming languages for tree-sitter parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    JavaScript,
    TypeScript,
    Python,
    Java,
    Go,
    C,
    Cpp,
}

impl Language {
    /// Infer language from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "rs" => Some(Language::Rust),
            "js" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" => Some(Language::TypeScript),
            "py" => Some(Language::Python),
            "java" => Some(Language::Java),
            "go" => Some(Language::Go),
            "c" | "h" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" => Some(Language::Cpp),
            _ => None,
        }
    }

    /// Leading indentation is part of the syntax, not trivia.
    pub fn is_indentation_sensitive(&self) -> bool {
        matches!(self, Language::Python)
    }

    /// Node kinds reported as enclosing declarations for this grammar.
    pub fn declaration_kinds(&self) -> &'static [&'static str] {
        match self {
            Language::Rust => &[
                "function_item",
                "function_signature_item",
                "struct_item",
                "enum_item",
                "union_item",
                "trait_item",
                "impl_item",
                "mod_item",
                "const_item",
                "static_item",
                "type_item",
                "macro_definition",
            ],
            Language::JavaScript => &[
                "function_declaration",
                "generator_function_declaration",
                "class_declaration",
                "method_definition",
            ],
            Language::TypeScript => &[
                "function_declaration",
                "generator_function_declaration",
                "class_declaration",
                "abstract_class_declaration",
                "method_definition",
                "interface_declaration",
                "type_alias_declaration",
                "enum_declaration",
            ],
            Language::Python => &["function_definition", "class_definition"],
            Language::Java => &[
                "class_declaration",
                "interface_declaration",
                "enum_declaration",
                "record_declaration",
                "method_declaration",
                "constructor_declaration",
                "field_declaration",
            ],
            Language::Go => &[
                "function_declaration",
                "method_declaration",
                "type_declaration",
                "const_declaration",
                "var_declaration",
            ],
            Language::C => &[
                "function_definition",
                "struct_specifier",
                "union_specifier",
                "enum_specifier",
                "type_definition",
            ],
            Language::Cpp => &[
                "function_definition",
                "struct_specifier",
                "union_specifier",
                "enum_specifier",
                "class_specifier",
                "namespace_definition",
                "type_definition",
            ],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Rust => "rust",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Go => "go",
            Language::C => "c",
            Language::Cpp => "cpp",
        };
        f.write_str(name)
    }
}
