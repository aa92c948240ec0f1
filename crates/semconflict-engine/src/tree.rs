//! Tree-sitter backed source trees.
//!
//! A [`SourceTree`] owns one version of a file together with its concrete
//! syntax tree. It is immutable after parsing and is shared between change
//! records and conflict sides as `Arc<SourceTree>`.
//!
//! Trivia follows tree-sitter's model: "extra" nodes (comments) are
//! structured trivia, and any byte not covered by a non-extra token is
//! whitespace trivia. The tree keeps a sorted index of non-trivia token
//! ranges so trivia queries are binary searches rather than tree walks.

use std::fmt;

use crate::error::{EngineError, Result};
use crate::types::{Language, SpanInterval};

/// One parsed version of a source file.
pub struct SourceTree {
    source: String,
    tree: tree_sitter::Tree,
    language: Language,
    /// Non-extra, non-missing leaf ranges in ascending order.
    tokens: Vec<SpanInterval>,
    declaration_kinds: Vec<String>,
}

impl SourceTree {
    /// Parse `source` with the default declaration kinds for `language`.
    pub fn parse(source: impl Into<String>, language: Language) -> Result<Self> {
        Self::parse_with(source, language, &[])
    }

    /// Parse `source`, additionally treating `extra_declaration_kinds` as
    /// declaration nodes.
    pub fn parse_with(
        source: impl Into<String>,
        language: Language,
        extra_declaration_kinds: &[String],
    ) -> Result<Self> {
        let source = source.into();
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar(language))
            .map_err(|e| EngineError::Grammar {
                language,
                message: e.to_string(),
            })?;

        let tree = parser
            .parse(&source, None)
            .ok_or(EngineError::ParseFailed { language })?;

        let tokens = index_tokens(&tree);
        let declaration_kinds = language
            .declaration_kinds()
            .iter()
            .map(|k| k.to_string())
            .chain(extra_declaration_kinds.iter().cloned())
            .collect();

        Ok(Self {
            source,
            tree,
            language,
            tokens,
            declaration_kinds,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Source text under `span`; empty if the span falls outside the file
    /// or splits a UTF-8 sequence.
    pub fn text(&self, span: SpanInterval) -> &str {
        self.source.get(span.range()).unwrap_or("")
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: self,
            node: self.tree.root_node(),
        }
    }

    /// Smallest node whose range contains `span`.
    pub fn find_node(&self, span: SpanInterval) -> SyntaxNode<'_> {
        let end = span.end().min(self.source.len());
        let start = span.start.min(end);
        let root = self.tree.root_node();
        let node = root.descendant_for_byte_range(start, end).unwrap_or(root);
        SyntaxNode { tree: self, node }
    }

    /// True if no non-trivia token overlaps `span`.
    pub fn covers_only_trivia(&self, span: SpanInterval) -> bool {
        let idx = self.tokens.partition_point(|t| t.end() <= span.start);
        self.tokens
            .get(idx)
            .is_none_or(|t| t.start >= span.end())
    }

    /// Shrink `span` to the first and last non-trivia tokens it overlaps.
    pub fn token_hull(&self, span: SpanInterval) -> Option<SpanInterval> {
        let first = self.tokens.partition_point(|t| t.end() <= span.start);
        let last = self.tokens.partition_point(|t| t.start < span.end());
        if first < last {
            Some(SpanInterval::from_bounds(
                self.tokens[first].start,
                self.tokens[last - 1].end(),
            ))
        } else {
            None
        }
    }

    /// Leading whitespace of the line holding the first token that ends
    /// after `offset`, or `None` when that token does not start its line
    /// or no such token exists.
    pub fn indentation_at(&self, offset: usize) -> Option<&str> {
        let idx = self.tokens.partition_point(|t| t.end() <= offset);
        let token = self.tokens.get(idx)?;
        let line_start = self.source[..token.start].rfind('\n').map_or(0, |i| i + 1);
        let leading = &self.source[line_start..token.start];
        leading
            .chars()
            .all(|c| c == ' ' || c == '\t' || c == '\x0c')
            .then_some(leading)
    }

    /// Trivia surrounding `span`: from the end of the preceding token to
    /// the start of the following one.
    pub(crate) fn trivia_bounds(&self, span: SpanInterval) -> (SpanInterval, SpanInterval) {
        let before = self.tokens.partition_point(|t| t.end() <= span.start);
        let leading_start = before
            .checked_sub(1)
            .map_or(0, |i| self.tokens[i].end());
        let after = self.tokens.partition_point(|t| t.start < span.end());
        let trailing_end = self
            .tokens
            .get(after)
            .map_or(self.source.len(), |t| t.start);
        (
            SpanInterval::from_bounds(leading_start, span.start),
            SpanInterval::from_bounds(span.end(), trailing_end),
        )
    }

    /// Declarations containing `span`, innermost first.
    pub fn enclosing_declarations(&self, span: SpanInterval) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        let mut current = Some(self.find_node(span));
        while let Some(node) = current {
            if self.is_declaration_kind(node.kind()) {
                declarations.push(Declaration {
                    kind: node.kind().to_string(),
                    name: node.declared_name().map(str::to_string),
                    span: node.span(),
                });
            }
            current = node.parent();
        }
        declarations
    }

    fn is_declaration_kind(&self, kind: &str) -> bool {
        self.declaration_kinds.iter().any(|k| k == kind)
    }
}

impl fmt::Debug for SourceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceTree")
            .field("language", &self.language)
            .field("len", &self.source.len())
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

/// A declaration node (function, class, impl block, ...) detached from the
/// tree so it can outlive the borrow.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Declaration {
    pub kind: String,
    pub name: Option<String>,
    pub span: SpanInterval,
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} `{}` at {}", self.kind, name, self.span),
            None => write!(f, "{} at {}", self.kind, self.span),
        }
    }
}

/// Borrowed view of one node in a [`SourceTree`].
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SourceTree,
    node: tree_sitter::Node<'t>,
}

impl<'t> SyntaxNode<'t> {
    pub fn tree(&self) -> &'t SourceTree {
        self.tree
    }

    pub fn kind(&self) -> &'static str {
        self.node.kind()
    }

    pub fn span(&self) -> SpanInterval {
        SpanInterval::from_bounds(self.node.start_byte(), self.node.end_byte())
    }

    pub fn text(&self) -> &'t str {
        self.tree.text(self.span())
    }

    /// Leaf node, i.e. a token.
    pub fn is_token(&self) -> bool {
        self.node.child_count() == 0
    }

    /// The parser expected this token but it is absent from the source.
    pub fn is_missing(&self) -> bool {
        self.node.is_missing()
    }

    /// Structured trivia such as a comment.
    pub fn is_extra(&self) -> bool {
        self.node.is_extra()
    }

    /// This node is, or sits inside, structured trivia.
    pub fn in_structured_trivia(&self) -> bool {
        let mut current = Some(self.node);
        while let Some(node) = current {
            if node.is_extra() {
                return true;
            }
            current = node.parent();
        }
        false
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        self.node.parent().map(|node| SyntaxNode {
            tree: self.tree,
            node,
        })
    }

    /// All direct children, trivia included.
    pub fn children(&self) -> Vec<SyntaxNode<'t>> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .map(|node| SyntaxNode {
                tree: self.tree,
                node,
            })
            .collect()
    }

    /// Direct children that are tokens, excluding trivia.
    pub fn child_tokens(&self) -> Vec<SyntaxNode<'t>> {
        self.children()
            .into_iter()
            .filter(|c| !c.is_extra() && c.is_token())
            .collect()
    }

    /// Direct children that are interior nodes, excluding trivia.
    pub fn child_nodes(&self) -> Vec<SyntaxNode<'t>> {
        self.children()
            .into_iter()
            .filter(|c| !c.is_extra() && !c.is_token())
            .collect()
    }

    /// Name of the entity this node declares, following `declarator`
    /// chains for C-family grammars and falling back to the `type` field
    /// (Rust `impl` blocks).
    pub fn declared_name(&self) -> Option<&'t str> {
        let source = self.tree.source.as_bytes();
        let mut current = self.node;
        loop {
            if let Some(name) = current.child_by_field_name("name") {
                return name.utf8_text(source).ok();
            }
            match current.child_by_field_name("declarator") {
                Some(next) if next.kind().ends_with("identifier") => {
                    return next.utf8_text(source).ok();
                }
                Some(next) => current = next,
                None => break,
            }
        }
        self.node
            .child_by_field_name("type")
            .and_then(|ty| ty.utf8_text(source).ok())
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind(), self.span())
    }
}

fn index_tokens(tree: &tree_sitter::Tree) -> Vec<SpanInterval> {
    let mut tokens = Vec::new();
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        let is_leaf = node.child_count() == 0;
        if !node.is_extra()
            && is_leaf
            && !node.is_missing()
            && node.end_byte() > node.start_byte()
        {
            tokens.push(SpanInterval::from_bounds(node.start_byte(), node.end_byte()));
        }
        // Comments are skipped whole, including any marker children.
        if !node.is_extra() && !is_leaf && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return tokens;
            }
        }
    }
}

/// Get the tree-sitter Language object for a given language.
fn grammar(lang: Language) -> tree_sitter::Language {
    let lang_ref = match lang {
        Language::Rust => tree_sitter_rust::LANGUAGE,
        Language::JavaScript => tree_sitter_javascript::LANGUAGE,
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
        Language::Python => tree_sitter_python::LANGUAGE,
        Language::Java => tree_sitter_java::LANGUAGE,
        Language::Go => tree_sitter_go::LANGUAGE,
        Language::C => tree_sitter_c::LANGUAGE,
        Language::Cpp => tree_sitter_cpp::LANGUAGE,
    };
    lang_ref.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = "fn add(a: i32) -> i32 {\n    // note\n    a + 1\n}\n";

    fn span_of(haystack: &str, needle: &str) -> SpanInterval {
        let start = haystack.find(needle).unwrap();
        SpanInterval::new(start, needle.len())
    }

    #[test]
    fn test_parse_rust() {
        let tree = SourceTree::parse(SRC, Language::Rust).unwrap();
        assert_eq!(tree.root().kind(), "source_file");
        assert_eq!(tree.language(), Language::Rust);
        assert_eq!(tree.text(span_of(SRC, "a + 1")), "a + 1");
    }

    #[test]
    fn test_text_out_of_range_is_empty() {
        let tree = SourceTree::parse(SRC, Language::Rust).unwrap();
        assert_eq!(tree.text(SpanInterval::new(SRC.len() - 1, 10)), "");
    }

    #[test]
    fn test_find_node_smallest_container() {
        let tree = SourceTree::parse(SRC, Language::Rust).unwrap();
        let node = tree.find_node(span_of(SRC, "a + 1"));
        assert_eq!(node.kind(), "binary_expression");
        assert_eq!(node.text(), "a + 1");
    }

    #[test]
    fn test_comment_is_trivia() {
        let tree = SourceTree::parse(SRC, Language::Rust).unwrap();
        let comment = span_of(SRC, "// note");
        assert!(tree.covers_only_trivia(comment));
        assert!(tree.find_node(comment).in_structured_trivia());
        assert!(tree.token_hull(comment).is_none());
    }

    #[test]
    fn test_code_is_not_trivia() {
        let tree = SourceTree::parse(SRC, Language::Rust).unwrap();
        assert!(!tree.covers_only_trivia(span_of(SRC, "a + 1")));
        assert!(!tree.covers_only_trivia(span_of(SRC, "+")));
        // empty span strictly inside the `add` identifier
        assert!(!tree.covers_only_trivia(SpanInterval::new(SRC.find("add").unwrap() + 1, 0)));
    }

    #[test]
    fn test_token_hull_trims_whitespace() {
        let tree = SourceTree::parse(SRC, Language::Rust).unwrap();
        let line = span_of(SRC, "    a + 1\n");
        assert_eq!(tree.token_hull(line), Some(span_of(SRC, "a + 1")));
    }

    #[test]
    fn test_trivia_bounds() {
        let tree = SourceTree::parse(SRC, Language::Rust).unwrap();
        let expr = span_of(SRC, "a + 1");
        let (leading, trailing) = tree.trivia_bounds(expr);
        assert_eq!(leading.end(), expr.start);
        assert_eq!(tree.text(leading), "\n    // note\n    ");
        assert_eq!(tree.text(trailing), "\n");
    }

    #[test]
    fn test_indentation_at() {
        let src = "def f():\n    # note\n    x = g(1,\n          2)\n";
        let tree = SourceTree::parse(src, Language::Python).unwrap();
        // the comment line is skipped; `x` starts the next code line
        assert_eq!(tree.indentation_at(src.find("# note").unwrap()), Some("    "));
        assert_eq!(tree.indentation_at(0), Some(""));
        // `2` starts a continuation line, `g` does not start its line
        assert_eq!(tree.indentation_at(src.find('2').unwrap()), Some("          "));
        assert_eq!(tree.indentation_at(src.find('g').unwrap()), None);
        assert_eq!(tree.indentation_at(src.len()), None);
    }

    #[test]
    fn test_enclosing_declarations() {
        let src = "impl Counter {\n    fn bump(&mut self) {\n        self.n += 1;\n    }\n}\n";
        let tree = SourceTree::parse(src, Language::Rust).unwrap();
        let decls = tree.enclosing_declarations(span_of(src, "self.n += 1"));
        let names: Vec<_> = decls.iter().map(|d| d.name.as_deref()).collect();
        assert_eq!(names, vec![Some("bump"), Some("Counter")]);
        assert_eq!(decls[0].kind, "function_item");
        assert_eq!(decls[1].kind, "impl_item");
    }

    #[test]
    fn test_extra_declaration_kinds() {
        let src = "fn main() {\n    let x = compute();\n}\n";
        let extra = vec!["let_declaration".to_string()];
        let tree = SourceTree::parse_with(src, Language::Rust, &extra).unwrap();
        let decls = tree.enclosing_declarations(span_of(src, "compute()"));
        assert_eq!(decls[0].kind, "let_declaration");
        assert_eq!(decls[1].name.as_deref(), Some("main"));
    }

    #[test]
    fn test_c_declarator_name() {
        let src = "int square(int x) {\n    return x * x;\n}\n";
        let tree = SourceTree::parse(src, Language::C).unwrap();
        let decls = tree.enclosing_declarations(span_of(src, "x * x"));
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name.as_deref(), Some("square"));
    }

    #[test]
    fn test_child_tokens_skip_comments() {
        let src = "fn f() {\n    // lead\n    g();\n}\n";
        let tree = SourceTree::parse(src, Language::Rust).unwrap();
        let block = tree.find_node(span_of(src, "{\n    // lead\n    g();\n}"));
        assert_eq!(block.kind(), "block");
        let tokens: Vec<_> = block.child_tokens().iter().map(|t| t.kind()).collect();
        assert_eq!(tokens, vec!["{", "}"]);
        assert!(block.children().iter().any(|c| c.is_extra()));
    }
}
