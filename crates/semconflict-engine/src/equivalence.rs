//! Trivia-aware structural equivalence.
//!
//! Two subtrees are equivalent when they have the same shape once comments
//! and whitespace are ignored: same node kinds all the way down, and the
//! same tokens in the same positions. Tokens compare by kind, by text and
//! by the parser's "missing" flag, so a statement whose terminator was
//! inserted by error recovery never equals one where it is present.

use crate::tree::SyntaxNode;
use crate::types::SpanInterval;

/// True if `a` and `b` differ in a way that formatting and comments alone
/// cannot explain.
pub fn is_semantic_change(a: SyntaxNode<'_>, b: SyntaxNode<'_>) -> bool {
    if a.kind() != b.kind() {
        return true;
    }
    if a.in_structured_trivia() && b.in_structured_trivia() {
        return false;
    }
    subtrees_differ(a, b)
}

// Children reached from here are never extras, so the trivia check above
// is not repeated on the way down.
fn subtrees_differ(a: SyntaxNode<'_>, b: SyntaxNode<'_>) -> bool {
    if a.kind() != b.kind() {
        return true;
    }
    match (a.is_token(), b.is_token()) {
        (true, true) => return tokens_differ(a, b),
        (false, false) => {}
        _ => return true,
    }

    let a_tokens = a.child_tokens();
    let b_tokens = b.child_tokens();
    if a_tokens.len() != b_tokens.len() {
        return true;
    }
    if a_tokens
        .iter()
        .zip(&b_tokens)
        .any(|(x, y)| x.kind() != y.kind() || tokens_differ(*x, *y))
    {
        return true;
    }

    let a_nodes = a.child_nodes();
    let b_nodes = b.child_nodes();
    if a_nodes.len() != b_nodes.len() {
        return true;
    }
    a_nodes
        .iter()
        .zip(&b_nodes)
        .any(|(x, y)| subtrees_differ(*x, *y))
}

/// True if `a` and `b` sit under different chains of enclosing node kinds.
///
/// Two equal subtrees can still mean different things when they moved, e.g.
/// a Python statement dedented out of a function body.
pub fn contexts_differ(a: SyntaxNode<'_>, b: SyntaxNode<'_>) -> bool {
    let mut a_parent = a.parent();
    let mut b_parent = b.parent();
    loop {
        match (a_parent, b_parent) {
            (None, None) => return false,
            (Some(x), Some(y)) if x.kind() == y.kind() => {
                a_parent = x.parent();
                b_parent = y.parent();
            }
            _ => return true,
        }
    }
}

fn tokens_differ(a: SyntaxNode<'_>, b: SyntaxNode<'_>) -> bool {
    a.is_missing() != b.is_missing() || a.text() != b.text()
}

/// True if `span` touches nothing but trivia around `node`: the span is
/// empty, the node is (inside) a comment, or the span lies entirely in the
/// whitespace and comments between the node and its neighbouring tokens.
pub fn is_span_in_node_trivia(span: SpanInterval, node: SyntaxNode<'_>) -> bool {
    if span.is_empty() || node.in_structured_trivia() {
        return true;
    }
    let (leading, trailing) = node.tree().trivia_bounds(node.span());
    leading.contains_span(&span) || trailing.contains_span(&span)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::tree::SourceTree;
    use crate::types::Language;

    const ORIGINAL: &str = "\
fn sum(n: i32) -> i32 {
    // accumulate
    let mut total = 0;
    for i in 0..n {
        total = i + total;
    }
    total
}
";

    const REFORMATTED: &str = "\
fn sum(n: i32) -> i32 {

    // add them all up
    let mut total = 0;

    for i in 0..n {
        /* body */
        total = i + total;
    }

    total
}
";

    fn rust(src: &str) -> SourceTree {
        SourceTree::parse(src, Language::Rust).unwrap()
    }

    fn span_of(haystack: &str, needle: &str) -> SpanInterval {
        SpanInterval::new(haystack.find(needle).unwrap(), needle.len())
    }

    #[test]
    fn test_identical_is_not_semantic() {
        let a = rust(ORIGINAL);
        let b = rust(ORIGINAL);
        assert!(!is_semantic_change(a.root(), b.root()));
    }

    #[test]
    fn test_blank_lines_and_comments_are_not_semantic() {
        let a = rust(ORIGINAL);
        let b = rust(REFORMATTED);
        assert!(!is_semantic_change(a.root(), b.root()));
    }

    #[test]
    fn test_operator_rewrite_is_semantic() {
        let a = rust(ORIGINAL);
        let b = rust(&ORIGINAL.replace("total = i + total;", "total += i;"));
        assert!(is_semantic_change(a.root(), b.root()));
    }

    #[test]
    fn test_identifier_change_is_semantic() {
        let a = rust(ORIGINAL);
        let b = rust(&ORIGINAL.replace("i + total", "n + total"));
        assert!(is_semantic_change(a.root(), b.root()));
    }

    #[test]
    fn test_literal_change_is_semantic() {
        let a = rust(ORIGINAL);
        let b = rust(&ORIGINAL.replace("total = 0", "total = 1"));
        assert!(is_semantic_change(a.root(), b.root()));
    }

    #[test]
    fn test_missing_terminator_is_semantic() {
        let with = "class A {\n    void f() {\n        x = 1;\n    }\n}\n";
        let without = "class A {\n    void f() {\n        x = 1\n    }\n}\n";
        let a = SourceTree::parse(with, Language::Java).unwrap();
        let b = SourceTree::parse(without, Language::Java).unwrap();
        assert!(is_semantic_change(a.root(), b.root()));
    }

    #[test]
    fn test_kind_mismatch_at_root_is_semantic() {
        let a = rust(ORIGINAL);
        let stmt = a.find_node(span_of(ORIGINAL, "let mut total = 0;"));
        let expr = a.find_node(span_of(ORIGINAL, "i + total"));
        assert_ne!(stmt.kind(), expr.kind());
        assert!(is_semantic_change(stmt, expr));
    }

    #[test]
    fn test_comment_nodes_compare_as_trivia() {
        let a = rust(ORIGINAL);
        let b = rust(REFORMATTED);
        let c1 = a.find_node(span_of(ORIGINAL, "// accumulate"));
        let c2 = b.find_node(span_of(REFORMATTED, "// add them all up"));
        assert!(c1.is_extra());
        assert!(!is_semantic_change(c1, c2));
    }

    #[test]
    fn test_deep_expression_chain_compares_quickly() {
        let terms: Vec<String> = (0..1000).map(|i| format!("\"s{i}\"")).collect();
        let src = format!("const q = {};\n", terms.join(" + "));
        let a = SourceTree::parse(src.as_str(), Language::JavaScript).unwrap();
        let b = SourceTree::parse(src.as_str(), Language::JavaScript).unwrap();
        let changed = SourceTree::parse(src.replace("\"s999\"", "\"t999\""), Language::JavaScript).unwrap();

        let started = Instant::now();
        assert!(!is_semantic_change(a.root(), b.root()));
        assert!(is_semantic_change(a.root(), changed.root()));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_moved_statement_has_different_context() {
        let base = "def f():\n    x = 1\n    y = 2\n";
        let dedented = "def f():\n    x = 1\ny = 2\n";
        let a = SourceTree::parse(base, Language::Python).unwrap();
        let b = SourceTree::parse(dedented, Language::Python).unwrap();
        let before = a.find_node(span_of(base, "y = 2"));
        let after = b.find_node(span_of(dedented, "y = 2"));
        assert!(!is_semantic_change(before, after));
        assert!(contexts_differ(before, after));
        assert!(is_semantic_change(a.root(), b.root()));
    }

    #[test]
    fn test_reformatted_statement_keeps_context() {
        let a = rust(ORIGINAL);
        let b = rust(REFORMATTED);
        let before = a.find_node(span_of(ORIGINAL, "total = i + total;"));
        let after = b.find_node(span_of(REFORMATTED, "total = i + total;"));
        assert!(!contexts_differ(before, after));
    }

    #[test]
    fn test_empty_span_is_trivia() {
        let a = rust(ORIGINAL);
        let node = a.find_node(span_of(ORIGINAL, "i + total"));
        assert!(is_span_in_node_trivia(SpanInterval::new(node.span().start + 1, 0), node));
    }

    #[test]
    fn test_span_in_leading_trivia() {
        let a = rust(ORIGINAL);
        let node = a.find_node(span_of(ORIGINAL, "let mut total = 0;"));
        assert_eq!(node.kind(), "let_declaration");
        assert!(is_span_in_node_trivia(span_of(ORIGINAL, "// accumulate"), node));
        let brace_end = ORIGINAL.find('{').unwrap() + 1;
        let whole_gap = SpanInterval::from_bounds(brace_end, node.span().start);
        assert_eq!(a.text(whole_gap), "\n    // accumulate\n    ");
        assert!(is_span_in_node_trivia(whole_gap, node));
    }

    #[test]
    fn test_span_in_trailing_trivia() {
        let a = rust(ORIGINAL);
        let node = a.find_node(span_of(ORIGINAL, "total = i + total;"));
        let end = node.span().end();
        assert!(is_span_in_node_trivia(SpanInterval::new(end, 1), node));
    }

    #[test]
    fn test_span_touching_code_is_not_trivia() {
        let a = rust(ORIGINAL);
        let node = a.find_node(span_of(ORIGINAL, "let mut total = 0;"));
        assert!(!is_span_in_node_trivia(span_of(ORIGINAL, "total = 0"), node));
        let comment_and_code = span_of(ORIGINAL, "// accumulate\n    let");
        assert!(!is_span_in_node_trivia(comment_and_code, node));
    }

    #[test]
    fn test_span_inside_comment_node() {
        let a = rust(ORIGINAL);
        let comment = a.find_node(span_of(ORIGINAL, "// accumulate"));
        assert!(is_span_in_node_trivia(span_of(ORIGINAL, "accumulate"), comment));
    }
}
