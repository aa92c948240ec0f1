//! # semconflict-engine
//!
//! Structural three-way conflict detection that tells formatting-only merge
//! conflicts apart from semantic ones.
//!
//! ## Approach
//!
//! 1. **Structural diff**: each side is diffed against the common ancestor
//!    and every edit is re-projected into the changed file's coordinates.
//! 2. **Merged grouping**: local and remote edits are merged by ancestor
//!    position and scanned greedily into overlap groups. Every group with
//!    two or more edits is a conflict.
//! 3. **Trivia-aware equivalence**: syntax subtrees are compared while
//!    ignoring whitespace and comments, so reformatting never counts as a
//!    change of meaning.
//! 4. **Analysis**: conflicts are classified, and declarations that both
//!    sides changed without overlapping are reported separately.
//!
//! Parsing uses tree-sitter; supported languages are Rust, JavaScript,
//! TypeScript, Python, Java, Go, C and C++.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use semconflict_engine::{Language, SourceTree, ThreeWayConflictDetector};
//!
//! let parse = |src: &str| SourceTree::parse(src, Language::Rust).map(Arc::new);
//! let ancestor = parse("fn f() -> i32 {\n    1\n}\n")?;
//! let local = parse("fn f() -> i32 {\n    2\n}\n")?;
//! let remote = parse("fn f() -> i32 {\n    3\n}\n")?;
//!
//! let detector = ThreeWayConflictDetector::default();
//! for conflict in detector.compare(&ancestor, &local, &remote)? {
//!     let base = conflict.ancestor().map(|info| info.text()).unwrap_or_default();
//!     println!("conflict over {base:?}");
//! }
//! # Ok::<(), semconflict_engine::EngineError>(())
//! ```

pub mod analyzer;
pub mod change;
pub mod conflict;
pub mod detector;
pub mod diff;
pub mod equivalence;
pub mod error;
pub mod merge_queue;
pub mod tree;
pub mod types;

pub use analyzer::{AnalysisReport, ClassifiedConflict, ConflictAnalyzer, SharedDeclaration, Verdict};
pub use change::{ChangeRecord, TaggedChange};
pub use conflict::{Conflict, ConflictInfo};
pub use detector::{Conflicts, ThreeWayConflictDetector, group_conflicts};
pub use diff::{ChangeRecords, StructuralDiff, TextEdit, diff_text};
pub use equivalence::{contexts_differ, is_semantic_change, is_span_in_node_trivia};
pub use error::{EngineError, Result};
pub use merge_queue::MergeQueue;
pub use semconflict_core::{AnalysisSettings, DiffGranularity};
pub use tree::{Declaration, SourceTree, SyntaxNode};
pub use types::{Language, OriginTag, SpanInterval};
