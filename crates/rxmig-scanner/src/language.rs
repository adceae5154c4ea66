//! Grammar selection and parsing
//!
//! Uses tree-sitter for parsing; a tree containing `ERROR` or `MISSING`
//! nodes is reported as a syntax error.

use crate::error::ScanError;
use std::path::Path;
use tree_sitter::{Node, Parser, Tree};

/// Source dialects with a grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    /// `.ts`
    TypeScript,
    /// `.tsx`
    Tsx,
}

impl SourceLanguage {
    /// Get file extensions for this dialect
    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            SourceLanguage::TypeScript => &["ts", "mts", "cts"],
            SourceLanguage::Tsx => &["tsx"],
        }
    }

    /// Detect dialect from file extension
    #[inline]
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.') {
            "ts" | "mts" | "cts" => Some(SourceLanguage::TypeScript),
            "tsx" => Some(SourceLanguage::Tsx),
            _ => None,
        }
    }

    /// Detect dialect from path
    ///
    /// # Errors
    /// Returns `ScanError::UnsupportedExtension` when no grammar matches
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| ScanError::UnsupportedExtension(ext.to_string()))
    }

    /// Get tree-sitter language
    #[inline]
    #[must_use]
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        match self {
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    /// Parse source into a syntax tree (errors are kept inside the tree)
    ///
    /// # Errors
    /// - `ScanError::ParserInit` if the grammar fails to load
    /// - `ScanError::ParseFailed` if the parser gives up
    pub fn parse(&self, source: &str) -> Result<Tree, ScanError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.tree_sitter_language())
            .map_err(|e| ScanError::ParserInit(e.to_string()))?;
        parser.parse(source, None).ok_or(ScanError::ParseFailed)
    }

    /// Parse and reject trees with syntax errors
    ///
    /// # Errors
    /// As [`parse`](Self::parse), plus `ScanError::Syntax` for the first error node
    pub fn parse_strict(&self, source: &str) -> Result<Tree, ScanError> {
        let tree = self.parse(source)?;
        if let Some(err) = first_syntax_error(&tree, source) {
            return Err(err);
        }
        Ok(tree)
    }
}

impl std::fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceLanguage::TypeScript => f.write_str("TypeScript"),
            SourceLanguage::Tsx => f.write_str("TSX"),
        }
    }
}

/// Parse-only syntax check for a path and its text
///
/// # Errors
/// Returns the first syntax error, or an extension/parser error
pub fn check_syntax(path: &Path, source: &str) -> Result<(), ScanError> {
    SourceLanguage::from_path(path)?.parse_strict(source).map(|_| ())
}

/// First `ERROR` or `MISSING` node, as a syntax error
#[must_use]
pub fn first_syntax_error(tree: &Tree, source: &str) -> Option<ScanError> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }
    find_error_node(root).map(|node| {
        let pos = node.start_position();
        let message = if node.is_missing() {
            format!("missing '{}'", node.kind())
        } else {
            let snippet: String = node_text(node, source).chars().take(40).collect();
            format!("unexpected '{}'", snippet.trim())
        };
        ScanError::syntax(pos.row + 1, pos.column + 1, message)
    })
}

fn find_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    children(node).into_iter().find_map(find_error_node)
}

/// All children of a node
pub(crate) fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Named children of a node
pub(crate) fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Source text covered by a node
#[inline]
pub(crate) fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_from_extension() {
        assert_eq!(SourceLanguage::from_extension("ts"), Some(SourceLanguage::TypeScript));
        assert_eq!(SourceLanguage::from_extension(".tsx"), Some(SourceLanguage::Tsx));
        assert_eq!(SourceLanguage::from_extension("js"), None);
    }

    #[test]
    fn from_path_rejects_unknown() {
        let err = SourceLanguage::from_path(Path::new("main.py")).unwrap_err();
        assert!(matches!(err, ScanError::UnsupportedExtension(ext) if ext == "py"));
    }

    #[test]
    fn valid_source_parses_strictly() {
        let source = "export class A { async load(): Promise<void> { await x(); } }\n";
        assert!(SourceLanguage::TypeScript.parse_strict(source).is_ok());
    }

    #[test]
    fn unbalanced_braces_are_syntax_errors() {
        let source = "export class A {\n  async load() {\n    await x();\n";
        let err = check_syntax(Path::new("a.store.ts"), source).unwrap_err();
        assert!(matches!(err, ScanError::Syntax { .. }));
    }
}
