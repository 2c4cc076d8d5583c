//! Language detection for code-aware chunking.

use serde::{Deserialize, Serialize};

/// Programming language of a code document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    TypeScript,
    JavaScript,
    Python,
    Go,
    Unknown,
}

impl Language {
    /// Resolve a language from a user-facing name or file extension.
    ///
    /// Unrecognized names map to `Language::Unknown`, which makes the
    /// code-aware splitter fall back to recursive splitting.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "rust" | "rs" => Language::Rust,
            "typescript" | "ts" | "tsx" => Language::TypeScript,
            "javascript" | "js" | "jsx" => Language::JavaScript,
            "python" | "py" => Language::Python,
            "go" | "golang" => Language::Go,
            _ => Language::Unknown,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Unknown => "unknown",
        }
    }

    /// Get tree-sitter language for this language.
    pub fn tree_sitter_language(&self) -> Option<tree_sitter::Language> {
        match self {
            Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
            Language::Unknown => None,
        }
    }

    /// Check if tree-sitter support is available.
    pub fn has_tree_sitter_support(&self) -> bool {
        !matches!(self, Language::Unknown)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect programming language from content.
pub fn detect_language_from_content(text: &str) -> Language {
    // Rust patterns
    if text.contains("fn ") && (text.contains("impl ") || text.contains("pub ") || text.contains("let ")) {
        return Language::Rust;
    }

    // Go patterns
    if text.contains("func ") && text.contains("package ") {
        return Language::Go;
    }

    // Python patterns
    if text.contains("def ") && (text.contains("import ") || text.contains("):\n") || text.contains("self")) {
        return Language::Python;
    }

    // TypeScript/JavaScript patterns
    if text.contains("interface ") || text.contains(": string") || text.contains(": number") {
        return Language::TypeScript;
    }

    if text.contains("function ") || text.contains("const ") || text.contains("=> {") {
        return Language::JavaScript;
    }

    Language::Unknown
}
