//! Code splitter using tree-sitter for definition-aligned chunking.

use super::{recursive_spans, trim_span, ChunkSplitter, Span, SplitContext};
use crate::chunk::Chunk;
use crate::detection::{detect_language_from_content, Language};
use agentcore_core::{AppError, AppResult};
use tree_sitter::{Node, Parser};

/// Block type for code that sits between top-level definitions.
const MODULE_CODE: &str = "module_code";

pub struct CodeSplitter {
    pub language: Language,
}

impl CodeSplitter {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Configured language, or the one detected from content when unknown.
    fn resolve_language(&self, text: &str) -> Language {
        match self.language {
            Language::Unknown => detect_language_from_content(text),
            known => known,
        }
    }
}

/// Block type of a top-level definition node, `None` for anything else.
fn definition_kind(language: Language, node: Node<'_>) -> Option<&'static str> {
    let kind = match (language, node.kind()) {
        (Language::Rust, "function_item") => "function",
        (Language::Rust, "struct_item") => "struct",
        (Language::Rust, "enum_item") => "enum",
        (Language::Rust, "impl_item") => "impl",
        (Language::Rust, "trait_item") => "trait",
        (Language::Rust, "mod_item") => "module",
        (Language::Rust, "macro_definition") => "macro",

        (Language::Python, "function_definition") => "function",
        (Language::Python, "class_definition") => "class",
        (Language::Python, "decorated_definition") => {
            return node
                .child_by_field_name("definition")
                .and_then(|inner| definition_kind(language, inner))
        }

        (Language::JavaScript | Language::TypeScript, kind) => match kind {
            "function_declaration" | "generator_function_declaration" => "function",
            "class_declaration" | "abstract_class_declaration" => "class",
            "interface_declaration" => "interface",
            "type_alias_declaration" => "type",
            "enum_declaration" => "enum",
            "export_statement" => {
                return node
                    .child_by_field_name("declaration")
                    .and_then(|inner| definition_kind(language, inner))
            }
            _ => return None,
        },

        (Language::Go, "function_declaration") => "function",
        (Language::Go, "method_declaration") => "method",
        (Language::Go, "type_declaration") => "type",

        _ => return None,
    };
    Some(kind)
}

/// Split the source into definition regions and the code between them.
fn regions(text: &str, language: Language) -> AppResult<Vec<(Span, &'static str)>> {
    let ts_language = language.tree_sitter_language().ok_or_else(|| {
        AppError::Chunking(format!("Tree-sitter language not available for {}", language))
    })?;

    let mut parser = Parser::new();
    parser
        .set_language(&ts_language)
        .map_err(|e| AppError::Chunking(format!("Failed to set parser language: {}", e)))?;

    let tree = parser
        .parse(text, None)
        .ok_or_else(|| AppError::Chunking(format!("Failed to parse {} code", language)))?;

    let root = tree.root_node();
    let mut cursor = root.walk();
    let mut regions = Vec::new();
    let mut position = 0;

    for child in root.children(&mut cursor) {
        let Some(kind) = definition_kind(language, child) else {
            continue;
        };
        if child.start_byte() > position {
            regions.push(((position, child.start_byte()), MODULE_CODE));
        }
        regions.push(((child.start_byte(), child.end_byte()), kind));
        position = child.end_byte();
    }
    if position < text.len() {
        regions.push(((position, text.len()), MODULE_CODE));
    }

    Ok(regions)
}

impl ChunkSplitter for CodeSplitter {
    fn split(&self, text: &str, ctx: &SplitContext<'_>) -> AppResult<Vec<Chunk>> {
        let size = ctx.chunk_size();
        let language = self.resolve_language(text);

        let regions = if language.has_tree_sitter_support() {
            regions(text, language)?
        } else {
            tracing::debug!("No tree-sitter support for {}, using recursive fallback", language);
            vec![((0, text.len()), MODULE_CODE)]
        };

        let mut chunks: Vec<Chunk> = Vec::new();
        for (region, block_type) in regions {
            let Some(span) = trim_span(text, region) else {
                continue;
            };

            if span.1 - span.0 <= size {
                let chunk = ctx
                    .span_chunk(format!("code_chunk_{}", chunks.len()), text, span, "code_aware")
                    .with_metadata("code_block_type", block_type)
                    .with_metadata("language", language.as_str());
                chunks.push(chunk);
                continue;
            }

            let pieces = recursive_spans(text, span, size, ctx.overlap());
            let partial = pieces.len() > 1;
            let mut prev_end = None;
            for piece in pieces {
                let overlaps = prev_end.is_some_and(|end| piece.0 < end);
                let chunk = ctx
                    .span_chunk(format!("code_chunk_{}", chunks.len()), text, piece, "code_aware")
                    .with_metadata("code_block_type", block_type)
                    .with_metadata("language", language.as_str())
                    .with_metadata("partial", partial)
                    .with_overlap(overlaps);
                chunks.push(chunk);
                prev_end = Some(piece.1);
            }
        }

        tracing::debug!(
            "Code splitter ({}) created {} chunks from {} bytes",
            language,
            chunks.len(),
            text.len()
        );

        Ok(chunks)
    }
}
