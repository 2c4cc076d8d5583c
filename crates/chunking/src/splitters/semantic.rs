//! Similarity-grouped sentences.

use super::{sentence_spans, ChunkSplitter, Span, SplitContext};
use crate::chunk::Chunk;
use crate::embedder::cosine_similarity;
use agentcore_core::AppResult;

/// Open group of adjacent sentences and the running sum of their vectors.
struct SentenceGroup {
    members: Vec<usize>,
    centroid: Vec<f32>,
    carried: bool,
}

impl SentenceGroup {
    fn start(index: usize, embedding: &[f32]) -> Self {
        Self {
            members: vec![index],
            centroid: embedding.to_vec(),
            carried: false,
        }
    }

    fn add(&mut self, index: usize, embedding: &[f32]) {
        self.members.push(index);
        for (c, v) in self.centroid.iter_mut().zip(embedding) {
            *c += v;
        }
    }

    fn span(&self, sentences: &[Span]) -> Span {
        let first = self.members[0];
        let last = self.members[self.members.len() - 1];
        (sentences[first].0, sentences[last].1)
    }
}

/// Adjacent sentences joined while they stay similar to the group centroid.
pub struct SemanticSplitter;

impl ChunkSplitter for SemanticSplitter {
    fn split(&self, text: &str, ctx: &SplitContext<'_>) -> AppResult<Vec<Chunk>> {
        let size = ctx.chunk_size();
        let overlap = ctx.overlap();
        let threshold = ctx.config.similarity_threshold;

        let sentences = sentence_spans(text, (0, text.len()));
        let embeddings = sentences
            .iter()
            .map(|&(s, e)| ctx.embedder.embed(&text[s..e]))
            .collect::<AppResult<Vec<_>>>()?;

        let mut groups: Vec<SentenceGroup> = Vec::new();
        let mut current: Option<SentenceGroup> = None;

        for (i, sentence) in sentences.iter().enumerate() {
            let Some(mut group) = current.take() else {
                current = Some(SentenceGroup::start(i, &embeddings[i]));
                continue;
            };

            let extent = sentence.1 - group.span(&sentences).0;
            let similarity = cosine_similarity(&group.centroid, &embeddings[i]);
            if similarity >= threshold && extent <= size {
                group.add(i, &embeddings[i]);
                current = Some(group);
                continue;
            }

            let next = match group.members.last() {
                Some(&last)
                    if overlap > 0
                        && group.members.len() > 1
                        && sentences[last].1 - sentences[last].0 <= overlap
                        && sentence.1 - sentences[last].0 <= size =>
                {
                    let mut carried = SentenceGroup::start(last, &embeddings[last]);
                    carried.carried = true;
                    carried.add(i, &embeddings[i]);
                    carried
                }
                _ => SentenceGroup::start(i, &embeddings[i]),
            };
            groups.push(group);
            current = Some(next);
        }
        groups.extend(current);

        let chunks: Vec<Chunk> = groups
            .iter()
            .enumerate()
            .map(|(n, group)| {
                ctx.span_chunk(
                    format!("semantic_chunk_{}", n),
                    text,
                    group.span(&sentences),
                    "semantic",
                )
                .with_metadata("sentence_count", group.members.len())
                .with_overlap(group.carried)
            })
            .collect();

        tracing::debug!(
            "Semantic splitter grouped {} sentences into {} chunks (threshold {})",
            sentences.len(),
            chunks.len(),
            threshold
        );

        Ok(chunks)
    }
}
