//! Topic highlights: cluster every embedded chunk and publish one highlight
//! per cluster.

use crate::cluster::{generate_cluster_label, kmeans};
use crate::ports::{EmbeddingsSource, HighlightsSink, SpeechesSource};
use crate::types::{ChunkId, Highlight, SpeechChunk};
use civic_core::config::HighlightSettings;
use civic_core::{AppError, AppResult};
use std::collections::HashMap;

/// Clustering parameters for [`update_highlights`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightOptions {
    pub k: usize,
    pub seed: u64,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self { k: 6, seed: 42 }
    }
}

impl HighlightOptions {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl From<HighlightSettings> for HighlightOptions {
    fn from(settings: HighlightSettings) -> Self {
        Self {
            k: settings.k,
            seed: settings.seed,
        }
    }
}

/// Rebuild the highlight set from the current chunks and embeddings.
///
/// Chunks without an embedding are left out. When nothing is left to cluster
/// the sink is cleared and an empty set is returned. Otherwise the sink is
/// cleared once and one highlight per cluster is upserted, clusters in order
/// of their first member, each sampled by that first member.
///
/// Clear-then-upsert is not atomic: a failure part way through leaves the
/// sink partially filled. Runs must not overlap.
///
/// Returns the highlights that were upserted, in upsert order.
pub async fn update_highlights(
    speeches: &dyn SpeechesSource,
    sink: &dyn HighlightsSink,
    embeddings: &dyn EmbeddingsSource,
    options: HighlightOptions,
) -> AppResult<Vec<Highlight>> {
    let (chunks, records) =
        futures::try_join!(speeches.get_all_chunks(), embeddings.get_all_embeddings())?;

    tracing::info!(
        "Updating highlights from {} chunks and {} embeddings (k={}, seed={})",
        chunks.len(),
        records.len(),
        options.k,
        options.seed
    );

    if chunks.is_empty() || records.is_empty() {
        sink.clear().await?;
        return Ok(Vec::new());
    }

    let lookup: HashMap<ChunkId, Vec<f64>> = records
        .into_iter()
        .map(|record| (record.chunk_id, record.embedding))
        .collect();

    let (members, vectors): (Vec<SpeechChunk>, Vec<Vec<f64>>) = chunks
        .into_iter()
        .filter_map(|chunk| {
            let vector = lookup.get(&chunk.id)?.clone();
            Some((chunk, vector))
        })
        .unzip();

    if members.is_empty() {
        tracing::info!("No chunk has an embedding, clearing highlights");
        sink.clear().await?;
        return Ok(Vec::new());
    }

    check_uniform_dimensions(&vectors)?;

    let result = kmeans(&vectors, options.k, options.seed);

    // Cluster id -> member positions, clusters in order of first member
    let mut order: Vec<usize> = Vec::new();
    let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
    for (position, &label) in result.labels.iter().enumerate() {
        groups
            .entry(label)
            .or_insert_with(|| {
                order.push(label);
                Vec::new()
            })
            .push(position);
    }

    sink.clear().await?;

    let mut published = Vec::with_capacity(order.len());
    for label in order {
        let positions = &groups[&label];
        let texts: Vec<&str> = positions.iter().map(|&p| members[p].text.as_str()).collect();

        let highlight = Highlight {
            cluster_label: generate_cluster_label(&texts),
            count: positions.len(),
            sample_chunk_id: members[positions[0]].id,
        };

        tracing::info!(
            "Cluster {}: '{}' ({} chunks, sample {})",
            label,
            highlight.cluster_label,
            highlight.count,
            highlight.sample_chunk_id
        );

        sink.upsert(highlight.clone()).await?;
        published.push(highlight);
    }

    Ok(published)
}

fn check_uniform_dimensions(vectors: &[Vec<f64>]) -> AppResult<()> {
    let Some(expected) = vectors.first().map(Vec::len) else {
        return Ok(());
    };

    match vectors.iter().find(|v| v.len() != expected) {
        Some(v) => Err(AppError::DimensionMismatch {
            expected,
            actual: v.len(),
        }),
        None => Ok(()),
    }
}
