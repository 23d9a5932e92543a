use super::{corpus_with, FailingProvider, FixedIndex};
use crate::embeddings::providers::MockProvider;
use crate::embeddings::EmbeddingProvider;
use crate::rag::retrieve;
use crate::store::MemoryCorpus;
use crate::types::ChunkId;
use crate::vector_index::{InMemoryVectorIndex, VectorIndex};
use civic_core::AppError;
use std::sync::Arc;

const CONTENT: &str = "保育園の待機児童を解消します。道路の補修を進めます。図書館を新しく建てます。";

async fn embedded(corpus: &MemoryCorpus, provider: Arc<MockProvider>) -> InMemoryVectorIndex {
    let index = InMemoryVectorIndex::new(provider.clone());
    for chunk in corpus.chunks().unwrap() {
        let vector = provider.embed(&chunk.text).await.unwrap();
        index.upsert(chunk.id, vector).await.unwrap();
    }
    index
}

fn ids(chunks: &[crate::types::RetrievedChunk]) -> Vec<ChunkId> {
    chunks.iter().map(|c| c.chunk.id).collect()
}

#[tokio::test]
async fn test_results_follow_index_order() {
    let corpus = corpus_with(&[CONTENT]);
    let provider = MockProvider::new(16);

    let index = FixedIndex::new(&[1, 2]);
    let retrieved = retrieve("質問", 5, &index, &corpus, &provider).await.unwrap();
    assert_eq!(ids(&retrieved), vec![1, 2]);
    assert_eq!(retrieved[0].text(), "保育園の待機児童を解消します。");

    // Store order is 1, 2, 3; the index order wins
    let index = FixedIndex::new(&[3, 1, 2]);
    let retrieved = retrieve("質問", 5, &index, &corpus, &provider).await.unwrap();
    assert_eq!(ids(&retrieved), vec![3, 1, 2]);
    assert!(retrieved[0].score > retrieved[1].score);
}

#[tokio::test]
async fn test_unknown_ids_skipped() {
    let corpus = corpus_with(&[CONTENT]);
    let provider = MockProvider::new(16);
    let index = FixedIndex::new(&[2, 99, 1]);

    let retrieved = retrieve("質問", 5, &index, &corpus, &provider).await.unwrap();
    assert_eq!(ids(&retrieved), vec![2, 1]);
}

#[tokio::test]
async fn test_question_embedded_and_k_forwarded() {
    let corpus = corpus_with(&[CONTENT]);
    let provider = MockProvider::new(16);
    let index = FixedIndex::new(&[1, 2, 3]);

    let retrieved = retrieve("道路について", 2, &index, &corpus, &provider).await.unwrap();

    assert_eq!(provider.call_count(), 1);
    assert_eq!(
        *index.queries.lock().unwrap(),
        vec![("道路について".to_string(), 2)]
    );
    assert_eq!(retrieved.len(), 2);
}

#[tokio::test]
async fn test_empty_index_returns_nothing() {
    let corpus = corpus_with(&[CONTENT]);
    let provider = Arc::new(MockProvider::new(16));
    let index = InMemoryVectorIndex::new(provider.clone());

    let retrieved = retrieve("質問", 5, &index, &corpus, provider.as_ref()).await.unwrap();

    assert!(retrieved.is_empty());
    // Once by the retriever, once by the index
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_most_similar_chunk_first() {
    let corpus = corpus_with(&[CONTENT]);
    let provider = Arc::new(MockProvider::new(64));
    let index = embedded(&corpus, provider.clone()).await;

    let retrieved = retrieve("道路の補修を進めます。", 3, &index, &corpus, provider.as_ref())
        .await
        .unwrap();

    assert_eq!(retrieved.len(), 3);
    assert_eq!(retrieved[0].chunk.id, 2);
    assert!((retrieved[0].score - 1.0).abs() < 1e-9);
    assert!(retrieved.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(retrieved[0].source_url(), "https://example.com/minutes/1");
}

#[tokio::test]
async fn test_embedding_failure_fails_request() {
    let corpus = corpus_with(&[CONTENT]);
    let provider = FailingProvider::new(16);
    let index = FixedIndex::new(&[1]);

    let result = retrieve("失敗する質問", 5, &index, &corpus, &provider).await;

    assert!(matches!(result, Err(AppError::Embedding(_))));
    assert!(index.queries.lock().unwrap().is_empty());
}
