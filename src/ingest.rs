//! Ingestion pipeline: saved files → chunks → embeddings → batched upserts.
//!
//! Runs as deferred work after the upload response has been sent. Failures
//! are logged by the scheduler and never reach the uploader.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::chunker::chunk_text;
use crate::embedding::Embedder;
use crate::errors::ApiError;
use crate::vector::{VectorPoint, VectorStore};

/// Points are flushed to the vector store in batches of this size to bound
/// memory and request size.
const UPSERT_BATCH_SIZE: usize = 64;

/// A file the upload handler has written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedFile {
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub inserted: usize,
}

pub struct Ingestor {
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    collection: String,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Ingestor {
    pub fn new(
        vectors: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        collection: &str,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        Self {
            vectors,
            embedder,
            collection: collection.to_string(),
            chunk_size,
            chunk_overlap,
        }
    }

    /// Reads, chunks, embeds and upserts every file. Missing or unreadable
    /// files are skipped; the rest still go in.
    pub async fn ingest_files(&self, files: &[SavedFile]) -> Result<IngestReport, ApiError> {
        self.vectors
            .ensure_collection(&self.collection, self.embedder.dimensions())
            .await?;

        let mut inserted = 0;
        let mut batch: Vec<VectorPoint> = Vec::with_capacity(UPSERT_BATCH_SIZE);

        for file in files {
            let raw = match tokio::fs::read(&file.path).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!("Skipping unreadable file {:?}: {}", file.path, err);
                    continue;
                }
            };
            // Tolerate invalid byte sequences; documents may be anything.
            let text = String::from_utf8_lossy(&raw);

            let chunks = chunk_text(&text, self.chunk_size, self.chunk_overlap)?;
            for (index, chunk) in chunks.into_iter().enumerate() {
                let embedding = self.embedder.embed(&chunk).await?;
                batch.push(VectorPoint {
                    id: Uuid::new_v4().simple().to_string(),
                    vector: embedding,
                    payload: json!({
                        "filename": file.filename,
                        "chunk_index": index,
                        "text": chunk,
                    }),
                });

                if batch.len() >= UPSERT_BATCH_SIZE {
                    let points = std::mem::take(&mut batch);
                    inserted += points.len();
                    self.vectors.upsert(&self.collection, points).await?;
                }
            }
        }

        if !batch.is_empty() {
            inserted += batch.len();
            self.vectors.upsert(&self.collection, batch).await?;
        }

        tracing::info!(
            "Ingested {} points into collection '{}'",
            inserted,
            self.collection
        );
        Ok(IngestReport { inserted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingService;
    use crate::vector::SearchHit;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        batches: Mutex<Vec<Vec<VectorPoint>>>,
        ensured: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn ensure_collection(
            &self,
            collection: &str,
            dimensions: usize,
        ) -> Result<(), ApiError> {
            self.ensured
                .lock()
                .unwrap()
                .push((collection.to_string(), dimensions));
            Ok(())
        }

        async fn upsert(&self, _c: &str, points: Vec<VectorPoint>) -> Result<(), ApiError> {
            self.batches.lock().unwrap().push(points);
            Ok(())
        }

        async fn search(
            &self,
            _c: &str,
            _v: &[f32],
            _l: usize,
        ) -> Result<Vec<SearchHit>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn ingestor(store: Arc<RecordingStore>, chunk_size: usize, overlap: usize) -> Ingestor {
        Ingestor::new(
            store,
            Arc::new(EmbeddingService::new(None)),
            "default",
            chunk_size,
            overlap,
        )
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> SavedFile {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        SavedFile {
            filename: name.to_string(),
            path,
        }
    }

    #[tokio::test]
    async fn upserts_in_batches_of_64() {
        let dir = tempfile::tempdir().unwrap();
        // window 10, overlap 0 over 1300 chars -> exactly 130 chunks.
        let file = write_file(&dir, "big.txt", &"x".repeat(1300));
        let store = Arc::new(RecordingStore::default());

        let report = ingestor(store.clone(), 10, 0)
            .ingest_files(&[file])
            .await
            .unwrap();

        assert_eq!(report.inserted, 130);
        let batches = store.batches.lock().unwrap();
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![64, 64, 2]);
    }

    #[tokio::test]
    async fn missing_file_is_skipped_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let present = write_file(&dir, "present.txt", "some document text");
        let missing = SavedFile {
            filename: "missing.txt".to_string(),
            path: dir.path().join("missing.txt"),
        };
        let store = Arc::new(RecordingStore::default());

        let report = ingestor(store.clone(), 1000, 200)
            .ingest_files(&[missing, present])
            .await
            .unwrap();

        assert_eq!(report.inserted, 1);
        let batches = store.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        let payload = &batches[0][0].payload;
        assert_eq!(payload["filename"], "present.txt");
        assert_eq!(payload["chunk_index"], 0);
        assert_eq!(payload["text"], "some document text");
    }

    #[tokio::test]
    async fn collection_is_created_lazily_with_embedder_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(&dir, "doc.txt", "content");
        let store = Arc::new(RecordingStore::default());

        ingestor(store.clone(), 1000, 200)
            .ingest_files(&[file])
            .await
            .unwrap();

        let ensured = store.ensured.lock().unwrap();
        assert_eq!(ensured.as_slice(), [("default".to_string(), 384)]);
    }

    #[tokio::test]
    async fn empty_file_produces_no_points() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(&dir, "empty.txt", "");
        let store = Arc::new(RecordingStore::default());

        let report = ingestor(store.clone(), 1000, 200)
            .ingest_files(&[file])
            .await
            .unwrap();

        assert_eq!(report.inserted, 0);
        assert!(store.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn point_ids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(&dir, "doc.txt", &"abcdefghij".repeat(30));
        let store = Arc::new(RecordingStore::default());

        ingestor(store.clone(), 50, 10).ingest_files(&[file]).await.unwrap();

        let batches = store.batches.lock().unwrap();
        let mut ids: Vec<String> = batches
            .iter()
            .flatten()
            .map(|p| p.id.clone())
            .collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}
