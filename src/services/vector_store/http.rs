//! HTTP/JSON backend for the MemVectorDB protocol.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{VectorStore, validate_collection_params, validate_k, validate_vector};
use crate::error::StoreError;
use crate::models::{
    CollectionInfo, CollectionSummary, Distance, Embedding, ScoredEmbedding, StoreConfig,
};
use crate::utils::retry::{RetryConfig, retry};

const UNIQUE_VIOLATION: &str = "UniqueViolation";
const NOT_FOUND: &str = "NotFound";
const DIMENSION_MISMATCH: &str = "DimensionMismatch";

/// One remote operation: a fixed verb and path per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CreateCollection,
    GetCollection,
    DeleteCollection,
    InsertEmbedding,
    BatchInsertEmbeddings,
    ListEmbeddings,
    QuerySimilar,
}

impl Endpoint {
    pub fn method(self) -> Method {
        match self {
            Endpoint::CreateCollection => Method::POST,
            Endpoint::GetCollection | Endpoint::ListEmbeddings | Endpoint::QuerySimilar => {
                Method::GET
            }
            Endpoint::DeleteCollection => Method::DELETE,
            Endpoint::InsertEmbedding | Endpoint::BatchInsertEmbeddings => Method::PUT,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::CreateCollection => "/create_collection",
            Endpoint::GetCollection => "/get_collection",
            Endpoint::DeleteCollection => "/delete_collection",
            Endpoint::InsertEmbedding => "/insert_embeddings",
            Endpoint::BatchInsertEmbeddings => "/batch_insert_embeddings",
            Endpoint::ListEmbeddings => "/get_embeddings",
            Endpoint::QuerySimilar => "/get_similarity",
        }
    }
}

#[derive(Debug, Serialize)]
struct CollectionRequest<'a> {
    collection_name: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    collection_name: &'a str,
    dimension: usize,
    distance: Distance,
}

#[derive(Debug, Serialize)]
struct InsertRequest<'a> {
    collection_name: &'a str,
    embedding: &'a Embedding,
}

#[derive(Debug, Serialize)]
struct BatchInsertRequest<'a> {
    collection_name: &'a str,
    embeddings: &'a [Embedding],
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    collection_name: &'a str,
    query_vector: &'a [f32],
    k: usize,
}

/// The status fields of an object body; every other field is skipped.
#[derive(Debug, Default, Deserialize)]
struct StatusFields {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for a MemVectorDB server.
///
/// Holds only a connection pool and settings; it is cheap to clone and
/// carries no per-collection state.
#[derive(Debug, Clone)]
pub struct StoreClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl StoreClient {
    pub fn new(config: &StoreConfig, retry: RetryConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn with_defaults() -> Result<Self, StoreError> {
        Self::new(&StoreConfig::default(), RetryConfig::default())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and return the raw body of a successful response.
    async fn call<B>(&self, endpoint: Endpoint, collection: &str, body: &B) -> Result<String, StoreError>
    where
        B: Serialize + Sync,
    {
        let url = format!("{}{}", self.base_url, endpoint.path());
        tracing::debug!(method = %endpoint.method(), %url, collection, "store request");

        let response = self
            .client
            .request(endpoint.method(), &url)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(failure_for(status, &text, collection));
        }
        if let Some(err) = status_error(&text, collection) {
            return Err(err);
        }
        Ok(text)
    }

    async fn read_collection(&self, name: &str) -> Result<String, StoreError> {
        let body = CollectionRequest {
            collection_name: name,
        };
        retry(&self.retry, || {
            self.call(Endpoint::GetCollection, name, &body)
        })
        .await
    }
}

#[async_trait]
impl VectorStore for StoreClient {
    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<String, StoreError> {
        validate_collection_params(name, dimension)?;
        let body = CreateCollectionRequest {
            collection_name: name,
            dimension,
            distance,
        };
        let text = self.call(Endpoint::CreateCollection, name, &body).await?;
        Ok(status_message(&text))
    }

    async fn get_collection(&self, name: &str) -> Result<CollectionInfo, StoreError> {
        let text = self.read_collection(name).await?;
        let mut info: CollectionInfo = decode(&text, "collection")?;
        info.name = name.to_string();
        Ok(info)
    }

    async fn describe_collection(&self, name: &str) -> Result<CollectionSummary, StoreError> {
        let text = self.read_collection(name).await?;
        let mut summary: CollectionSummary = decode(&text, "collection")?;
        summary.name = name.to_string();
        Ok(summary)
    }

    async fn delete_collection(&self, name: &str) -> Result<String, StoreError> {
        let body = CollectionRequest {
            collection_name: name,
        };
        let text = self.call(Endpoint::DeleteCollection, name, &body).await?;
        Ok(status_message(&text))
    }

    async fn insert_embedding(
        &self,
        collection: &str,
        embedding: Embedding,
    ) -> Result<(), StoreError> {
        validate_record(&embedding)?;
        let body = InsertRequest {
            collection_name: collection,
            embedding: &embedding,
        };
        self.call(Endpoint::InsertEmbedding, collection, &body)
            .await?;
        Ok(())
    }

    async fn batch_insert_embeddings(
        &self,
        collection: &str,
        embeddings: Vec<Embedding>,
    ) -> Result<(), StoreError> {
        let dimension = embeddings.first().map(|e| e.vector.len());
        for embedding in &embeddings {
            validate_record(embedding)?;
            validate_vector(&embedding.vector, dimension)?;
        }

        let body = BatchInsertRequest {
            collection_name: collection,
            embeddings: &embeddings,
        };
        self.call(Endpoint::BatchInsertEmbeddings, collection, &body)
            .await?;
        Ok(())
    }

    async fn list_embeddings(&self, collection: &str) -> Result<Vec<Embedding>, StoreError> {
        let body = CollectionRequest {
            collection_name: collection,
        };
        let text = retry(&self.retry, || {
            self.call(Endpoint::ListEmbeddings, collection, &body)
        })
        .await?;

        decode_list(&text, "embedding list")
    }

    async fn query_similar(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredEmbedding>, StoreError> {
        validate_k(k)?;
        validate_vector(vector, None)?;

        let body = QueryRequest {
            collection_name: collection,
            query_vector: vector,
            k,
        };
        let text = retry(&self.retry, || {
            self.call(Endpoint::QuerySimilar, collection, &body)
        })
        .await?;

        decode_list(&text, "similarity results")
    }
}

fn validate_record(embedding: &Embedding) -> Result<(), StoreError> {
    if embedding.id.is_empty() {
        return Err(StoreError::Validation(
            "embedding id must not be empty".to_string(),
        ));
    }
    validate_vector(&embedding.vector, None)
}

/// The status string carried by a body: a JSON string, the `status` or
/// `error` field of an object, or a body that is not JSON at all.
fn status_of(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('"') {
        return serde_json::from_str::<String>(trimmed).ok();
    }
    if trimmed.starts_with('{') {
        let fields: StatusFields = serde_json::from_str(trimmed).unwrap_or_default();
        return fields.status.or(fields.error);
    }
    if serde_json::from_str::<IgnoredAny>(trimmed).is_err() {
        return Some(trimmed.to_string());
    }
    None
}

fn status_message(text: &str) -> String {
    status_of(text).unwrap_or_else(|| text.trim().to_string())
}

/// The store reports logical failures as `"Error: <Kind>"` status strings,
/// sometimes on a 200 response.
fn status_error(text: &str, collection: &str) -> Option<StoreError> {
    let status = status_of(text)?;
    if !status.trim_start().starts_with("Error") {
        return None;
    }

    Some(if status.contains(UNIQUE_VIOLATION) {
        StoreError::Conflict(collection.to_string())
    } else if status.contains(NOT_FOUND) {
        StoreError::NotFound(collection.to_string())
    } else if status.contains(DIMENSION_MISMATCH) {
        StoreError::Validation(status)
    } else {
        StoreError::Remote {
            status: StatusCode::OK.as_u16(),
            message: status,
        }
    })
}

fn failure_for(status: StatusCode, text: &str, collection: &str) -> StoreError {
    match status_error(text, collection) {
        Some(StoreError::Remote { .. }) | None => match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(collection.to_string()),
            StatusCode::CONFLICT => StoreError::Conflict(collection.to_string()),
            _ => StoreError::Remote {
                status: status.as_u16(),
                message: text.to_string(),
            },
        },
        Some(err) => err,
    }
}

fn decode<T: DeserializeOwned>(text: &str, what: &str) -> Result<T, StoreError> {
    serde_json::from_str(text).map_err(|e| StoreError::Remote {
        status: StatusCode::OK.as_u16(),
        message: format!("malformed {what} response: {e}"),
    })
}

/// Empty and `null` bodies are empty lists.
fn decode_list<T: DeserializeOwned>(text: &str, what: &str) -> Result<Vec<T>, StoreError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    decode(trimmed, what)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::Metadata;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn client_for(server: &Server) -> StoreClient {
        let config = StoreConfig {
            url: server.url(),
            timeout_secs: 5,
        };
        StoreClient::new(&config, RetryConfig::disabled()).unwrap()
    }

    fn record(id: &str, vector: Vec<f32>) -> Embedding {
        let metadata: Metadata = [("key1", "value1")].into_iter().collect();
        Embedding::new(id, vector, metadata)
    }

    #[test]
    fn test_endpoint_verbs() {
        assert_eq!(Endpoint::CreateCollection.method(), Method::POST);
        assert_eq!(Endpoint::GetCollection.method(), Method::GET);
        assert_eq!(Endpoint::DeleteCollection.method(), Method::DELETE);
        assert_eq!(Endpoint::InsertEmbedding.method(), Method::PUT);
        assert_eq!(Endpoint::BatchInsertEmbeddings.method(), Method::PUT);
        assert_eq!(Endpoint::QuerySimilar.path(), "/get_similarity");
    }

    #[test]
    fn test_base_url_trimming() {
        let config = StoreConfig {
            url: "http://127.0.0.1:8000/".to_string(),
            timeout_secs: 5,
        };
        let client = StoreClient::new(&config, RetryConfig::disabled()).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
    }

    #[test]
    fn test_status_error_mapping() {
        let conflict = status_error(r#"{"status": "Error: UniqueViolation"}"#, "docs");
        assert!(matches!(conflict, Some(StoreError::Conflict(name)) if name == "docs"));

        let missing = status_error(r#""Error: NotFound""#, "docs");
        assert!(matches!(missing, Some(StoreError::NotFound(_))));

        let other = status_error(r#"{"status": "Error: Disk full"}"#, "docs");
        assert_eq!(other.map(|e| e.kind()), Some(ErrorKind::Remote));

        let plain = status_error("Error: DimensionMismatch", "docs");
        assert!(matches!(plain, Some(StoreError::Validation(_))));

        assert!(status_error(r#"{"status": "Collection created"}"#, "docs").is_none());
        assert!(status_error(r#"{"dimension": 3, "embeddings": [[0.1]]}"#, "docs").is_none());
        assert!(status_error("[]", "docs").is_none());
    }

    #[test]
    fn test_status_message_falls_back_to_body() {
        assert_eq!(status_message(r#"{"status": "Collection deleted"}"#), "Collection deleted");
        assert_eq!(status_message("deleted\n"), "deleted");
        assert_eq!(status_message("{}"), "{}");
    }

    #[tokio::test]
    async fn test_create_collection_sends_payload() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/create_collection")
            .match_body(Matcher::Json(json!({
                "collection_name": "docs",
                "dimension": 3,
                "distance": "cosine"
            })))
            .with_status(200)
            .with_body(json!({"status": "Collection created: \"docs\""}).to_string())
            .create_async()
            .await;

        let status = client_for(&server)
            .create_collection("docs", 3, Distance::Cosine)
            .await
            .unwrap();

        assert_eq!(status, "Collection created: \"docs\"");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_collection_unique_violation_is_conflict() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/create_collection")
            .with_status(200)
            .with_body(json!({"status": "Error: UniqueViolation"}).to_string())
            .create_async()
            .await;

        let err = client_for(&server)
            .create_collection("docs", 3, Distance::Cosine)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(name) if name == "docs"));
    }

    #[tokio::test]
    async fn test_create_collection_rejects_zero_dimension_without_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/create_collection")
            .expect(0)
            .create_async()
            .await;

        let err = client_for(&server)
            .create_collection("docs", 0, Distance::Cosine)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_collection_parses_info() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/get_collection")
            .match_body(Matcher::Json(json!({"collection_name": "docs"})))
            .with_status(200)
            .with_body(
                json!({
                    "dimension": 3,
                    "distance": "cosine",
                    "embeddings": [
                        {"id": "1", "vector": [0.14, 0.316, 0.433], "metadata": {"key1": "value1"}},
                        {"id": "2", "vector": [0.27, 0.531, 0.621], "metadata": {"key1": "value3"}}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let info = client_for(&server).get_collection("docs").await.unwrap();
        assert_eq!(info.name, "docs");
        assert_eq!(info.dimension, 3);
        assert_eq!(info.distance, Distance::Cosine);
        assert_eq!(info.embedding_count(), 2);
    }

    #[tokio::test]
    async fn test_describe_collection_skips_embeddings() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/get_collection")
            .match_body(Matcher::Json(json!({"collection_name": "docs"})))
            .with_status(200)
            .with_body(
                json!({
                    "dimension": 3,
                    "distance": "dot",
                    "embeddings": [
                        {"id": "1", "vector": [0.14, 0.316, 0.433], "metadata": {"key1": "value1"}}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let summary = client_for(&server).describe_collection("docs").await.unwrap();
        assert_eq!(
            summary,
            CollectionSummary {
                name: "docs".to_string(),
                dimension: 3,
                distance: Distance::Dot,
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_missing_collection_is_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/get_collection")
            .with_status(404)
            .with_body("collection not found")
            .create_async()
            .await;

        let err = client_for(&server).get_collection("ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn test_delete_missing_collection_is_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/delete_collection")
            .with_status(200)
            .with_body(json!({"status": "Error: NotFound"}).to_string())
            .create_async()
            .await;

        let err = client_for(&server)
            .delete_collection("ghost")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_insert_embedding_payload() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/insert_embeddings")
            .match_body(Matcher::PartialJson(json!({
                "collection_name": "docs",
                "embedding": {"id": "a", "metadata": {"key1": "value1"}}
            })))
            .with_status(200)
            .with_body(json!({"status": "Embedding inserted"}).to_string())
            .create_async()
            .await;

        client_for(&server)
            .insert_embedding("docs", record("a", vec![0.1, 0.2, 0.3]))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_insert_dimension_mismatch_status_is_validation() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("PUT", "/insert_embeddings")
            .with_status(400)
            .with_body(json!({"status": "Error: DimensionMismatch"}).to_string())
            .create_async()
            .await;

        let err = client_for(&server)
            .insert_embedding("docs", record("a", vec![0.1, 0.2]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_batch_insert_rejects_ragged_vectors_before_sending() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/batch_insert_embeddings")
            .expect(0)
            .create_async()
            .await;

        let err = client_for(&server)
            .batch_insert_embeddings(
                "docs",
                vec![record("1", vec![0.1, 0.2, 0.3]), record("2", vec![0.1, 0.2])],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_batch_insert_server_error_is_remote() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/batch_insert_embeddings")
            .with_status(500)
            .with_body("internal error")
            .expect(1)
            .create_async()
            .await;

        let err = client_for(&server)
            .batch_insert_embeddings("docs", vec![record("1", vec![0.1, 0.2, 0.3])])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Remote { status: 500, ref message } if message == "internal error"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_embeddings() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/get_embeddings")
            .with_status(200)
            .with_body(
                json!([
                    {"id": "1", "vector": [0.1, 0.2, 0.3], "metadata": {"text": "one"}},
                    {"id": "2", "vector": [0.3, 0.2, 0.1], "metadata": null}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let embeddings = client_for(&server).list_embeddings("docs").await.unwrap();
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].metadata.get("text"), Some("one"));
    }

    #[tokio::test]
    async fn test_query_similar_payload_and_results() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/get_similarity")
            .match_body(Matcher::PartialJson(json!({"collection_name": "docs", "k": 1})))
            .with_status(200)
            .with_body(
                json!([{"id": "2", "vector": [0.27, 0.531, 0.621], "metadata": {}, "score": 0.97}])
                    .to_string(),
            )
            .create_async()
            .await;

        let hits = client_for(&server)
            .query_similar("docs", &[0.32, 0.24, 0.55], 1)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_rejects_zero_k() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/get_similarity")
            .expect(0)
            .create_async()
            .await;

        let err = client_for(&server)
            .query_similar("docs", &[0.1], 0)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reads_retry_transient_failures() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/get_embeddings")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let config = StoreConfig {
            url: server.url(),
            timeout_secs: 5,
        };
        let retry = RetryConfig::new(3).with_initial_delay(Duration::from_millis(1));
        let client = StoreClient::new(&config, retry).unwrap();

        let err = client.list_embeddings("docs").await.unwrap_err();
        assert!(matches!(err, StoreError::Remote { status: 503, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_writes_are_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/insert_embeddings")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let config = StoreConfig {
            url: server.url(),
            timeout_secs: 5,
        };
        let retry = RetryConfig::new(3).with_initial_delay(Duration::from_millis(1));
        let client = StoreClient::new(&config, retry).unwrap();

        let err = client
            .insert_embedding("docs", record("a", vec![0.1]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_store_is_transport_error() {
        let config = StoreConfig {
            url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
        };
        let client = StoreClient::new(&config, RetryConfig::disabled()).unwrap();
        let err = client.get_collection("docs").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
