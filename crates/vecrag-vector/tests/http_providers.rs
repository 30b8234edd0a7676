//! HTTP embedding backends against a local stub server

use serde_json::json;
use vecrag_core::{EndpointStyle, RagError};
use vecrag_vector::{EmbeddingProvider, LocalServerProvider, RemoteHostedProvider};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_server_embedding_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .and(body_json(json!({"model": "phi4", "prompt": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embedding": [0.5, 0.25]})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = LocalServerProvider::new(server.uri(), "phi4", EndpointStyle::Ollama);
    let vector = provider.embed("hello").await.unwrap();

    assert_eq!(vector, vec![0.5, 0.25]);
}

#[tokio::test]
async fn test_server_error_status_is_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let provider = LocalServerProvider::new(server.uri(), "phi4", EndpointStyle::Ollama);
    let err = provider.embed("hello").await.unwrap_err();

    match err {
        RagError::EmbeddingBackend(message) => {
            assert!(message.contains("500"), "{message}");
            assert!(message.contains("model not loaded"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_batch_issues_one_request_per_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embedding": [1.0]})))
        .expect(3)
        .mount(&server)
        .await;

    let provider = LocalServerProvider::new(server.uri(), "phi4", EndpointStyle::Ollama);
    let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let vectors = provider.embed_batch(&texts).await.unwrap();

    assert_eq!(vectors.len(), 3);
}

#[tokio::test]
async fn test_hosted_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/minilm"))
        .and(header("authorization", "Bearer hf_secret"))
        .and(body_json(json!({"inputs": "cloud storage"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([0.1, 0.2, 0.3])))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        RemoteHostedProvider::new(format!("{}/models/minilm", server.uri()), "hf_secret");
    let vector = provider.embed("cloud storage").await.unwrap();

    assert_eq!(vector.len(), 3);
}

#[tokio::test]
async fn test_hosted_error_status_is_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("loading"))
        .mount(&server)
        .await;

    let provider = RemoteHostedProvider::new(server.uri(), "hf_secret");
    let err = provider.embed("cloud storage").await.unwrap_err();

    assert!(matches!(err, RagError::EmbeddingBackend(ref m) if m.contains("503")));
}
