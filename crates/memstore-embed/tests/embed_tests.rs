use memstore_core::config::EmbeddingSettings;
use memstore_core::Error;
use memstore_embed::{get_default_embedder, Embedder, FakeEmbedder, OpenAiEmbedder};
use mockito::{Matcher, Server};
use serde_json::json;

#[tokio::test]
async fn fake_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { use_fake: true, dimensions: 64, ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&settings).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).await.expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 64, "embedding dim follows settings");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_keeps_related_texts_closer() {
    let e = FakeEmbedder::new(1024);
    let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
    let readme = e.embed_text("README: Installation, getting started, and how to contribute");
    let near = e.embed_text("README: Installation, getting started,");
    let far = e.embed_text("C# class that defines a volatile embedding store");
    assert!(dot(&readme, &near) > dot(&readme, &far));
}

#[tokio::test]
async fn openai_request_shape_and_order() {
    let mut server = Server::new_async().await;
    // Items come back out of order; the client restores input order by `index`.
    let mock = server
        .mock("POST", "/embeddings")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::Json(json!({ "model": "text-embedding-ada-002", "input": ["first", "second"] })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({
            "object": "list",
            "data": [
                { "object": "embedding", "index": 1, "embedding": [0.0, 1.0] },
                { "object": "embedding", "index": 0, "embedding": [1.0, 0.0] }
            ],
            "model": "text-embedding-ada-002",
            "usage": { "prompt_tokens": 2, "total_tokens": 2 }
        }).to_string())
        .create_async()
        .await;

    let embedder = OpenAiEmbedder::openai(&server.url(), "sk-test", "text-embedding-ada-002", 2).expect("embedder");
    let out = embedder.embed_batch(&["first".to_string(), "second".to_string()]).await.expect("embed");
    assert_eq!(out, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    mock.assert_async().await;
}

#[tokio::test]
async fn azure_deployment_uses_api_key_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/openai/deployments/ada/embeddings")
        .match_query(Matcher::UrlEncoded("api-version".into(), "2024-02-01".into()))
        .match_header("api-key", "az-key")
        .with_status(200)
        .with_body(json!({ "data": [ { "index": 0, "embedding": [0.5, 0.5, 0.5] } ] }).to_string())
        .create_async()
        .await;

    let embedder = OpenAiEmbedder::azure(&server.url(), "az-key", "ada", "2024-02-01", 3).expect("embedder");
    let out = embedder.embed_batch(&["text".to_string()]).await.expect("embed");
    assert_eq!(out[0].len(), 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn quota_failure_surfaces_as_service_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/embeddings")
        .with_status(429)
        .with_body(r#"{"error":{"message":"Rate limit reached"}}"#)
        .expect(1)
        .create_async()
        .await;

    let embedder = OpenAiEmbedder::openai(&server.url(), "sk", "m", 2).expect("embedder");
    let err = embedder.embed_batch(&["x".to_string()]).await.expect_err("429 must fail");
    match err {
        Error::Service { status, ref message, .. } => {
            assert_eq!(status, Some(429));
            assert!(message.contains("Rate limit"));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn short_response_is_rejected() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/embeddings")
        .with_status(200)
        .with_body(json!({ "data": [ { "index": 0, "embedding": [1.0] } ] }).to_string())
        .create_async()
        .await;

    let embedder = OpenAiEmbedder::openai(&server.url(), "sk", "m", 1).expect("embedder");
    let err = embedder.embed_batch(&["a".to_string(), "b".to_string()]).await.expect_err("count mismatch");
    assert!(err.is_service());
}

#[tokio::test]
async fn empty_batch_makes_no_request() {
    // Unroutable base URL: any request would fail.
    let embedder = OpenAiEmbedder::openai("http://127.0.0.1:9", "sk", "m", 4).expect("embedder");
    assert!(embedder.embed_batch(&[]).await.expect("empty").is_empty());
}
