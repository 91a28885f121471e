//! Integration tests for the HTTP providers using wiremock mocks.

use tweetsmith_content::{
    CoinGeckoClient, ContentError, CryptoPredictor, DalleProvider, DalleSettings, GeminiClient,
    ImageProvider, OpenAiClient, Prompt, RetryPolicy, TextProvider,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn no_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 0,
        backoff_base_ms: 0,
    }
}

fn prompt() -> Prompt {
    Prompt {
        system: "You are terse.".to_string(),
        user: "Say something wise.".to_string(),
        temperature: 0.8,
        max_tokens: 100,
    }
}

#[tokio::test]
async fn openai_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "max_tokens": 100,
            "messages": [
                { "role": "system", "content": "You are terse." },
                { "role": "user", "content": "Say something wise." }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [ { "message": { "role": "assistant", "content": "  Know less, learn more. #Wisdom \n" } } ]
        })))
        .mount(&server)
        .await;

    let client =
        OpenAiClient::with_base_url("sk-test", "gpt-4o-mini", 30, no_retry(), &server.uri()).unwrap();
    let text = client.generate(&prompt()).await.unwrap();
    assert_eq!(text, "Know less, learn more. #Wisdom");
}

#[tokio::test]
async fn openai_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [ { "message": { "content": "Second time lucky." } } ]
        })))
        .mount(&server)
        .await;

    let retry = RetryPolicy {
        max_retries: 2,
        backoff_base_ms: 0,
    };
    let client = OpenAiClient::with_base_url("sk-test", "gpt-4o-mini", 30, retry, &server.uri()).unwrap();
    assert_eq!(client.generate(&prompt()).await.unwrap(), "Second time lucky.");
}

#[tokio::test]
async fn openai_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let retry = RetryPolicy {
        max_retries: 3,
        backoff_base_ms: 0,
    };
    let client = OpenAiClient::with_base_url("bad", "gpt-4o-mini", 30, retry, &server.uri()).unwrap();
    let err = client.generate(&prompt()).await.unwrap_err();
    assert!(matches!(err, ContentError::Http(_)), "{err:?}");
}

#[tokio::test]
async fn openai_empty_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = OpenAiClient::with_base_url("sk", "m", 30, no_retry(), &server.uri()).unwrap();
    let err = client.generate(&prompt()).await.unwrap_err();
    assert!(matches!(err, ContentError::EmptyResponse(_)), "{err:?}");
}

#[tokio::test]
async fn gemini_joins_candidate_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "g-key"))
        .and(body_partial_json(serde_json::json!({
            "contents": [ { "parts": [ { "text": "Say something wise." } ] } ],
            "generationConfig": { "maxOutputTokens": 100 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [ { "content": { "parts": [ { "text": "Humility " }, { "text": "is strength." } ] } } ]
        })))
        .mount(&server)
        .await;

    let client =
        GeminiClient::with_base_url("g-key", "gemini-1.5-flash", 30, no_retry(), &server.uri()).unwrap();
    assert_eq!(client.generate(&prompt()).await.unwrap(), "Humility is strength.");
}

#[tokio::test]
async fn gemini_malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = GeminiClient::with_base_url("k", "m", 30, no_retry(), &server.uri()).unwrap();
    let err = client.generate(&prompt()).await.unwrap_err();
    assert!(matches!(err, ContentError::Deserialize { .. }), "{err:?}");
}

#[tokio::test]
async fn market_prediction_uses_trending_coin_details() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/search/trending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "coins": [ { "item": { "id": "solana", "name": "Solana", "symbol": "SOL" } } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/coins/solana"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Solana",
            "symbol": "sol",
            "market_data": { "current_price": { "usd": 142.3, "eur": 130.0 } }
        })))
        .mount(&server)
        .await;

    let market = CoinGeckoClient::with_base_url(10, no_retry(), &server.uri()).unwrap();
    let text = CryptoPredictor::new(market).market_prediction().await.unwrap();
    assert!(text.starts_with("🚀 Solana (SOL) looking bullish"), "{text}");
    assert!(text.contains("Currently at $142"), "{text}");
    assert!(text.ends_with("#SOL #Crypto #Prediction"), "{text}");
}

#[tokio::test]
async fn empty_trending_list_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/search/trending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "coins": [] })))
        .mount(&server)
        .await;

    let market = CoinGeckoClient::with_base_url(10, no_retry(), &server.uri()).unwrap();
    let err = CryptoPredictor::new(market).market_prediction().await.unwrap_err();
    assert!(matches!(err, ContentError::EmptyResponse(_)), "{err:?}");
}

#[tokio::test]
async fn dalle_downloads_generated_image() {
    let server = MockServer::start().await;
    let image_url = format!("{}/files/img.png", server.uri());
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(header("authorization", "Bearer sk-img"))
        .and(body_partial_json(serde_json::json!({ "model": "dall-e-3", "size": "1024x1024", "n": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [ { "url": image_url } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/img.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG fake".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let settings = DalleSettings {
        model: "dall-e-3".to_string(),
        size: "1024x1024".to_string(),
        style: "minimalist".to_string(),
        output_dir: dir.path().to_path_buf(),
        timeout_secs: 30,
        retry: no_retry(),
    };
    let provider = DalleProvider::with_base_url("sk-img", settings, &server.uri()).unwrap();
    let path = provider.render("A calm sea. #Peace", "quote").await.unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG fake");
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("quote_") && name.ends_with(".png"), "{name}");
}
