use crate::constants::{
    BROWSER_USER_AGENT, CONNECT_TIMEOUT_SECS, SHRINK_ENDPOINT, SKIP_RATIO_THRESHOLD,
};
use crate::error::{Result, ShrinkError};
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wire format of the shrink endpoint's JSON reply. A rejection carries
/// `error`/`message`; a successful optimization carries `input`/`output`.
#[derive(Debug, Deserialize)]
pub struct ShrinkResponse {
    pub error: Option<String>,
    pub message: Option<String>,
    pub input: Option<InputStats>,
    pub output: Option<OutputStats>,
}

#[derive(Debug, Deserialize)]
pub struct InputStats {
    pub size: u64,
    #[serde(rename = "type")]
    pub mime: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OutputStats {
    pub size: u64,
    #[serde(rename = "type")]
    pub mime: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub ratio: f64,
    pub url: String,
}

/// Result of submitting one file to the remote service.
#[derive(Debug, Clone, PartialEq)]
pub enum CompressionOutcome {
    /// Worth replacing: the optimized bytes are waiting at `url`.
    Optimized {
        input_size: u64,
        output_size: u64,
        ratio: f64,
        url: String,
    },
    /// Ratio at or above the skip threshold; the file stays untouched.
    AlreadyOptimal { ratio: f64 },
    /// Structured error reported by the service.
    Rejected { message: String },
}

/// Seam between the batch runner and the remote protocol. The production
/// implementation is [`ShrinkClient`]; tests drive the runner with a stub.
pub trait Compressor {
    fn submit(
        &self,
        bytes: Vec<u8>,
    ) -> impl std::future::Future<Output = Result<CompressionOutcome>>;
    fn fetch(&self, url: &str) -> impl std::future::Future<Output = Result<Vec<u8>>>;
}

/// Stateless client for the two-phase remote compression protocol. Every call
/// is independent; nothing is cached between candidates.
pub struct ShrinkClient {
    http: Client,
    endpoint: String,
}

impl ShrinkClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_endpoint(SHRINK_ENDPOINT, timeout)
    }

    /// Endpoint override, used by tests to point at a local mock server.
    pub fn with_endpoint(endpoint: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }
}

impl Compressor for ShrinkClient {
    /// Posts the raw file bytes and classifies the JSON reply. The header set
    /// disguises the client as an ordinary browser; `X-Forwarded-For` is
    /// randomized per request to reduce the chance of IP-based throttling.
    async fn submit(&self, bytes: Vec<u8>) -> Result<CompressionOutcome> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Forwarded-For", random_forwarded_for())
            .header("Postman-Token", postman_token())
            .header("Cache-Control", "no-cache")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        match serde_json::from_slice::<ShrinkResponse>(&body) {
            Ok(parsed) => classify(parsed),
            Err(_) if !status.is_success() => Err(ShrinkError::Http {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            }),
            Err(e) => Err(ShrinkError::InvalidResponse(e.to_string())),
        }
    }

    /// Downloads the optimized bytes from the location returned by `submit`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ShrinkError::Http {
                status: status.as_u16(),
                message: "fetch of optimized bytes failed".to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Maps a decoded response onto an outcome variant.
pub fn classify(response: ShrinkResponse) -> Result<CompressionOutcome> {
    if let Some(error) = response.error {
        let message = response.message.unwrap_or(error);
        return Ok(CompressionOutcome::Rejected { message });
    }

    let output = response
        .output
        .ok_or_else(|| ShrinkError::InvalidResponse("missing output section".to_string()))?;
    if output.ratio >= SKIP_RATIO_THRESHOLD {
        return Ok(CompressionOutcome::AlreadyOptimal {
            ratio: output.ratio,
        });
    }

    let input = response
        .input
        .ok_or_else(|| ShrinkError::InvalidResponse("missing input section".to_string()))?;
    Ok(CompressionOutcome::Optimized {
        input_size: input.size,
        output_size: output.size,
        ratio: output.ratio,
        url: output.url,
    })
}

/// Four random octets in `1..=254`, a fresh value per request.
pub fn random_forwarded_for() -> String {
    let mut rng = rand::thread_rng();
    (0..4)
        .map(|_| rng.gen_range(1u8..=254).to_string())
        .collect::<Vec<_>>()
        .join(".")
}

fn postman_token() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn parse(raw: serde_json::Value) -> ShrinkResponse {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_classify_rejection() {
        let response = parse(json!({"error": "Bad request", "message": "Request is invalid"}));
        let outcome = classify(response).unwrap();
        assert_eq!(
            outcome,
            CompressionOutcome::Rejected {
                message: "Request is invalid".to_string()
            }
        );
    }

    #[test]
    fn test_classify_rejection_without_message() {
        let response = parse(json!({"error": "Unsupported media type"}));
        let outcome = classify(response).unwrap();
        assert_eq!(
            outcome,
            CompressionOutcome::Rejected {
                message: "Unsupported media type".to_string()
            }
        );
    }

    #[test]
    fn test_classify_already_optimal_at_threshold() {
        let response = parse(json!({
            "input": {"size": 887, "type": "image/png"},
            "output": {"size": 800, "type": "image/png", "width": 81, "height": 81,
                       "ratio": 0.9, "url": "https://example.com/out"}
        }));
        let outcome = classify(response).unwrap();
        assert_eq!(outcome, CompressionOutcome::AlreadyOptimal { ratio: 0.9 });
    }

    #[test]
    fn test_classify_optimized_below_threshold() {
        let response = parse(json!({
            "input": {"size": 1000, "type": "image/png"},
            "output": {"size": 700, "type": "image/png", "width": 81, "height": 81,
                       "ratio": 0.7, "url": "https://example.com/out"}
        }));
        let outcome = classify(response).unwrap();
        assert_eq!(
            outcome,
            CompressionOutcome::Optimized {
                input_size: 1000,
                output_size: 700,
                ratio: 0.7,
                url: "https://example.com/out".to_string(),
            }
        );
    }

    #[test]
    fn test_classify_missing_output_is_invalid() {
        let response = parse(json!({"input": {"size": 10, "type": "image/png"}}));
        let result = classify(response);
        assert!(matches!(result, Err(ShrinkError::InvalidResponse(_))));
    }

    #[test]
    fn test_random_forwarded_for_shape() {
        for _ in 0..100 {
            let addr = random_forwarded_for();
            let octets: Vec<u8> = addr.split('.').map(|o| o.parse().unwrap()).collect();
            assert_eq!(octets.len(), 4);
            assert!(octets.iter().all(|&o| (1..=254).contains(&o)));
        }
    }

    #[tokio::test]
    async fn test_submit_parses_optimized_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/shrink"))
            .and(header_exists("X-Forwarded-For"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "input": {"size": 4096, "type": "image/png"},
                "output": {"size": 1024, "type": "image/png", "width": 64, "height": 64,
                           "ratio": 0.25, "url": format!("{}/output/abc", server.uri())}
            })))
            .mount(&server)
            .await;

        let client = ShrinkClient::with_endpoint(
            &format!("{}/shrink", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap();
        let outcome = client.submit(vec![1, 2, 3]).await.unwrap();
        match outcome {
            CompressionOutcome::Optimized {
                input_size,
                output_size,
                ratio,
                ..
            } => {
                assert_eq!(input_size, 4096);
                assert_eq!(output_size, 1024);
                assert!((ratio - 0.25).abs() < f64::EPSILON);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_service_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "Bad request", "message": "Request is invalid"
            })))
            .mount(&server)
            .await;

        let client =
            ShrinkClient::with_endpoint(&server.uri(), Duration::from_secs(5)).unwrap();
        let outcome = client.submit(vec![0u8; 8]).await.unwrap();
        assert_eq!(
            outcome,
            CompressionOutcome::Rejected {
                message: "Request is invalid".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_submit_non_json_failure_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client =
            ShrinkClient::with_endpoint(&server.uri(), Duration::from_secs(5)).unwrap();
        let result = client.submit(vec![0u8; 8]).await;
        assert!(matches!(result, Err(ShrinkError::Http { status: 502, .. })));
    }

    #[tokio::test]
    async fn test_fetch_returns_body_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/output/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9u8, 8, 7]))
            .mount(&server)
            .await;

        let client =
            ShrinkClient::with_endpoint(&server.uri(), Duration::from_secs(5)).unwrap();
        let bytes = client
            .fetch(&format!("{}/output/abc", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, vec![9u8, 8, 7]);
    }

    #[tokio::test]
    async fn test_fetch_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client =
            ShrinkClient::with_endpoint(&server.uri(), Duration::from_secs(5)).unwrap();
        let result = client.fetch(&format!("{}/gone", server.uri())).await;
        assert!(matches!(result, Err(ShrinkError::Http { status: 404, .. })));
    }
}
