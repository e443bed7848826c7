//! The real form submission.
//!
//! Once the loading sequence completes, the form is posted the way a browser
//! would post it: an `application/x-www-form-urlencoded` body with the
//! cookie jar attached. A JSON answer is a rendered result the page can
//! show; anything else only tells us the server took the post.

use async_trait::async_trait;
use replykit_types::{SubmitOutcome, SubmitResponse};
use reqwest::{
    Client, StatusCode,
    header::{CONTENT_TYPE, COOKIE},
};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// What gets posted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitRequest {
    /// Form fields in page order.
    pub fields: Vec<(String, String)>,
    /// `Cookie` header value.
    pub cookies: Option<String>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("server answered {status}")]
    Status { status: StatusCode },
    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
}

#[async_trait]
pub trait FormSubmitter: Send + Sync {
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitOutcome, SubmitError>;
}

/// Posts the form to the server's submit endpoint.
#[derive(Debug, Clone)]
pub struct HttpSubmitter {
    client: Client,
    endpoint: Url,
}

impl HttpSubmitter {
    pub fn new(endpoint: Url) -> Result<Self, SubmitError> {
        let client = Client::builder()
            .user_agent(concat!("replykit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SubmitError::Client)?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl FormSubmitter for HttpSubmitter {
    async fn submit(&self, request: SubmitRequest) -> Result<SubmitOutcome, SubmitError> {
        debug!("Submitting form to {}.", self.endpoint);
        let mut builder = self.client.post(self.endpoint.clone()).form(&request.fields);
        if let Some(cookies) = request.cookies.as_deref() {
            builder = builder.header(COOKIE, cookies);
        }
        let response = builder.send().await.map_err(SubmitError::Request)?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));
        if is_json {
            let body: SubmitResponse = response.json().await.map_err(SubmitError::Decode)?;
            return Ok(SubmitOutcome::Rendered(body));
        }
        if !status.is_success() {
            return Err(SubmitError::Status { status });
        }
        Ok(SubmitOutcome::Accepted { status: status.as_u16() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string_contains, header, method, path},
    };

    fn request() -> SubmitRequest {
        SubmitRequest {
            fields: vec![
                ("api_key".into(), "sk-test".into()),
                ("input_text".into(), "Can we meet?".into()),
            ],
            cookies: Some("tone=friendly".into()),
        }
    }

    #[tokio::test]
    async fn json_answers_are_rendered_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(header("cookie", "tone=friendly"))
            .and(body_string_contains("input_text=Can+we+meet%3F"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output_texts": ["Sure, see you then."],
                "errors": {"sentence-limit-error": "Too long"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = Url::parse(&server.uri()).expect("uri").join("/submit").expect("join");
        let outcome = HttpSubmitter::new(endpoint).expect("client").submit(request()).await.expect("submit");

        let SubmitOutcome::Rendered(response) = outcome else {
            panic!("expected rendered outcome, got {outcome:?}");
        };
        assert_eq!(response.output_texts, vec!["Sure, see you then.".to_string()]);
        assert_eq!(response.errors.get("sentence-limit-error").map(String::as_str), Some("Too long"));
    }

    #[tokio::test]
    async fn other_answers_are_accepted_or_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).expect("uri");
        let accepted = HttpSubmitter::new(base.join("/submit").expect("join"))
            .expect("client")
            .submit(request())
            .await
            .expect("submit");
        assert_eq!(accepted, SubmitOutcome::Accepted { status: 200 });

        let failed = HttpSubmitter::new(base.join("/broken").expect("join"))
            .expect("client")
            .submit(SubmitRequest::default())
            .await;
        assert!(matches!(failed, Err(SubmitError::Status { status }) if status.as_u16() == 500));
    }
}
