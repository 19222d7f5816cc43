use crate::domain::model::{EvalRequest, EvalResponse};
use crate::domain::ports::{ConfigProvider, Evaluator};
use crate::utils::error::{CalcError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const CALCULATE_PATH: &str = "/api/calculate";
const EVALUATE_PATH: &str = "/api/evaluate";

/// Talks to the calculation service over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpEvaluator {
    client: Client,
    base_url: String,
}

impl HttpEvaluator {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(config.endpoint(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Asks the service to evaluate a whole `a <op> b` expression.
    pub async fn evaluate_expression(&self, expression: &str) -> Result<f64> {
        tracing::debug!("Evaluating expression {:?}", expression);
        let body = serde_json::json!({ "expression": expression });
        self.post(EVALUATE_PATH, &body).await
    }

    async fn post<B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<f64> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        tracing::debug!("Evaluator response status: {}", status);

        // The service reports failures in the body; the status code is not consulted.
        let bytes = response.bytes().await?;
        let decoded: EvalResponse = serde_json::from_slice(&bytes)?;
        interpret(decoded)
    }
}

fn interpret(response: EvalResponse) -> Result<f64> {
    if let Some(message) = response.error.filter(|m| !m.is_empty()) {
        return Err(CalcError::Evaluation { message });
    }
    response.result.ok_or_else(|| CalcError::MalformedResponse {
        reason: "response carries neither a result nor an error".to_string(),
    })
}

#[async_trait]
impl Evaluator for HttpEvaluator {
    async fn evaluate(&self, request: &EvalRequest) -> Result<f64> {
        self.post(CALCULATE_PATH, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::OperatorKind;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_binary_request_success() {
        let server = MockServer::start_async().await;
        let api_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/calculate")
                    .json_body(serde_json::json!({"operation": "+", "a": 3.0, "b": 4.0}));
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(serde_json::json!({
                        "result": 7.0, "operation": "+", "a": 3.0, "b": 4.0
                    }));
            })
            .await;

        let evaluator = HttpEvaluator::new(server.base_url(), None).unwrap();
        let result = evaluator
            .evaluate(&EvalRequest::binary(OperatorKind::Add, 3.0, 4.0))
            .await
            .unwrap();

        api_mock.assert_async().await;
        assert_eq!(result, 7.0);
    }

    #[tokio::test]
    async fn test_unary_request_has_no_b() {
        let server = MockServer::start_async().await;
        let api_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/calculate")
                    .json_body(serde_json::json!({"operation": "sqrt", "a": 16.0}));
                then.status(200).json_body(serde_json::json!({"result": 4.0}));
            })
            .await;

        let evaluator = HttpEvaluator::new(server.base_url(), None).unwrap();
        let result = evaluator
            .evaluate(&EvalRequest::unary("sqrt", 16.0))
            .await
            .unwrap();

        api_mock.assert_async().await;
        assert_eq!(result, 4.0);
    }

    #[tokio::test]
    async fn test_error_field_with_bad_request_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/calculate");
                then.status(400)
                    .json_body(serde_json::json!({"error": "Division by zero"}));
            })
            .await;

        let evaluator = HttpEvaluator::new(server.base_url(), None).unwrap();
        let err = evaluator
            .evaluate(&EvalRequest::binary(OperatorKind::Divide, 1.0, 0.0))
            .await
            .unwrap_err();

        assert!(err.is_evaluation_error());
        assert_eq!(err.to_string(), "Division by zero");
    }

    #[tokio::test]
    async fn test_error_field_wins_even_with_ok_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/calculate");
                then.status(200)
                    .json_body(serde_json::json!({"error": "Unknown operation: pow", "result": 1.0}));
            })
            .await;

        let evaluator = HttpEvaluator::new(server.base_url(), None).unwrap();
        let err = evaluator
            .evaluate(&EvalRequest::unary("pow", 2.0))
            .await
            .unwrap_err();
        assert!(err.is_evaluation_error());
    }

    #[tokio::test]
    async fn test_non_json_body_is_request_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/calculate");
                then.status(502).body("<html>Bad Gateway</html>");
            })
            .await;

        let evaluator = HttpEvaluator::new(server.base_url(), None).unwrap();
        let err = evaluator
            .evaluate(&EvalRequest::binary(OperatorKind::Add, 1.0, 1.0))
            .await
            .unwrap_err();
        assert!(err.is_request_failure());
        assert_eq!(err.user_friendly_message(), "Calculation error");
    }

    #[tokio::test]
    async fn test_missing_result_is_request_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/calculate");
                then.status(200).json_body(serde_json::json!({"error": ""}));
            })
            .await;

        let evaluator = HttpEvaluator::new(server.base_url(), None).unwrap();
        let err = evaluator
            .evaluate(&EvalRequest::binary(OperatorKind::Add, 1.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, CalcError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_request_failure() {
        // Nothing listens on port 9 of the loopback interface.
        let evaluator =
            HttpEvaluator::new("http://127.0.0.1:9", Some(Duration::from_secs(2))).unwrap();
        let err = evaluator
            .evaluate(&EvalRequest::binary(OperatorKind::Add, 1.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, CalcError::Request(_)));
    }

    #[tokio::test]
    async fn test_evaluate_expression_endpoint() {
        let server = MockServer::start_async().await;
        let api_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/evaluate")
                    .json_body(serde_json::json!({"expression": "6 / -2"}));
                then.status(200)
                    .json_body(serde_json::json!({"result": -3.0, "expression": "6 / -2"}));
            })
            .await;

        let evaluator = HttpEvaluator::new(format!("{}/", server.base_url()), None).unwrap();
        let result = evaluator.evaluate_expression("6 / -2").await.unwrap();

        api_mock.assert_async().await;
        assert_eq!(result, -3.0);
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let evaluator = HttpEvaluator::new("http://localhost:8080/", None).unwrap();
        assert_eq!(evaluator.base_url(), "http://localhost:8080");
    }
}
