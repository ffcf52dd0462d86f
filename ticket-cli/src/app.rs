//! Command runners, generic over the model so they run against a script in tests.

use structured_extractor::extraction::{ExtractionMetrics, ExtractionMode, StructuredExtractor};
use structured_extractor::message::Conversation;
use structured_extractor::model::ModelCall;
use structured_extractor::response::ResponseFormat;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::ticket::{reply_schema, reputation_check, ticket_schema, Reply, Ticket, SUPPORT_PROMPT, TRIAGE_PROMPT};

/// Sends `message` as-is and returns the model's text.
///
/// The call is bounded by `config.timeout`, like the extraction commands.
pub async fn chat<M: ModelCall>(model: &M, message: &str, config: &AppConfig) -> Result<String, AppError> {
    let conversation = Conversation::from_prompt(SUPPORT_PROMPT, message);
    let response = tokio::time::timeout(config.timeout, model.call(&conversation, &ResponseFormat::Text))
        .await
        .map_err(|_| {
            warn!(limit = ?config.timeout, "chat request timed out");
            AppError::Timeout(config.timeout)
        })??;
    Ok(response.payload().to_string())
}

/// Produces a categorized reply in the given mode.
pub async fn reply<M: ModelCall>(
    model: M,
    message: &str,
    mode: ExtractionMode,
    config: &AppConfig,
) -> Result<(Reply, ExtractionMetrics), AppError> {
    let schema = reply_schema()?;
    let extractor = StructuredExtractor::new(model)
        .mode(mode)
        .timeout(config.timeout);

    let conversation = Conversation::from_prompt(SUPPORT_PROMPT, message);
    let (reply, metrics) = extractor
        .extract_typed::<Reply>(conversation, &schema, config.max_retries)
        .await?;

    info!(category = reply.category.as_str(), attempts = metrics.total_attempts, "reply ready");
    Ok((reply, metrics))
}

/// Triages a ticket, rejecting replies that fail the reputation check.
pub async fn triage<M: ModelCall>(
    model: M,
    message: &str,
    config: &AppConfig,
) -> Result<(Ticket, ExtractionMetrics), AppError> {
    let schema = ticket_schema()?;
    let extractor = StructuredExtractor::new(model)
        .timeout(config.timeout)
        .check("reply", reputation_check);

    let conversation = Conversation::from_prompt(TRIAGE_PROMPT, message);
    let (ticket, metrics) = extractor
        .extract_typed::<Ticket>(conversation, &schema, config.max_retries)
        .await?;

    info!(
        category = ticket.category.as_str(),
        sentiment = ticket.sentiment.as_str(),
        confidence = ticket.confidence,
        attempts = metrics.total_attempts,
        "ticket triaged"
    );
    Ok((ticket, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::{CustomerSentiment, TicketCategory};
    use std::sync::Arc;
    use std::time::Duration;
    use structured_extractor::extraction::ErrorKind;
    use structured_extractor::mock::ScriptedModel;
    use structured_extractor::model::ModelError;

    const BILL_QUESTION: &str = "Hi there, I have a question about my bill. Can you help me?";

    #[tokio::test]
    async fn test_chat_returns_text() {
        let model = ScriptedModel::new().respond_text("Of course! What's the question?");
        let text = chat(&model, BILL_QUESTION, &AppConfig::default()).await.unwrap();
        assert_eq!(text, "Of course! What's the question?");
        assert_eq!(model.calls()[0].format, ResponseFormat::Text);
    }

    #[tokio::test]
    async fn test_chat_transport_error() {
        let model = ScriptedModel::new().fail(ModelError::EmptyResponse);
        let err = chat(&model, BILL_QUESTION, &AppConfig::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Model(ModelError::EmptyResponse)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_gives_up_after_timeout() {
        let model = ScriptedModel::new().hang();
        let config = AppConfig {
            timeout: Duration::from_secs(5),
            ..AppConfig::default()
        };

        let err = chat(&model, BILL_QUESTION, &config).await.unwrap_err();

        assert!(matches!(err, AppError::Timeout(limit) if limit == Duration::from_secs(5)));
        assert!(err.to_string().contains("5s"));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_reply_json_mode_recovers_from_banana() {
        let model = Arc::new(
            ScriptedModel::new()
                .respond_text(r#"{"content": "Sure!", "category": "banana"}"#)
                .respond_text(r#"{"content": "Sure!", "category": "billing"}"#),
        );

        let (reply, metrics) = reply(
            Arc::clone(&model),
            BILL_QUESTION,
            ExtractionMode::Json,
            &AppConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(reply.category, TicketCategory::Billing);
        assert_eq!(metrics.total_attempts, 2);
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_triage_retries_reputation_failure() {
        let model = ScriptedModel::new()
            .respond_tool(
                "ticket",
                r#"{"reply": "This company is a scam!!!", "category": "billing", "confidence": 0.9, "sentiment": "neutral"}"#,
            )
            .respond_tool(
                "ticket",
                r#"{"reply": "Happy to help with your bill.", "category": "billing", "confidence": 0.9, "sentiment": "neutral"}"#,
            );

        let (ticket, metrics) = triage(model, BILL_QUESTION, &AppConfig::default()).await.unwrap();

        assert_eq!(ticket.reply, "Happy to help with your bill.");
        assert_eq!(ticket.sentiment, CustomerSentiment::Neutral);
        assert_eq!(metrics.total_attempts, 2);
    }

    #[tokio::test]
    async fn test_triage_respects_retry_budget() {
        let model = ScriptedModel::new().respond_tool(
            "ticket",
            r#"{"reply": "Thanks!", "category": "order", "confidence": 85, "sentiment": "positive"}"#,
        );
        let config = AppConfig {
            max_retries: 1,
            ..AppConfig::default()
        };

        let err = triage(model, "I would like to place an order.", &config).await.unwrap_err();

        let AppError::Extraction(err) = err else {
            panic!("expected an extraction error, got {err:?}");
        };
        assert_eq!(err.kind(), ErrorKind::RetryExhausted);
        assert_eq!(err.violations().unwrap()[0].field, "confidence");
    }
}
