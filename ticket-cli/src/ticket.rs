//! Support-ticket domain: categories, sentiment, and the schemas the model fills.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use structured_extractor::schema::{Field, Schema, SchemaError};

/// System prompt for customer replies.
pub const SUPPORT_PROMPT: &str = "You're a helpful customer care assistant that can classify incoming messages and create a response.";

/// System prompt for full ticket triage.
pub const TRIAGE_PROMPT: &str =
    "Analyze the incoming customer message and predict the values for the ticket.";

/// Phrases a reply must never contain.
const REPUTATION_DENYLIST: &[&str] = &[
    "company is a scam",
    "we are a scam",
    "we're a scam",
    "scam company",
    "company is a fraud",
    "we are frauds",
    "rip-off",
    "ripoff",
    "worst company",
    "don't trust us",
    "do not trust us",
];

/// Category of an incoming ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketCategory {
    /// Anything else.
    General,
    /// Orders and shipping.
    Order,
    /// Invoices and payments.
    Billing,
}

impl TicketCategory {
    /// Every category, in schema order.
    pub const ALL: [Self; 3] = [Self::General, Self::Order, Self::Billing];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Order => "order",
            Self::Billing => "billing",
        }
    }
}

/// Customer mood detected in a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerSentiment {
    /// Unhappy customer.
    Negative,
    /// Neither.
    Neutral,
    /// Happy customer.
    Positive,
}

impl CustomerSentiment {
    /// Every sentiment, in schema order.
    pub const ALL: [Self; 3] = [Self::Negative, Self::Neutral, Self::Positive];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Positive => "positive",
        }
    }
}

/// A categorized reply to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Text sent to the customer.
    pub content: String,
    /// Ticket category.
    pub category: TicketCategory,
}

/// A fully triaged ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Text sent to the customer.
    pub reply: String,
    /// Ticket category.
    pub category: TicketCategory,
    /// Confidence in the category, between 0 and 1.
    pub confidence: f64,
    /// Customer sentiment.
    pub sentiment: CustomerSentiment,
}

/// Schema of [`Reply`].
///
/// # Errors
/// Never in practice; the descriptor is static.
pub fn reply_schema() -> Result<Schema, SchemaError> {
    Schema::builder("reply")
        .description("Function to respond to a customer query.")
        .field(Field::string("content").describe("Your reply that we send to the customer."))
        .field(
            Field::enumeration("category", TicketCategory::ALL.map(TicketCategory::as_str))
                .describe("Category of the ticket."),
        )
        .build()
}

/// Schema of [`Ticket`].
///
/// # Errors
/// Never in practice; the descriptor is static.
pub fn ticket_schema() -> Result<Schema, SchemaError> {
    Schema::builder("ticket")
        .description("Triage result for an incoming customer message.")
        .field(Field::string("reply").describe("Your reply that we send to the customer."))
        .field(
            Field::enumeration("category", TicketCategory::ALL.map(TicketCategory::as_str))
                .describe("Category of the ticket."),
        )
        .field(
            Field::number_range("confidence", 0.0, 1.0)
                .describe("Confidence in the category prediction."),
        )
        .field(
            Field::enumeration("sentiment", CustomerSentiment::ALL.map(CustomerSentiment::as_str))
                .describe("Sentiment of the customer message."),
        )
        .build()
}

/// Rejects replies that could hurt the reputation of the company.
///
/// # Errors
/// Returns the reason when the reply contains a denylisted phrase. Phrases
/// match on whole words, case-insensitively.
pub fn reputation_check(value: &Value) -> Result<(), String> {
    let Some(text) = value.as_str() else {
        return Ok(());
    };
    let normalized = text.to_lowercase().replace('\u{2019}', "'");
    let words: Vec<&str> = normalized
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
        .filter(|word| !word.is_empty())
        .collect();

    REPUTATION_DENYLIST
        .iter()
        .find(|phrase| {
            let phrase: Vec<&str> = phrase.split(' ').collect();
            words.windows(phrase.len()).any(|window| window == phrase.as_slice())
        })
        .map_or(Ok(()), |phrase| {
            Err(format!(
                "the reply says \"{phrase}\"; never say things that could hurt the reputation of the company"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_variants_match_serde_names() {
        let schema = ticket_schema().unwrap();
        let instance = schema
            .validate(&json!({
                "reply": "Happy to help with your bill.",
                "category": "billing",
                "confidence": 0.92,
                "sentiment": "neutral"
            }))
            .unwrap();

        let ticket: Ticket = instance.deserialize().unwrap();
        assert_eq!(ticket.category, TicketCategory::Billing);
        assert_eq!(ticket.sentiment, CustomerSentiment::Neutral);
    }

    #[test]
    fn test_ticket_schema_rejects_percent_confidence() {
        let schema = ticket_schema().unwrap();
        let err = schema
            .validate(&json!({
                "reply": "Sure.",
                "category": "order",
                "confidence": 85,
                "sentiment": "positive"
            }))
            .unwrap_err();
        assert_eq!(err.fields(), vec!["confidence"]);
    }

    #[test]
    fn test_reply_schema_rejects_banana() {
        let err = reply_schema()
            .unwrap()
            .validate(&json!({"content": "Hi!", "category": "banana"}))
            .unwrap_err();
        assert!(err.mentions("category"));
    }

    #[test]
    fn test_reputation_check() {
        assert!(reputation_check(&json!("Happy to help with your bill!")).is_ok());

        let reason = reputation_check(&json!("This company is a scam!!!")).unwrap_err();
        assert!(reason.contains("scam"));
        assert!(reason.contains("reputation"));
    }

    #[test]
    fn test_reputation_check_matches_whole_phrases() {
        for harmless in [
            "We'll check this transaction for fraud.",
            "That email asking for your password is a scam, please ignore it.",
            "Our fraud team has blocked the card.",
            "I can't scamper off without fixing this!",
        ] {
            assert!(reputation_check(&json!(harmless)).is_ok(), "{harmless}");
        }

        for harmful in [
            "Honestly, we\u{2019}re a scam.",
            "Yeah, this is the WORST COMPANY ever.",
            "Don't trust us with your money.",
            "What a rip-off!",
        ] {
            assert!(reputation_check(&json!(harmful)).is_err(), "{harmful}");
        }
    }
}
