//! The two gateway calls of a run.
//!
//! Isolation trims the page Markdown down to prose about the event, in the
//! target language. Extraction maps that prose onto [`EventDetails`]. They are
//! different questions with different temperatures, not two attempts at the
//! same one.

use tracing::{info, instrument};

use crate::extractor::EventDetails;
use crate::llm::{client::OpenRouterClient, errors::LlmError};

/// Extraction is expected to be reproducible.
pub const EXTRACTION_TEMPERATURE: f32 = 0.0;

pub fn isolation_prompt(language: &str, markdown: &str) -> String {
    format!(
        "Isolate all the relevant information about the cultural event in the following content.\n\
         Relevant information includes the event description, date, place, organizer information, \
         performers, and details about the performers (biography, style).\n\
         Answer in {language}. Paraphrase as much as possible while keeping the original tone and style.\n\n\
         {markdown}"
    )
}

/// Shape description given to the model alongside the isolated prose.
pub fn event_schema(language: &str) -> String {
    format!(
        "{{\n\
         \x20 title: string | null // the event title, in {language}; null if none can be found\n\
         \x20 description: string | null // the full event description, in {language}, paraphrased, same tone and style; null if none can be found\n\
         \x20 date: string | null // start date of the event in ISO 8601 format; null if none can be found\n\
         \x20 place: string | null // the venue name; null if none can be found\n\
         \x20 address: string | null // the address as precise as possible (street, postal code, city, country) without the venue name; null if none can be found\n\
         }}"
    )
}

pub fn extraction_prompt(language: &str, isolated: &str) -> String {
    format!(
        "Considering the given event, return a JSON object shaped like this:\n{}\n\n{isolated}",
        event_schema(language)
    )
}

/// Isolation stage: free-text completion.
#[instrument(skip(client, markdown), fields(markdown_bytes = markdown.len()))]
pub async fn isolate(
    client: &OpenRouterClient,
    model: &str,
    language: &str,
    temperature: f32,
    markdown: &str,
) -> Result<String, LlmError> {
    let prompt = isolation_prompt(language, markdown);
    let isolated = client.complete_text(model, &prompt, temperature).await?;
    info!(isolated_bytes = isolated.len(), "Isolated event content");
    Ok(isolated)
}

/// Extraction stage: JSON-constrained completion at temperature 0.
#[instrument(skip(client, isolated), fields(isolated_bytes = isolated.len()))]
pub async fn extract(
    client: &OpenRouterClient,
    model: &str,
    language: &str,
    isolated: &str,
) -> Result<EventDetails, LlmError> {
    let prompt = extraction_prompt(language, isolated);
    let value = client
        .complete(model, &prompt, EXTRACTION_TEMPERATURE)
        .await?;

    let details: EventDetails = serde_json::from_value(value).map_err(|e| {
        LlmError::MalformedContent(format!("content does not match the event schema: {}", e))
    })?;
    Ok(details.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_prompt_carries_language_and_content() {
        let prompt = isolation_prompt("French", "# Concert\n\nSaturday");
        assert!(prompt.contains("Answer in French."));
        assert!(prompt.ends_with("# Concert\n\nSaturday"));
    }

    #[test]
    fn test_schema_lists_every_field() {
        let schema = event_schema("English");
        for field in ["title:", "description:", "date:", "place:", "address:"] {
            assert!(schema.contains(field), "missing {}", field);
        }
        assert!(schema.contains("in English"));
        assert!(schema.starts_with('{'));
        assert!(schema.ends_with('}'));
    }

    #[test]
    fn test_extraction_prompt_embeds_schema_then_prose() {
        let prompt = extraction_prompt("French", "Un concert samedi.");
        let schema_at = prompt.find("title:").unwrap();
        let prose_at = prompt.find("Un concert samedi.").unwrap();
        assert!(schema_at < prose_at);
        assert!(prompt.contains("JSON object"));
    }
}
