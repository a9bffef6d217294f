use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::gemini::{GenerationBoundary, ModelRequest};
use crate::situation::{Language, Mode, SituationDetails};

/// Inline validation message shown before any network attempt.
pub const AMOUNT_REQUIRED: &str = "Please enter the amount that is due.";

/// The one message shown for any generation-time fault. Specifics go to
/// the log, not the user.
pub const GENERATION_FAILED: &str =
    "Could not draft reminders. Check your connection and API key, then try again.";

/// One generated message draft, labelled A-D.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReminderMessage {
    pub variant: String,
    pub title: String,
    pub content: String,
}

/// Everything one successful generation produces. Replaced wholesale on
/// each run, cleared on mode switch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReminderSet {
    pub summary: String,
    pub principles: Vec<String>,
    pub variants: Vec<ReminderMessage>,
    #[serde(rename = "voiceNote")]
    pub voice_note: String,
}

/// Validate the situation and build the boundary request from it.
/// Fails without side effects when the amount is missing.
pub fn build_request(details: &SituationDetails) -> Result<ModelRequest> {
    if details.amount.trim().is_empty() {
        return Err(anyhow!(AMOUNT_REQUIRED));
    }

    Ok(ModelRequest {
        system_instruction: system_instruction().to_string(),
        prompt: build_prompt(details),
        response_schema: response_schema(),
    })
}

/// Run one generation end to end: validate, build, call the boundary
/// once, parse the reply. Faults are logged here with their kind; the
/// caller shows [`GENERATION_FAILED`] regardless.
pub async fn generate<B>(boundary: &B, model: &str, details: &SituationDetails) -> Result<ReminderSet>
where
    B: GenerationBoundary + ?Sized,
{
    let request = build_request(details)?;

    let raw = match boundary.generate_json(model, &request).await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::error!(error = %err, "generation request failed");
            return Err(err);
        }
    };

    match parse_reminders(&raw) {
        Ok(set) => Ok(set),
        Err(err) => {
            tracing::error!(error = %err, reply_len = raw.len(), "model reply failed to parse");
            Err(err)
        }
    }
}

/// Parse the model's JSON text into a [`ReminderSet`], exactly as
/// returned: no reordering, no filling in of missing variants.
pub fn parse_reminders(text: &str) -> Result<ReminderSet> {
    serde_json::from_str(text).map_err(|e| anyhow!("reply did not match the reminder schema: {e}"))
}

fn system_instruction() -> &'static str {
    "You are an expert in persuasive, ethical debt-recovery communication. \
     You draft payment reminders that preserve the relationship while getting \
     results. Never threaten, never shame, never invent facts that were not \
     provided. Reply with JSON only, matching the requested schema exactly."
}

fn language_instruction(language: Language) -> &'static str {
    match language {
        Language::Hinglish => {
            "Write in Hinglish: a natural Hindi-English mix in Roman script, the way \
             people actually text in India (e.g. \"Bhai, woh payment ka scene clear \
             kar dete hain\"). Warm, conversational, never formal."
        }
        Language::English => {
            "Write in simple, polite Indian English. Short sentences, everyday \
             vocabulary, no legal or corporate jargon."
        }
    }
}

fn build_prompt(details: &SituationDetails) -> String {
    let mut prompt = String::new();

    match details.mode {
        Mode::Collect => {
            prompt.push_str(
                "Goal: get an overdue payment committed or paid while keeping the \
                 relationship intact.\n\n",
            );
        }
        Mode::Negotiate => {
            prompt.push_str(
                "Goal: the payer has asked for more time. Acknowledge the delay, \
                 agree on a concrete resolution, and lock in a commitment.\n\n",
            );
        }
    }

    prompt.push_str("Situation:\n");
    prompt.push_str(&format!("- Amount due: {}\n", details.amount));
    prompt.push_str(&format!("- Overdue for: {}\n", details.overdue));
    prompt.push_str(&format!("- The payer is my: {}\n", details.relationship));
    prompt.push_str(&format!("- Message will be sent via: {}\n", details.channel));
    if !details.customer_name.trim().is_empty() {
        prompt.push_str(&format!("- Payer's name: {}\n", details.customer_name));
    }
    if !details.your_name.trim().is_empty() {
        prompt.push_str(&format!("- My name: {}\n", details.your_name));
    }
    if !details.other_info.trim().is_empty() {
        prompt.push_str(&format!("- Extra context: {}\n", details.other_info));
    }

    if details.mode == Mode::Negotiate {
        prompt.push_str(&format!(
            "- Their stated reason for the delay: {}\n",
            details.effective_delay_reason()
        ));
        prompt.push_str(&format!(
            "- Resolution I want to propose: {}\n",
            details.effective_solution()
        ));
    }

    prompt.push('\n');
    prompt.push_str(language_instruction(details.language));
    prompt.push_str(
        "\n\nProduce:\n\
         - summary: one sentence describing the recommended overall approach.\n\
         - principles: 3 to 5 short labels naming the persuasion principles used \
           (e.g. Reciprocity, Social Proof, Commitment, Urgency).\n\
         - variants: exactly four message drafts labelled A to D, each with a \
           short title and 80-180 words of content suited to the channel above. \
           A: gentle friendly nudge. B: direct and professional. \
           C: empathetic with a clear deadline. D: firm final notice, still civil.\n\
         - voiceNote: a 30-second spoken script in the same language, \
           conversational, no stage directions.\n",
    );

    prompt
}

/// Response schema sent with the request, in Gemini's uppercase type
/// convention. Every field is required.
fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "principles": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "variants": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "variant": { "type": "STRING" },
                        "title": { "type": "STRING" },
                        "content": { "type": "STRING" }
                    },
                    "required": ["variant", "title", "content"]
                }
            },
            "voiceNote": { "type": "STRING" }
        },
        "required": ["summary", "principles", "variants", "voiceNote"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::situation::CUSTOM_SENTINEL;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Boundary double that counts calls and replies with canned text.
    struct CannedBoundary {
        calls: AtomicUsize,
        reply: String,
    }

    impl CannedBoundary {
        fn new(reply: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: reply.to_string(),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl GenerationBoundary for CannedBoundary {
        async fn generate_json(&self, _model: &str, _request: &ModelRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    fn valid_reply() -> String {
        json!({
            "summary": "Lead with warmth, close with a concrete date.",
            "principles": ["Reciprocity", "Commitment", "Urgency"],
            "variants": [
                {"variant": "A", "title": "Friendly nudge", "content": "Hey..."},
                {"variant": "B", "title": "Straight ask", "content": "Hi..."},
                {"variant": "C", "title": "Deadline", "content": "Hello..."},
                {"variant": "D", "title": "Final notice", "content": "Namaste..."}
            ],
            "voiceNote": "Arre sun, woh payment..."
        })
        .to_string()
    }

    fn filled_details() -> SituationDetails {
        let mut details = SituationDetails::default();
        details.amount = "₹500".to_string();
        details.overdue = "3 days".to_string();
        details
    }

    #[test]
    fn test_build_request_rejects_empty_amount() {
        let mut details = SituationDetails::default();
        details.amount = "   ".to_string();
        let err = build_request(&details).unwrap_err();
        assert_eq!(err.to_string(), AMOUNT_REQUIRED);
    }

    #[test]
    fn test_prompt_embeds_amount_and_overdue() {
        let request = build_request(&filled_details()).unwrap();
        assert!(request.prompt.contains("₹500"));
        assert!(request.prompt.contains("3 days"));
    }

    #[test]
    fn test_prompt_uses_custom_reason_not_sentinel() {
        let mut details = filled_details();
        details.mode = Mode::Negotiate;
        details.delay_reason = CUSTOM_SENTINEL.to_string();
        details.custom_reason = "Flight delay".to_string();

        let request = build_request(&details).unwrap();
        assert!(request.prompt.contains("Flight delay"));
        assert!(!request.prompt.contains(CUSTOM_SENTINEL));
    }

    #[test]
    fn test_collect_mode_omits_negotiation_fields() {
        let request = build_request(&filled_details()).unwrap();
        assert!(!request.prompt.contains("stated reason for the delay"));
        assert!(!request.prompt.contains("Resolution I want to propose"));
    }

    #[test]
    fn test_language_switches_instruction_block() {
        let mut details = filled_details();
        details.language = Language::Hinglish;
        let hinglish = build_request(&details).unwrap();
        assert!(hinglish.prompt.contains("Hinglish"));

        details.language = Language::English;
        let english = build_request(&details).unwrap();
        assert!(english.prompt.contains("Indian English"));
        assert!(!english.prompt.contains("Hinglish"));
    }

    #[test]
    fn test_schema_requires_every_field() {
        let schema = response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, ["summary", "principles", "variants", "voiceNote"]);
    }

    #[test]
    fn test_parse_preserves_variants_exactly() {
        let set = parse_reminders(&valid_reply()).unwrap();
        assert_eq!(set.variants.len(), 4);
        assert_eq!(set.variants[0].variant, "A");
        assert_eq!(set.variants[3].title, "Final notice");
        assert_eq!(set.principles, ["Reciprocity", "Commitment", "Urgency"]);
        assert_eq!(set.voice_note, "Arre sun, woh payment...");
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse_reminders("sorry, I cannot help with that").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert!(parse_reminders(r#"{"summary": "only this"}"#).is_err());
    }

    #[tokio::test]
    async fn test_generate_skips_boundary_on_empty_amount() {
        let boundary = CannedBoundary::new(&valid_reply());
        let details = SituationDetails::default();

        let err = generate(&boundary, "gemini-2.0-flash", &details)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), AMOUNT_REQUIRED);
        assert_eq!(boundary.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_calls_boundary_exactly_once() {
        let boundary = CannedBoundary::new(&valid_reply());
        let set = generate(&boundary, "gemini-2.0-flash", &filled_details())
            .await
            .unwrap();
        assert_eq!(boundary.call_count(), 1);
        assert_eq!(set.variants.len(), 4);
    }

    #[tokio::test]
    async fn test_generate_surfaces_parse_failure() {
        let boundary = CannedBoundary::new("not json at all");
        let result = generate(&boundary, "gemini-2.0-flash", &filled_details()).await;
        assert!(result.is_err());
        assert_eq!(boundary.call_count(), 1);
    }
}
