use crate::completion::{ChatMessage, CompletionClient, CompletionRequest};
use crate::config::AssistantConfig;
use crate::context::{build_context, ReminderSource};
use crate::error::AssistantError;
use serde::Serialize;

const PERSONA: &str = "You are a helpful medication assistant for elderly users.
You help them with:
- Remembering when to take their medications
- Understanding their medication instructions
- Answering questions about their prescriptions
- Providing encouragement and support

Be warm, patient, and speak clearly. Use simple language and short sentences.
If the user mentions feeling unwell or having side effects, remind them to contact their doctor.";

const EMPTY_CONTEXT: &str = "No medications scheduled right now";

const QUOTE_INSTRUCTION: &str = "Generate one short motivational quote for elderly people. \
10-12 simple words. Tone must be positive and loving. No complex vocabulary.";

const REMINDER_INSTRUCTION: &str = "You are giving a medication reminder to an elderly user. \
Output should be 1-2 lines, slow, simple, and polite.";

const SUMMARY_INSTRUCTION: &str = "You are summarizing today's medicines. Be encouraging and warm.";

/// One assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DialogueExchange {
    pub utterance: String,
    pub context: String,
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderMessage {
    pub reminder: String,
    pub quote: String,
}

fn system_prompt(context: &str) -> String {
    let context = if context.trim().is_empty() {
        EMPTY_CONTEXT
    } else {
        context
    };
    format!("{PERSONA}\n\nCurrent context: {context}")
}

/// Stateless bridge between user utterances and the completion service.
///
/// Every call issues fresh requests. Nothing is cached and nothing is
/// retried; callers decide what to do with a failure.
#[derive(Debug, Clone)]
pub struct DialogueBridge {
    client: CompletionClient,
    config: AssistantConfig,
}

impl DialogueBridge {
    pub fn new(config: AssistantConfig) -> Result<Self, AssistantError> {
        let client = CompletionClient::new(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Answers `utterance` given a pre-built medication `context`.
    pub async fn respond(
        &self,
        utterance: &str,
        context: &str,
    ) -> Result<DialogueExchange, AssistantError> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(AssistantError::InvalidInput(
                "message must not be empty".to_string(),
            ));
        }

        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt(context)),
                ChatMessage::user(utterance),
            ],
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
        };
        let reply = self.client.complete(&request).await?;
        tracing::debug!(reply_len = reply.len(), "assistant replied");

        Ok(DialogueExchange {
            utterance: utterance.to_string(),
            context: context.to_string(),
            reply,
        })
    }

    /// Builds the context from `source` then answers `utterance`.
    pub async fn converse<S: ReminderSource>(
        &self,
        source: &S,
        utterance: &str,
    ) -> Result<DialogueExchange, AssistantError> {
        let context = build_context(source, self.config.default_context_limit).await?;
        self.respond(utterance, &context).await
    }

    /// Produces a short spoken reminder for one dose. A motivational quote is
    /// generated first and woven into the reminder.
    pub async fn compose_reminder(
        &self,
        name: &str,
        dose: &str,
        time: &str,
    ) -> Result<ReminderMessage, AssistantError> {
        if name.trim().is_empty() {
            return Err(AssistantError::InvalidInput(
                "medicine name must not be empty".to_string(),
            ));
        }

        let quote = self
            .client
            .complete(&self.plain_request(QUOTE_INSTRUCTION, "Give me a motivational quote"))
            .await?;

        let prompt = format!(
            "Create a reminder message for: Medicine: {name}, Dose: {dose}, Time: {time}. Include this quote: {quote}"
        );
        let reminder = self
            .client
            .complete(&self.plain_request(REMINDER_INSTRUCTION, prompt))
            .await?;

        Ok(ReminderMessage { reminder, quote })
    }

    /// Writes an encouraging summary of today's adherence.
    pub async fn summarize_day(&self, completed: u32, missed: u32) -> Result<String, AssistantError> {
        let prompt = format!(
            "Create a daily summary: Completed {completed} reminders, Missed {missed} reminders. Make it encouraging and supportive."
        );
        self.client
            .complete(&self.plain_request(SUMMARY_INSTRUCTION, prompt))
            .await
    }

    fn plain_request(&self, instruction: &str, prompt: impl Into<String>) -> CompletionRequest {
        CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::system(instruction), ChatMessage::user(prompt)],
            temperature: None,
            max_tokens: None,
        }
    }
}
