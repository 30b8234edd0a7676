//! Answer generation over retrieved context
//!
//! The pipeline retrieves a ranked context for a question and asks the
//! chat model to answer from it. When retrieval finds nothing relevant
//! the model is not called at all.
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vecrag_core::{ChatClient, Citation, Result};

use crate::context::RetrievalOutcome;
use crate::RetrievalOrchestrator;

/// Reply used when retrieval yields no usable context
pub const NO_CONTEXT_ANSWER: &str =
    "No relevant context was found in the knowledge base for this question.";

const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant. Answer the question using only \
the numbered context passages. If the passages do not contain the answer, say so.";

/// Generated answer with the citations it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub content: String,
    pub citations: Vec<Citation>,
    /// False when no context was retrieved and the model was skipped
    pub grounded: bool,
}

impl Answer {
    fn no_context() -> Self {
        Self {
            content: NO_CONTEXT_ANSWER.to_string(),
            citations: Vec::new(),
            grounded: false,
        }
    }
}

/// Retrieval plus chat completion
pub struct RagPipeline {
    orchestrator: Arc<RetrievalOrchestrator>,
    chat: Arc<dyn ChatClient>,
}

impl RagPipeline {
    pub fn new(orchestrator: Arc<RetrievalOrchestrator>, chat: Arc<dyn ChatClient>) -> Self {
        Self { orchestrator, chat }
    }

    pub fn orchestrator(&self) -> &RetrievalOrchestrator {
        &self.orchestrator
    }

    /// Answer a question from the top `limit` passages
    pub async fn ask(
        &self,
        question: &str,
        limit: usize,
        min_score: Option<f32>,
    ) -> Result<Answer> {
        let context = match self.orchestrator.retrieve(question, limit, min_score).await? {
            RetrievalOutcome::Context(context) => context,
            RetrievalOutcome::NoRelevantContext => {
                tracing::info!("No relevant context, skipping chat model");
                return Ok(Answer::no_context());
            }
        };

        let user = PromptBuilder::new()
            .add_context(context.context_block())
            .question(question)
            .add_instruction("Cite passages by their [#n] marker")
            .build();

        tracing::info!(
            client = self.chat.name(),
            passages = context.len(),
            "Calling chat model with prompt length: {} chars",
            user.len()
        );
        let content = self.chat.complete(SYSTEM_INSTRUCTION, &user).await?;
        tracing::debug!("Chat response received: {} chars", content.len());

        Ok(Answer {
            content,
            citations: context.citations(),
            grounded: true,
        })
    }
}

// ============================================================================
// Prompt Builder
// ============================================================================

/// Builder for the user message sent to the chat model
pub struct PromptBuilder {
    context_sections: Vec<String>,
    question: String,
    instructions: Vec<String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            context_sections: Vec::new(),
            question: String::new(),
            instructions: Vec::new(),
        }
    }

    /// Add a context section
    pub fn add_context(mut self, context: impl Into<String>) -> Self {
        self.context_sections.push(context.into());
        self
    }

    /// Set the question
    pub fn question(mut self, q: impl Into<String>) -> Self {
        self.question = q.into();
        self
    }

    /// Add an instruction
    pub fn add_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instructions.push(instruction.into());
        self
    }

    /// Build the final prompt
    pub fn build(self) -> String {
        let mut prompt = String::new();

        if !self.question.is_empty() {
            prompt.push_str("<question>\n");
            prompt.push_str(&self.question);
            prompt.push_str("\n</question>\n\n");
        }

        if !self.context_sections.is_empty() {
            prompt.push_str("<context>\n");
            for section in &self.context_sections {
                prompt.push_str(section.trim_end());
                prompt.push('\n');
            }
            prompt.push_str("</context>\n\n");
        }

        if !self.instructions.is_empty() {
            prompt.push_str("<instructions>\n");
            for (i, inst) in self.instructions.iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", i + 1, inst));
            }
            prompt.push_str("</instructions>\n");
        }

        prompt
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_builder() {
        let prompt = PromptBuilder::new()
            .add_context("[#1] Context from document A")
            .add_context("[#2] Context from document B")
            .question("What is the answer?")
            .add_instruction("Be concise")
            .add_instruction("Cite sources")
            .build();

        assert!(prompt.starts_with("<question>\nWhat is the answer?\n</question>"));
        assert!(prompt.contains("<context>\n[#1] Context from document A\n[#2]"));
        assert!(prompt.contains("1. Be concise"));
        assert!(prompt.contains("2. Cite sources"));
    }

    #[test]
    fn test_empty_builder_is_empty() {
        assert!(PromptBuilder::default().build().is_empty());
    }

    #[test]
    fn test_no_context_answer_is_ungrounded() {
        let answer = Answer::no_context();
        assert!(!answer.grounded);
        assert!(answer.citations.is_empty());
        assert_eq!(answer.content, NO_CONTEXT_ANSWER);
    }
}
