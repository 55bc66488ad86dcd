//! Question classifier and instruction profiles.
//!
//! # Invariants
//! - Classification is a pure function of the input text.
//! - Matching is a case-insensitive substring test on the trimmed input.

/// Phrases that mark a question as small talk about the assistant itself.
pub const GENERAL_PHRASES: &[&str] = &[
    "hello",
    "hi",
    "who are you",
    "what are you",
    "how are you",
    "introduce yourself",
];

const EXIT_COMMANDS: &[&str] = &["exit", "quit"];

const CONVERSATIONAL_INSTRUCTIONS: &str = "You are a friendly study assistant. \
Answer questions about yourself naturally, without searching the documents. \
When a question is about the course material, search the uploaded documents \
and cite what you used.";

const GROUNDED_INSTRUCTIONS: &str = "Answer using the file_search tool over the \
uploaded documents. Always cite your sources with specific references. If the \
documents do not contain the answer, say so plainly.";

const CITATION_REQUIREMENT: &str = "Please give a complete answer based on the \
uploaded documents and include specific citations.";

/// Instruction profile selected for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionProfile {
    /// Greeting or question about the assistant; no document grounding.
    Conversational,
    /// Study question answered from the indexed documents with citations.
    DocumentGrounded,
}

impl InstructionProfile {
    /// Run-level instructions sent alongside the question.
    pub fn instructions(self) -> &'static str {
        match self {
            Self::Conversational => CONVERSATIONAL_INSTRUCTIONS,
            Self::DocumentGrounded => GROUNDED_INSTRUCTIONS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conversational => "conversational",
            Self::DocumentGrounded => "document_grounded",
        }
    }
}

/// Outgoing request text for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub profile: InstructionProfile,
    pub instructions: &'static str,
    pub content: String,
}

/// Classifies a question by substring match against [`GENERAL_PHRASES`].
pub fn classify_question(question: &str) -> InstructionProfile {
    let normalized = question.trim().to_lowercase();
    if GENERAL_PHRASES
        .iter()
        .any(|phrase| normalized.contains(phrase))
    {
        InstructionProfile::Conversational
    } else {
        InstructionProfile::DocumentGrounded
    }
}

/// Builds the request for a question.
///
/// Grounded questions get the citation requirement appended to the content;
/// conversational ones are sent verbatim.
pub fn build_query_request(question: &str) -> QueryRequest {
    let profile = classify_question(question);
    let content = match profile {
        InstructionProfile::Conversational => question.to_string(),
        InstructionProfile::DocumentGrounded => format!("{question}\n\n{CITATION_REQUIREMENT}"),
    };

    QueryRequest {
        profile,
        instructions: profile.instructions(),
        content,
    }
}

/// Returns whether the input ends the interactive loop.
pub fn is_exit_command(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    EXIT_COMMANDS.contains(&normalized.as_str())
}
