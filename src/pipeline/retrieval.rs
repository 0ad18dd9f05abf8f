use super::embedding::{Embedder, EmbeddingError};
use super::generation::TextGenerator;
use super::index::PassageSearch;

/// Content written into a section when retrieval yields nothing.
pub const NOT_PROVIDED: &str = "Not provided";

/// Passages retrieved per section in extractive mode.
pub const DEFAULT_RETRIEVE_K: usize = 6;
/// Passages handed to the generator in summarized mode.
pub const DEFAULT_SUMMARIZE_K: usize = 12;

const SUMMARY_MAX_TOKENS: u32 = 512;

const SUMMARY_SYSTEM_PROMPT: &str = "You are drafting an Informed Consent Form for a clinical \
trial. Rewrite protocol excerpts in plain language that a reader at an eighth-grade reading \
level can understand. Use only the provided excerpts and do not invent details.";

/// The four ICF sections, in template order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Purpose,
    Procedure,
    Risks,
    Benefits,
}

/// Fixed processing order; the assembler writes slots in this order too.
pub const ALL_SECTIONS: [Section; 4] = [
    Section::Purpose,
    Section::Procedure,
    Section::Risks,
    Section::Benefits,
];

impl Section {
    /// Fixed retrieval query for this section. Static configuration, total
    /// over the enum.
    pub fn query(&self) -> &'static str {
        match self {
            Section::Purpose => "Clinical Study Purpose",
            Section::Procedure => "Clinical Study Procedure",
            Section::Risks => "Clinical Study Risks",
            Section::Benefits => "Clinical Study Benefits",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Purpose => "Purpose",
            Section::Procedure => "Procedure",
            Section::Risks => "Risks",
            Section::Benefits => "Benefits",
        }
    }
}

/// Populated text for one ICF section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionText {
    pub section: Section,
    pub content: String,
}

/// Retrieve the top-k passages for `section` and join their texts with a
/// newline, most similar first. Zero results yield the `NOT_PROVIDED`
/// default rather than an empty string.
pub fn retrieve(
    section: Section,
    embedder: &dyn Embedder,
    search: &dyn PassageSearch,
    top_k: usize,
) -> Result<SectionText, EmbeddingError> {
    let query_embedding = embedder.embed(section.query())?;
    let results = search.search(&query_embedding, top_k);

    let content = if results.is_empty() {
        NOT_PROVIDED.to_string()
    } else {
        results
            .iter()
            .map(|r| r.passage.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    };

    Ok(SectionText { section, content })
}

/// Like `retrieve`, but routes the joined passages through a generation
/// collaborator for a plain-language summary. Generation failure is never
/// fatal: it falls back to the raw joined passages.
pub fn summarize(
    section: Section,
    embedder: &dyn Embedder,
    search: &dyn PassageSearch,
    generator: &dyn TextGenerator,
    top_k: usize,
) -> Result<SectionText, EmbeddingError> {
    let extracted = retrieve(section, embedder, search, top_k)?;
    if extracted.content == NOT_PROVIDED {
        return Ok(extracted);
    }

    let user_prompt = summary_prompt(section, &extracted.content);
    match generator.complete(SUMMARY_SYSTEM_PROMPT, &user_prompt, SUMMARY_MAX_TOKENS) {
        Ok(summary) if !summary.trim().is_empty() => Ok(SectionText {
            section,
            content: summary,
        }),
        Ok(_) => {
            tracing::warn!(section = section.title(), "empty summary, keeping raw passages");
            Ok(extracted)
        }
        Err(e) => {
            tracing::warn!(
                section = section.title(),
                error = %e,
                "summarization failed, falling back to retrieved passages"
            );
            Ok(extracted)
        }
    }
}

fn summary_prompt(section: Section, passages: &str) -> String {
    format!(
        "-Goal-\nSummarize the {title} section of a clinical study protocol for an Informed \
Consent Form.\n\n-Context-\n{passages}\n\n-Steps-\n\
1. Identify the portions of the context relevant to the {title} section.\n\
2. Summarize them faithfully in plain language.\n\
3. Format the answer as a short paragraph.",
        title = section.title(),
    )
}
