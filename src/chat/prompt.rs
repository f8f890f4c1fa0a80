//! Mode-aware prompt composition.
//!
//! Every prompt the pipeline sends is assembled here by layering a fixed
//! persona, a mode-specific instruction block, the retrieval or web
//! context (when any), and a formatting-rule variant chosen by the
//! comprehensive-query classification.

use std::fmt::Write as _;

use crate::models::{RetrievedMatch, SessionMode};

/// Token budgets per generation class.
pub const MAX_TOKENS_ANSWER: u32 = 1_500;
pub const MAX_TOKENS_COMPREHENSIVE: u32 = 2_500;
pub const MAX_TOKENS_FALLBACK: u32 = 1_000;
pub const MAX_TOKENS_RECONCILE: u32 = 1_000;
pub const MAX_TOKENS_GREETING: u32 = 100;
pub const MAX_TOKENS_TITLE: u32 = 15;

/// Fixed persona system prompt layered under every interaction.
const PERSONA: &str = "\
You are a friendly, knowledgeable study companion. You help users unlock \
the knowledge in their uploaded documents: you explain rather than just \
retrieve, you connect ideas across documents, and you always cite the \
specific documents you drew from. If something is not in the knowledge \
base, say so plainly instead of guessing, and distinguish document facts \
from your own reasoning. Be warm and conversational, never robotic, and \
end substantive answers with an invitation to explore further.";

const STUDY_BLOCK: &str = "\
**STUDY MODE - PERSONAL TUTOR:**

Act as a patient, encouraging tutor. Break complex topics into simple \
explanations, use analogies and examples, and check understanding with \
friendly follow-up questions.

If the user asks to create flashcards (\"create flashcards\", \"make \
flashcards\", \"flashcards please\", or similar), you MUST use this EXACT \
format for each card:

FLASHCARD_START
Q: [Clear, specific question]
A: [Concise, accurate answer]
FLASHCARD_END

Generate 5-10 flashcards covering the key concepts. Every card needs both \
markers. Do not just suggest questions - emit the cards with the markers.

If the user asks to be quizzed, ask what format they prefer (multiple \
choice, fill-in-the-blank, or descriptive), then generate 5-10 questions \
from the material. End responses by suggesting related questions to \
explore next.";

const RESEARCH_BLOCK: &str = "\
**RESEARCH MODE - IN-DEPTH ANALYSIS:**

Act as a research analyst. Provide thorough analysis with multiple \
perspectives, cross-reference information across all available documents, \
highlight patterns and connections, point out areas needing further \
investigation, and synthesize complex information into clear insights.";

const CASUAL_BLOCK: &str = "\
**CASUAL MODE - FRIENDLY CONVERSATION:**

Keep things light and conversational. Get straight to the point while \
staying warm, and balance detail with brevity - like chatting with a \
smart friend.";

/// The mode-specific instruction block (fixed content per mode).
pub fn mode_block(mode: SessionMode) -> &'static str {
    match mode {
        SessionMode::Study => STUDY_BLOCK,
        SessionMode::Research => RESEARCH_BLOCK,
        SessionMode::Casual => CASUAL_BLOCK,
    }
}

/// Formatting rules for comprehensive queries: stricter anti-hallucination
/// constraints, tables, and structured lists.
fn comprehensive_rules(chunk_count: usize) -> String {
    format!(
        "**CRITICAL INSTRUCTIONS:**\n\n\
         You are analyzing {chunk_count} text chunks retrieved from the user's \
         documents. Provide a COMPREHENSIVE answer.\n\n\
         **STRICT RULES:**\n\
         1. NO HALLUCINATIONS: only include information explicitly stated in the context chunks\n\
         2. NO IMPLIED CONTENT: never report that something is \"implied but not mentioned\"\n\
         3. NO INVENTED DETAILS: if an item is not in the context, leave it out\n\
         4. Use numbered lists for main items and bullet points for details\n\
         5. Place \"Source: [Document.pdf, p.5]\" on its OWN LINE after each section, \
         never inside a list item\n\
         6. When comparing items or showing structured data, create markdown tables\n\
         7. Keep paragraphs short (2-3 sentences)\n\
         8. If you find 3 items, list exactly those 3 - never pad the list\n\n\
         Now provide your comprehensive answer using ONLY the information from the \
         {chunk_count} chunks above."
    )
}

/// Formatting rules for ordinary queries: shorter, same grounding rules.
const STANDARD_RULES: &str = "\
**INSTRUCTIONS:**

Answer the user's question using ONLY information from the retrieved \
context chunks above.

**RULES:**
- Place citations at the END of each section: \"Source: [Document.pdf, p.5]\"
- Create markdown tables when comparing items or showing structured data
- Use bullet points instead of long paragraphs
- Be specific and factual
- If the context doesn't contain enough information, clearly state this
- Don't invent or imply information that isn't explicitly in the context";

/// Assemble retrieval context text: one `[doc, p.N]`-headed block per
/// match, in retrieval order.
pub fn build_context(matches: &[RetrievedMatch]) -> String {
    let mut parts = Vec::with_capacity(matches.len());
    for m in matches {
        let page_label = m.page.map(|p| format!(", p.{p}")).unwrap_or_default();
        parts.push(format!("[{}{}]\n{}", m.document, page_label, m.text));
    }
    parts.join("\n\n")
}

/// Grounded-answer prompt: persona + mode block + retrieval context +
/// formatting rules chosen by the comprehensive classification.
pub fn grounded_prompt(
    mode: SessionMode,
    context: &str,
    query: &str,
    comprehensive: bool,
    chunk_count: usize,
) -> String {
    let rules = if comprehensive {
        comprehensive_rules(chunk_count)
    } else {
        STANDARD_RULES.to_string()
    };
    format!(
        "{PERSONA}\n\n{}\n\n**Retrieved Context from User's Documents:**\n\n\
         {context}\n\n**User Question:** {query}\n\n{rules}",
        mode_block(mode)
    )
}

/// Answer-from-web prompt, used when the corpus is absent or irrelevant.
pub fn web_answer_prompt(mode: Option<SessionMode>, web_context: &str, query: &str) -> String {
    let mut prompt = String::from(PERSONA);
    if let Some(mode) = mode {
        write!(prompt, "\n\n{}", mode_block(mode)).unwrap();
    }
    write!(
        prompt,
        "\n\n**Web Search Results:**\n\n{web_context}\n\n\
         **User Question:** {query}\n\n\
         **INSTRUCTIONS:**\n\
         - Answer using the web search results above\n\
         - Cite sources with titles and URLs in format: [Source Title](URL)\n\
         - Use bullet points for clarity\n\
         - Be factual and concise\n\
         - Do NOT mention that the user's documents lack this information - \
         present this as a normal, helpful answer"
    )
    .unwrap();
    prompt
}

/// Unconstrained direct answer, used when documents exist but nothing
/// relevant was found and web search came back empty.
pub fn general_prompt(query: &str) -> String {
    format!(
        "{PERSONA}\n\n**User Question:** {query}\n\n\
         Provide a helpful general response. Be warm and friendly."
    )
}

/// Direct answer with no grounding, gently suggesting a document upload.
pub fn no_docs_prompt(query: &str) -> String {
    format!(
        "{PERSONA}\n\n**User Question:** {query}\n\n\
         **Note:** No documents have been uploaded to the knowledge base yet. \
         Provide a helpful general response. You may gently remind the user \
         that they can upload documents to enable personalized retrieval from \
         their own material."
    )
}

/// Study-mode answer when retrieval found nothing relevant: encouraging,
/// never web-augmented.
pub fn study_no_corpus_prompt(query: &str) -> String {
    format!(
        "{PERSONA}\n\n{STUDY_BLOCK}\n\n**User Question:** {query}\n\n\
         There are no documents on this topic in the knowledge base yet. \
         Provide a helpful, encouraging response and gently suggest uploading \
         relevant materials for personalized study assistance."
    )
}

/// One-sentence reply to a bare greeting.
pub fn greeting_prompt(query: &str) -> String {
    format!(
        "Respond to this greeting briefly and warmly: \"{query}\"\n\n\
         Keep it to 1 sentence. Just greet them back and ask how you can \
         help. Don't introduce yourself or explain your capabilities."
    )
}

/// Second-pass prompt reconciling a grounded answer with web findings.
/// The web section is mandatory; the discrepancy section may only appear
/// when actual factual contradictions exist, and its absence must be
/// silent - no "no discrepancies found" statements.
pub fn reconciliation_prompt(corpus_answer: &str, web_context: &str) -> String {
    format!(
        "You have two sources of information:\n\n\
         **CORPUS ANSWER (from the user's documents):**\n{corpus_answer}\n\n\
         **WEB SEARCH RESULTS:**\n{web_context}\n\n\
         **TASK:**\n\
         1. Create a \"Web Information\" section that starts with: \
         \"But, here is what I found on the web...\"\n\
         2. Summarize key information from the web results with citations \
         (format: [Source Title](URL))\n\
         3. ONLY if you find ACTUAL contradictions in facts, dates, numbers, \
         definitions, or statements between the corpus and the web, add a \
         \"Discrepancies\" section listing the specific differences \
         (\"Your document states X, but web sources indicate Y\").\n\n\
         If the information aligns: do NOT write anything about \
         discrepancies, do NOT say \"no discrepancies were found\", do not \
         mention discrepancies at all - end after the web information \
         section.\n\n\
         Output ONLY the web section and, if needed, the discrepancies \
         section. Do NOT repeat the corpus answer."
    )
}

/// 3-5 word session title from the first user message.
pub fn title_prompt(first_message: &str) -> String {
    let snippet: String = first_message.chars().take(100).collect();
    format!("3-5 word title for: {snippet}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match(document: &str, page: Option<u32>, text: &str) -> RetrievedMatch {
        RetrievedMatch {
            namespace: "user_a".into(),
            score: 0.9,
            document: document.into(),
            page,
            text: text.into(),
        }
    }

    #[test]
    fn test_context_block_has_page_labels() {
        let ctx = build_context(&[sample_match("report.pdf", Some(5), "the refund policy")]);
        assert!(ctx.contains("[report.pdf, p.5]"));
        assert!(ctx.contains("the refund policy"));
    }

    #[test]
    fn test_context_block_omits_missing_page() {
        let ctx = build_context(&[sample_match("notes.pdf", None, "chunk text")]);
        assert!(ctx.contains("[notes.pdf]"));
        assert!(!ctx.contains("p."));
    }

    #[test]
    fn test_context_preserves_retrieval_order() {
        let ctx = build_context(&[
            sample_match("a.pdf", None, "first"),
            sample_match("b.pdf", None, "second"),
        ]);
        assert!(ctx.find("first").unwrap() < ctx.find("second").unwrap());
    }

    #[test]
    fn test_mode_blocks_are_distinct() {
        assert!(mode_block(SessionMode::Study).contains("FLASHCARD_START"));
        assert!(mode_block(SessionMode::Research).contains("RESEARCH MODE"));
        assert!(mode_block(SessionMode::Casual).contains("CASUAL MODE"));
    }

    #[test]
    fn test_grounded_prompt_standard_rules() {
        let prompt = grounded_prompt(SessionMode::Casual, "ctx", "q", false, 5);
        assert!(prompt.contains("**INSTRUCTIONS:**"));
        assert!(!prompt.contains("COMPREHENSIVE answer"));
        assert!(prompt.contains("ctx"));
        assert!(prompt.contains("**User Question:** q"));
    }

    #[test]
    fn test_grounded_prompt_comprehensive_rules() {
        let prompt = grounded_prompt(SessionMode::Research, "ctx", "list all items", true, 35);
        assert!(prompt.contains("COMPREHENSIVE answer"));
        assert!(prompt.contains("35 text chunks"));
        assert!(prompt.contains("NO HALLUCINATIONS"));
    }

    #[test]
    fn test_reconciliation_prompt_demands_silence_on_no_discrepancies() {
        let prompt = reconciliation_prompt("corpus", "web");
        assert!(prompt.contains("But, here is what I found on the web"));
        assert!(prompt.contains("do NOT say \"no discrepancies were found\""));
        assert!(prompt.contains("ACTUAL contradictions"));
    }

    #[test]
    fn test_greeting_prompt_is_one_sentence_instruction() {
        let prompt = greeting_prompt("hi!");
        assert!(prompt.contains("1 sentence"));
        assert!(prompt.contains("\"hi!\""));
    }

    #[test]
    fn test_web_answer_prompt_with_and_without_mode() {
        let with_mode = web_answer_prompt(Some(SessionMode::Research), "web ctx", "q");
        assert!(with_mode.contains("RESEARCH MODE"));
        let without = web_answer_prompt(None, "web ctx", "q");
        assert!(!without.contains("RESEARCH MODE"));
        assert!(without.contains("web ctx"));
    }

    #[test]
    fn test_title_prompt_truncates_long_messages() {
        let long = "z".repeat(500);
        let prompt = title_prompt(&long);
        assert!(prompt.len() < 150);
    }
}
