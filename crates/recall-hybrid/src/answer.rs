//! Extractive answer template over retrieved snippets.

use recall_core::types::SearchResult;

pub const NO_ANSWER: &str = "I don't have that information right now.";

/// Score lead over the runner-up at which the top snippet answers alone.
pub const DOMINANCE_MARGIN: f32 = 0.08;
/// Similarity at which the top snippet answers alone regardless of the runner-up.
pub const CONFIDENT_SCORE: f32 = 0.5;

fn first_sentence(text: &str) -> &str {
    let head = text.split(". ").next().unwrap_or(text).trim();
    head.trim_end_matches('.')
}

fn cite(result: &SearchResult) -> String {
    format!("{}. [{}]", first_sentence(&result.text), result.id)
}

/// Compose a short cited answer from results ordered best first.
///
/// A clearly dominant top result is quoted alone; otherwise the first
/// sentences of the two best results are joined.
pub fn compose_answer(results: &[SearchResult]) -> String {
    let Some(top) = results.first() else {
        return NO_ANSWER.to_string();
    };
    if let Some(next) = results.get(1) {
        let lead = top.score.value() - next.score.value();
        if lead > DOMINANCE_MARGIN || top.score.value() >= CONFIDENT_SCORE {
            return cite(top);
        }
    }
    results.iter().take(2).map(cite).collect::<Vec<_>>().join(" ")
}
