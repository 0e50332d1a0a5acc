use serde::Serialize;

/// One word shown on screen between `start_secs` and `end_secs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleCue {
    pub index: usize,
    pub start_secs: f64,
    pub end_secs: f64,
    pub text: String,
}

/// Paces the words of `text` evenly over `duration_secs`.
pub fn build_cues(text: &str, duration_secs: f64) -> Vec<SubtitleCue> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || duration_secs <= 0.0 {
        return Vec::new();
    }

    let per_word = duration_secs / words.len() as f64;
    words
        .into_iter()
        .enumerate()
        .map(|(index, word)| SubtitleCue {
            index,
            start_secs: index as f64 * per_word,
            end_secs: (index + 1) as f64 * per_word,
            text: word.to_string(),
        })
        .collect()
}
