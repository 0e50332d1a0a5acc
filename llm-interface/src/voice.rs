pub const DEFAULT_VOICE: &str = "Kore";
pub const MAX_VOICEOVER_CHARS: usize = 1000;

/// Display names offered to the user, paired with the prebuilt TTS voice.
pub const VOICE_STYLES: [(&str, &str); 3] = [
    ("Alice (Calm)", "Kore"),
    ("David (Energetic)", "Puck"),
    ("Sarah (Storyteller)", "Zephyr"),
];

/// Unknown styles fall back to [`DEFAULT_VOICE`].
pub fn voice_name(style: &str) -> &'static str {
    VOICE_STYLES
        .iter()
        .find(|(label, _)| *label == style)
        .map(|(_, voice)| *voice)
        .unwrap_or(DEFAULT_VOICE)
}

/// Keeps short text as is. Longer text is cut after the last sentence end
/// inside the first [`MAX_VOICEOVER_CHARS`] characters, or hard-cut there.
pub fn truncate_for_voiceover(text: &str) -> String {
    if text.chars().count() <= MAX_VOICEOVER_CHARS {
        return text.to_string();
    }

    let window: String = text.chars().take(MAX_VOICEOVER_CHARS).collect();
    match window.rfind(['.', '!', '?']) {
        Some(index) => window[..=index].to_string(),
        None => window,
    }
}
