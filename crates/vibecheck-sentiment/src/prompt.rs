//! Prompt construction for the reasoning backend.

use serde::Serialize;

use crate::types::{preview_with_ellipsis, TextUnit};

/// Source text is cut to this many characters before it goes into a prompt.
pub const PROMPT_PREVIEW_CHARS: usize = 300;

/// Instruction for a single text, answered with labelled lines.
#[must_use]
pub fn single_text_prompt(text: &str) -> String {
    let text = preview_with_ellipsis(text, PROMPT_PREVIEW_CHARS);
    format!(
        "Analyze the sentiment of this text and provide:\n\
         1. Sentiment (positive/negative/neutral)\n\
         2. Confidence score (0-1)\n\
         3. Brief reasoning\n\
         \n\
         Text: \"{text}\"\n\
         \n\
         Respond in this exact format:\n\
         Sentiment: [sentiment]\n\
         Confidence: [score]\n\
         Reasoning: [brief explanation]"
    )
}

#[derive(Serialize)]
struct IndexedText<'a> {
    text_id: usize,
    text: &'a str,
}

/// Instruction for a batch; `text_id` in the reply is the index into `units`.
#[must_use]
pub fn batch_prompt(units: &[TextUnit]) -> String {
    let previews: Vec<String> = units
        .iter()
        .map(|u| preview_with_ellipsis(&u.text, PROMPT_PREVIEW_CHARS))
        .collect();
    let indexed: Vec<IndexedText<'_>> = previews
        .iter()
        .enumerate()
        .map(|(text_id, text)| IndexedText { text_id, text })
        .collect();
    let texts_json =
        serde_json::to_string_pretty(&indexed).unwrap_or_else(|_| String::from("[]"));
    let last_id = units.len().saturating_sub(1);

    format!(
        r#"Analyze sentiment for this batch of {count} social media texts. For each text, provide:
1. Sentiment: positive/negative/neutral
2. Intensity: low/medium/high
3. Confidence: 0.0-1.0
4. Key emotional indicators
5. Brief reasoning

Texts to analyze (text_id 0 to {last_id}):
{texts_json}

Respond with JSON only, using exactly this schema:
{{
  "analysis": [
    {{
      "text_id": 0,
      "sentiment": "positive",
      "intensity": "medium",
      "confidence": 0.85,
      "emotional_indicators": ["excitement", "optimism"],
      "reasoning": "Brief explanation"
    }}
  ],
  "batch_summary": {{
    "positive_pct": 45,
    "negative_pct": 25,
    "neutral_pct": 30,
    "dominant_emotions": ["anger", "hope"],
    "key_topics": ["technology", "economy"]
  }}
}}
Include exactly one entry in "analysis" per text_id."#,
        count = units.len(),
    )
}
