//! Human-readable explanation of a verdict

use crate::config::FusionConfig;
use crate::scoring::SignalScores;
use crate::verdict::fusion::Classification;

pub const TEMPORAL_PHRASE: &str = "Pitch is unnaturally flat (Robotic intonation)";
pub const IMPERFECTION_PHRASE: &str =
    "Audio signal is 'too clean' (Lacks natural background noise)";
pub const ACOUSTIC_PHRASE: &str = "Spectral envelope matches synthetic voice characteristics";
pub const CUMULATIVE_PHRASE: &str = "Multiple acoustic signals indicate synthetic voice patterns";
pub const NATURAL_PHRASE: &str = "Audio mostly exhibits natural human speech characteristics";
pub const FALLBACK_PHRASE: &str = "Analysis inconclusive, defaulted to safe baseline.";

/// Build the explanation for a classification
///
/// Human verdicts always get [`NATURAL_PHRASE`]. AI verdicts list every
/// triggered signal in the order temporal, imperfection, acoustic, or
/// [`CUMULATIVE_PHRASE`] when none fired on its own.
pub fn explain(
    classification: Classification,
    scores: &SignalScores,
    config: &FusionConfig,
) -> String {
    if classification == Classification::Human {
        return NATURAL_PHRASE.to_string();
    }

    let reasons: Vec<&str> = [
        (scores.temporal > config.temporal_trigger, TEMPORAL_PHRASE),
        (scores.imperfection > config.imperfection_trigger, IMPERFECTION_PHRASE),
        (scores.acoustic > config.acoustic_trigger, ACOUSTIC_PHRASE),
    ]
    .into_iter()
    .filter_map(|(fired, phrase)| fired.then_some(phrase))
    .collect();

    if reasons.is_empty() {
        CUMULATIVE_PHRASE.to_string()
    } else {
        reasons.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_all_triggers_in_order() {
        let scores = SignalScores::new(0.9, 0.9, 0.9);
        let text = explain(Classification::Ai, &scores, &FusionConfig::default());
        assert_eq!(
            text,
            format!(
                "{}; {}; {}",
                TEMPORAL_PHRASE, IMPERFECTION_PHRASE, ACOUSTIC_PHRASE
            )
        );
    }

    #[test]
    fn test_triggers_are_strict() {
        // Exactly at the trigger does not fire
        let scores = SignalScores::new(0.7, 0.6, 0.61);
        let text = explain(Classification::Ai, &scores, &FusionConfig::default());
        assert_eq!(text, IMPERFECTION_PHRASE);
    }

    #[test]
    fn test_cumulative_phrase() {
        let scores = SignalScores::new(0.7, 0.6, 0.6);
        let text = explain(Classification::Ai, &scores, &FusionConfig::default());
        assert_eq!(text, CUMULATIVE_PHRASE);
    }

    #[test]
    fn test_human_suppresses_partial_signals() {
        let scores = SignalScores::new(0.0, 1.0, 1.0);
        let text = explain(Classification::Human, &scores, &FusionConfig::default());
        assert_eq!(text, NATURAL_PHRASE);
    }
}
