use crate::error::{Error, Result};
use crate::util::percent;
use itertools::Itertools;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

pub const OPTION_COUNT: usize = 4;

/// A question as delivered by a generation source, before validation.
/// Sources hand these over as JSON; nothing about them is trusted yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// A validated multiple-choice question with its 1-based position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub index: usize,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// The scored answers for one session. Stored once; resubmission returns
/// the stored record unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComprehensionResult {
    pub session_id: i64,
    pub answers: Vec<usize>,
    pub score_percent: u32,
}

/// Structural validation of an externally generated question set.
///
/// Enforces the exact expected count, a non-empty prompt, exactly four
/// options, and an in-range correct index; assigns 1-based `index` fields.
/// The first violation fails the whole set, naming the offending question.
pub fn validate_questions(raw: Vec<RawQuestion>, expected_count: usize) -> Result<Vec<Question>> {
    if raw.len() != expected_count {
        return Err(Error::validation(format!(
            "expected {expected_count} questions, got {}",
            raw.len()
        )));
    }
    raw.into_iter()
        .enumerate()
        .map(|(i, q)| {
            let pos = i + 1;
            if q.prompt.trim().is_empty() {
                return Err(Error::validation(format!(
                    "question {pos}: prompt must be a non-empty string"
                )));
            }
            if q.options.len() != OPTION_COUNT {
                return Err(Error::validation(format!(
                    "question {pos}: expected {OPTION_COUNT} options, got {}",
                    q.options.len()
                )));
            }
            if q.correct_index >= OPTION_COUNT {
                return Err(Error::validation(format!(
                    "question {pos}: correct_index {} is out of range 0..={}",
                    q.correct_index,
                    OPTION_COUNT - 1
                )));
            }
            Ok(Question {
                index: pos,
                prompt: q.prompt,
                options: q.options,
                correct_index: q.correct_index,
            })
        })
        .collect()
}

/// Percentage of answers matching their question's correct index.
///
/// The caller must supply exactly one answer per question; a length
/// mismatch is a fatal input error. An empty question set scores 0.
pub fn calculate_score(answers: &[usize], questions: &[Question]) -> Result<u32> {
    if answers.len() != questions.len() {
        return Err(Error::validation(format!(
            "got {} answers for {} questions",
            answers.len(),
            questions.len()
        )));
    }
    let matches = answers
        .iter()
        .zip(questions)
        .filter(|(a, q)| **a == q.correct_index)
        .count();
    Ok(percent(matches, questions.len()))
}

/// Anything that can produce a question set for a passage
pub trait QuestionSource {
    fn generate(&self, text: &str, count: usize) -> Result<Vec<RawQuestion>>;
}

fn strip_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(|s| s.split_whitespace().join(" "))
        .filter(|s| s.chars().any(|c| c.is_alphabetic()))
        .collect()
}

/// Local stand-in for an external question-generation service: cloze
/// questions built from the passage itself, with distractors drawn from
/// the rest of its vocabulary. Output flows through `validate_questions`
/// like any other source's.
#[derive(Debug, Default)]
pub struct ClozeQuestionSource;

impl ClozeQuestionSource {
    const MIN_SENTENCE_WORDS: usize = 6;
    const MIN_DISTRACTOR_LEN: usize = 4;
}

impl QuestionSource for ClozeQuestionSource {
    fn generate(&self, text: &str, count: usize) -> Result<Vec<RawQuestion>> {
        let sentences = split_sentences(text);
        let candidates: Vec<&String> = sentences
            .iter()
            .filter(|s| s.split_whitespace().count() >= Self::MIN_SENTENCE_WORDS)
            .collect();
        if candidates.len() < count {
            return Err(Error::validation(format!(
                "passage has {} usable sentences, need {count} for the quiz",
                candidates.len()
            )));
        }

        let vocabulary: Vec<String> = text
            .split_whitespace()
            .map(strip_word)
            .filter(|w| w.len() >= Self::MIN_DISTRACTOR_LEN)
            .unique()
            .collect();
        if vocabulary.len() < OPTION_COUNT {
            return Err(Error::validation(
                "passage vocabulary is too small to build answer options",
            ));
        }

        let mut rng = rand::thread_rng();
        let chosen = candidates.choose_multiple(&mut rng, count);

        let mut raw = Vec::with_capacity(count);
        for sentence in chosen {
            let words: Vec<&str> = sentence.split_whitespace().collect();
            let (target_pos, target) = words
                .iter()
                .enumerate()
                .max_by_key(|(_, w)| strip_word(w).len())
                .expect("candidate sentences are non-empty");
            let answer = strip_word(target);

            let mut distractors: Vec<&String> =
                vocabulary.iter().filter(|w| **w != answer).collect();
            if distractors.len() < OPTION_COUNT - 1 {
                return Err(Error::validation(
                    "passage vocabulary is too small to build answer options",
                ));
            }
            distractors.shuffle(&mut rng);

            let mut options: Vec<String> = distractors
                .into_iter()
                .take(OPTION_COUNT - 1)
                .cloned()
                .collect();
            options.push(answer.clone());
            options.shuffle(&mut rng);
            let correct_index = options
                .iter()
                .position(|o| *o == answer)
                .expect("answer was just inserted");

            let blanked = words
                .iter()
                .enumerate()
                .map(|(i, w)| if i == target_pos { "____" } else { *w })
                .join(" ");

            raw.push(RawQuestion {
                prompt: format!("Which word completes: \"{blanked}\"?"),
                options,
                correct_index,
            });
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn question(correct_index: usize) -> Question {
        Question {
            index: 1,
            prompt: "p".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index,
        }
    }

    fn questions_with_correct(correct: &[usize]) -> Vec<Question> {
        correct
            .iter()
            .enumerate()
            .map(|(i, &c)| Question {
                index: i + 1,
                ..question(c)
            })
            .collect()
    }

    fn raw(prompt: &str, options: &[&str], correct_index: usize) -> RawQuestion {
        RawQuestion {
            prompt: prompt.into(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_index,
        }
    }

    #[test]
    fn all_correct_scores_100() {
        let qs = questions_with_correct(&[0, 2, 1]);
        assert_eq!(calculate_score(&[0, 2, 1], &qs).unwrap(), 100);
    }

    #[test]
    fn all_wrong_scores_0() {
        let qs = questions_with_correct(&[0, 2, 1]);
        assert_eq!(calculate_score(&[1, 1, 0], &qs).unwrap(), 0);
    }

    #[test]
    fn two_of_three_rounds_to_67() {
        let qs = questions_with_correct(&[0, 2, 1]);
        assert_eq!(calculate_score(&[0, 2, 3], &qs).unwrap(), 67);
    }

    #[test]
    fn length_mismatch_is_fatal() {
        let qs = questions_with_correct(&[0, 2, 1]);
        assert_matches!(calculate_score(&[0, 2], &qs), Err(Error::Validation(_)));
        assert_matches!(
            calculate_score(&[0, 2, 1, 3], &qs),
            Err(Error::Validation(_))
        );
    }

    #[test]
    fn empty_set_scores_zero() {
        assert_eq!(calculate_score(&[], &[]).unwrap(), 0);
    }

    #[test]
    fn validate_assigns_one_based_indices() {
        let raw_set = vec![
            raw("first?", &["a", "b", "c", "d"], 0),
            raw("second?", &["a", "b", "c", "d"], 3),
        ];
        let questions = validate_questions(raw_set, 2).unwrap();
        assert_eq!(questions[0].index, 1);
        assert_eq!(questions[1].index, 2);
    }

    #[test]
    fn validate_rejects_count_mismatch() {
        let raw_set = vec![raw("only?", &["a", "b", "c", "d"], 0)];
        assert_matches!(validate_questions(raw_set, 3), Err(Error::Validation(_)));
    }

    #[test]
    fn validate_names_the_offending_question() {
        let raw_set = vec![
            raw("fine?", &["a", "b", "c", "d"], 0),
            raw("   ", &["a", "b", "c", "d"], 0),
        ];
        let err = validate_questions(raw_set, 2).unwrap_err();
        assert!(err.to_string().contains("question 2"));

        let raw_set = vec![raw("short?", &["a", "b", "c"], 0)];
        let err = validate_questions(raw_set, 1).unwrap_err();
        assert!(err.to_string().contains("question 1"));
        assert!(err.to_string().contains("4 options"));

        let raw_set = vec![raw("oob?", &["a", "b", "c", "d"], 4)];
        let err = validate_questions(raw_set, 1).unwrap_err();
        assert!(err.to_string().contains("correct_index"));
    }

    const PASSAGE: &str = "The quick brown fox jumps over the lazy sleeping dog. \
        Every reader builds comprehension through sustained deliberate practice. \
        Faster reading without understanding defeats the entire purpose of training. \
        Paced presentation helps the eyes abandon wasteful regression habits.";

    #[test]
    fn cloze_source_output_passes_validation() {
        let raw_set = ClozeQuestionSource.generate(PASSAGE, 3).unwrap();
        let questions = validate_questions(raw_set, 3).unwrap();
        for q in &questions {
            assert!(q.prompt.contains("____"));
            assert_eq!(q.options.len(), OPTION_COUNT);
            assert_eq!(q.options.iter().unique().count(), OPTION_COUNT);
        }
    }

    #[test]
    fn cloze_answer_option_comes_from_the_sentence() {
        let raw_set = ClozeQuestionSource.generate(PASSAGE, 2).unwrap();
        let passage_vocab: Vec<String> =
            PASSAGE.split_whitespace().map(strip_word).collect();
        for q in raw_set {
            assert!(passage_vocab.contains(&q.options[q.correct_index]));
        }
    }

    #[test]
    fn cloze_source_rejects_thin_passages() {
        assert_matches!(
            ClozeQuestionSource.generate("Too short.", 2),
            Err(Error::Validation(_))
        );
    }
}
