//! FAQ parsing
//!
//! The FAQ file is a list of blank-line separated blocks, each holding a
//! `Q:` line and an `A:` line (prefixes are case-insensitive).

use super::{ChunkSource, Passage};

/// Label prepended to FAQ answer chunk text
pub const FAQ_ANSWER_LABEL: &str = "[FAQ Answer]";

/// Label prepended to FAQ question chunk text
pub const FAQ_QUESTION_LABEL: &str = "[FAQ Question]";

/// A question/answer pair from the FAQ file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqPair {
    pub question: String,
    pub answer: String,
}

impl FaqPair {
    /// The two passages indexed for a pair: the answer first, then the question
    pub fn into_passages(self) -> [Passage; 2] {
        let answer_text = format!("{}\n{}", FAQ_ANSWER_LABEL, self.answer);
        let question_text = format!("{}\n{}", FAQ_QUESTION_LABEL, self.question);
        [
            Passage::new(
                answer_text,
                ChunkSource::FaqAnswer {
                    question: self.question,
                },
            ),
            Passage::new(
                question_text,
                ChunkSource::FaqQuestion {
                    answer: self.answer,
                },
            ),
        ]
    }
}

/// Parse raw FAQ text into pairs, skipping malformed blocks
pub fn parse_faq(raw: &str) -> Vec<FaqPair> {
    split_blocks(raw)
        .iter()
        .filter_map(|block| parse_block(block))
        .collect()
}

/// Parse FAQ text straight into passages
pub fn faq_passages(raw: &str) -> Vec<Passage> {
    parse_faq(raw)
        .into_iter()
        .flat_map(FaqPair::into_passages)
        .collect()
}

/// Group non-blank, trimmed lines into blocks separated by blank lines
fn split_blocks(raw: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn parse_block(lines: &[&str]) -> Option<FaqPair> {
    // Only the first Q: and first A: line count; an empty one spoils the block
    let question = lines.iter().find_map(|l| strip_marker(l, "q:"))?;
    let answer = lines.iter().find_map(|l| strip_marker(l, "a:"))?;

    if question.is_empty() || answer.is_empty() {
        return None;
    }

    Some(FaqPair {
        question: question.to_string(),
        answer: answer.to_string(),
    })
}

fn strip_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let prefix = line.get(..marker.len())?;
    if prefix.eq_ignore_ascii_case(marker) {
        Some(line[marker.len()..].trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::SourceKind;

    #[test]
    fn test_parse_single_pair() {
        let pairs = parse_faq("Q: When was Eka founded?\nA: In 2015.");
        assert_eq!(
            pairs,
            vec![FaqPair {
                question: "When was Eka founded?".to_string(),
                answer: "In 2015.".to_string(),
            }]
        );
    }

    #[test]
    fn test_case_insensitive_and_extra_lines() {
        let raw = "  q:   Who runs it?  \nsome note\na: A volunteer board.\n";
        let pairs = parse_faq(raw);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].question, "Who runs it?");
        assert_eq!(pairs[0].answer, "A volunteer board.");
    }

    #[test]
    fn test_malformed_blocks_are_skipped() {
        let raw = "\
Q: First?
A: One.

Q: Missing answer?

A: Missing question.

Q: Second?
A: Two.

Q:
A: Empty question.

just prose

Q: Third?
A: Three.
";
        let passages = faq_passages(raw);
        // 3 valid blocks, 4 malformed ones
        assert_eq!(passages.len(), 6);
        assert_eq!(parse_faq(raw).len(), 3);
    }

    #[test]
    fn test_first_marker_wins() {
        let raw = "Q: Original?\nQ: Ignored?\nA: First.\nA: Second.";
        let pairs = parse_faq(raw);
        assert_eq!(pairs[0].question, "Original?");
        assert_eq!(pairs[0].answer, "First.");
    }

    #[test]
    fn test_pair_emits_answer_then_question() {
        let pair = FaqPair {
            question: "When was Eka founded?".to_string(),
            answer: "In 2015.".to_string(),
        };
        let [answer, question] = pair.into_passages();

        assert_eq!(answer.text, "[FAQ Answer]\nIn 2015.");
        assert_eq!(answer.source.kind(), SourceKind::FaqAnswer);
        assert_eq!(answer.source.extra(), Some("When was Eka founded?"));

        assert_eq!(question.text, "[FAQ Question]\nWhen was Eka founded?");
        assert_eq!(question.source.kind(), SourceKind::FaqQuestion);
        assert_eq!(question.source.extra(), Some("In 2015."));
    }

    #[test]
    fn test_crlf_input() {
        let raw = "Q: Windows?\r\nA: Yes.\r\n\r\nQ: Again?\r\nA: Sure.\r\n";
        assert_eq!(parse_faq(raw).len(), 2);
    }
}
