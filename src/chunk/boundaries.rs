//! Break point detection for chunking

/// Priority levels for break points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BreakPriority {
    /// After clause punctuation (lowest)
    Clause = 1,
    /// After any whitespace
    Word = 2,
    /// After sentence-ending punctuation and whitespace
    Sentence = 3,
    /// After a newline
    Line = 4,
    /// After a blank line (highest)
    Paragraph = 5,
}

/// A potential break point in text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakPoint {
    /// Character position the window would end at
    pub position: usize,
    /// Priority of this break point
    pub priority: BreakPriority,
}

impl BreakPoint {
    pub fn new(position: usize, priority: BreakPriority) -> Self {
        Self { position, priority }
    }
}

/// Classify ending a window right after `last`, with `before` preceding it
pub fn classify_break(before: Option<char>, last: char) -> Option<BreakPriority> {
    match (before, last) {
        (Some('\n'), '\n') => Some(BreakPriority::Paragraph),
        (_, '\n') => Some(BreakPriority::Line),
        (Some('.' | '?' | '!'), c) if c.is_whitespace() => Some(BreakPriority::Sentence),
        (_, c) if c.is_whitespace() => Some(BreakPriority::Word),
        (_, ',' | ';' | ':' | ')') => Some(BreakPriority::Clause),
        _ => None,
    }
}

/// Pick the best of several candidates: highest priority, then latest position
pub fn best_break<I>(candidates: I) -> Option<BreakPoint>
where
    I: IntoIterator<Item = BreakPoint>,
{
    candidates
        .into_iter()
        .max_by_key(|p| (p.priority, p.position))
}
