//! Overlapping, boundary-aware windows over a text
//!
//! Positions are counted in characters (Unicode scalar values), so a window
//! never ends inside a UTF-8 sequence. Windows are never trimmed: dropping the
//! first `overlap` characters of every window after the first and
//! concatenating the rest reproduces the input exactly.

use super::boundaries::{best_break, classify_break, BreakPoint};
use crate::config::ChunkConfig;

/// Parameters for window splitting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowParams {
    /// Maximum characters per window
    pub chunk_size: usize,
    /// Characters shared by consecutive windows
    pub overlap: usize,
    /// How far back from the target a boundary may be searched for
    pub tolerance: usize,
}

impl WindowParams {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            tolerance: chunk_size / 5,
        }
    }

    pub fn with_tolerance(mut self, tolerance: usize) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Force the parameters into a shape that always makes progress
    fn clamped(self) -> Self {
        let chunk_size = self.chunk_size.max(1);
        Self {
            chunk_size,
            overlap: self.overlap.min(chunk_size - 1),
            tolerance: self.tolerance.min(chunk_size),
        }
    }
}

impl Default for WindowParams {
    fn default() -> Self {
        Self::new(900, 120)
    }
}

impl From<&ChunkConfig> for WindowParams {
    fn from(config: &ChunkConfig) -> Self {
        Self::new(config.chunk_size, config.overlap).with_tolerance(config.tolerance())
    }
}

/// Lazy iterator over the windows of a text
pub struct Windows<'a> {
    text: &'a str,
    /// Byte offset of every character, plus `text.len()` at the end
    offsets: Vec<usize>,
    params: WindowParams,
    start: usize,
    done: bool,
}

/// Split `text` into overlapping windows
pub fn split_windows(text: &str, params: WindowParams) -> Windows<'_> {
    let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    offsets.push(text.len());

    Windows {
        text,
        offsets,
        params: params.clamped(),
        start: 0,
        done: text.is_empty(),
    }
}

impl<'a> Windows<'a> {
    fn char_count(&self) -> usize {
        self.offsets.len() - 1
    }

    fn char_at(&self, index: usize) -> Option<char> {
        self.text.get(self.offsets[index]..)?.chars().next()
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.offsets[start]..self.offsets[end]]
    }

    /// Choose where the window starting at `self.start` ends
    fn find_end(&self) -> usize {
        let WindowParams {
            chunk_size,
            overlap,
            tolerance,
        } = self.params;

        let target = self.start + chunk_size;
        // The window must stay longer than the overlap or we never advance
        let lower = (self.start + overlap + 1).max(target.saturating_sub(tolerance));

        let candidates = (lower..=target).filter_map(|position| {
            let last = self.char_at(position - 1)?;
            let before = if position >= self.start + 2 {
                self.char_at(position - 2)
            } else {
                None
            };
            classify_break(before, last).map(|priority| BreakPoint::new(position, priority))
        });

        best_break(candidates)
            .map(|point| point.position)
            .unwrap_or(target)
    }
}

impl<'a> Iterator for Windows<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let total = self.char_count();
        if total - self.start <= self.params.chunk_size {
            self.done = true;
            return Some(self.slice(self.start, total));
        }

        let end = self.find_end();
        let window = self.slice(self.start, end);
        self.start = end - self.params.overlap;
        Some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(windows: &[&str], overlap: usize) -> String {
        let mut out = String::new();
        for (i, window) in windows.iter().enumerate() {
            if i == 0 {
                out.push_str(window);
            } else {
                out.extend(window.chars().skip(overlap));
            }
        }
        out
    }

    fn sample_text() -> String {
        let mut text = String::new();
        for i in 0..40 {
            text.push_str(&format!(
                "Sentence number {} talks about grants, schools; and more. ",
                i
            ));
            if i % 7 == 0 {
                text.push_str("\n\n");
            }
        }
        text
    }

    #[test]
    fn test_empty_text_has_no_windows() {
        assert_eq!(split_windows("", WindowParams::default()).count(), 0);
    }

    #[test]
    fn test_short_text_is_single_window() {
        let windows: Vec<_> = split_windows("  Short text.  ", WindowParams::default()).collect();
        assert_eq!(windows, vec!["  Short text.  "]);
    }

    #[test]
    fn test_reconstruction_for_many_sizes() {
        let text = sample_text();
        for (chunk_size, overlap) in [(900, 120), (100, 20), (50, 0), (37, 36), (10, 3), (1, 0)] {
            let params = WindowParams::new(chunk_size, overlap);
            let windows: Vec<_> = split_windows(&text, params).collect();
            assert!(!windows.is_empty());
            assert_eq!(
                reconstruct(&windows, overlap),
                text,
                "chunk_size={} overlap={}",
                chunk_size,
                overlap
            );
        }
    }

    #[test]
    fn test_reconstruction_sweep() {
        let texts = [
            String::new(),
            " \n\t \n\n   ".repeat(4),
            "abcdefghijklmnopqrstuvwxyz".repeat(3),
            "Grants fund schools. Teachers train, then teach!\nNew line here.\n\nEnd".to_string(),
            "Ünïcödé 教育 🎓🎓 naïve café; ok. ".repeat(3),
        ];

        for text in &texts {
            for chunk_size in 1..=30 {
                for overlap in 0..chunk_size {
                    for tolerance in [chunk_size / 5, chunk_size - 1] {
                        let params = WindowParams::new(chunk_size, overlap).with_tolerance(tolerance);
                        let windows: Vec<_> = split_windows(text, params).collect();
                        let context = format!(
                            "text={:?} chunk_size={} overlap={} tolerance={}",
                            text, chunk_size, overlap, tolerance
                        );

                        assert_eq!(windows.is_empty(), text.is_empty(), "{}", context);
                        assert!(
                            windows.iter().all(|w| w.chars().count() <= chunk_size),
                            "{}",
                            context
                        );
                        assert_eq!(reconstruct(&windows, overlap), *text, "{}", context);
                    }
                }
            }
        }
    }

    #[test]
    fn test_windows_respect_size_and_overlap() {
        let text = sample_text();
        let params = WindowParams::new(120, 30);
        let windows: Vec<_> = split_windows(&text, params).collect();

        for window in &windows {
            assert!(window.chars().count() <= 120);
        }
        for pair in windows.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let tail: String = prev[prev.len() - 30..].iter().collect();
            let head: String = pair[1].chars().take(30).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_prefers_sentence_boundary() {
        let text = "Alpha beta gamma. Delta epsilon zeta eta theta iota kappa lambda";
        let params = WindowParams::new(25, 0).with_tolerance(10);
        let first = split_windows(text, params).next().unwrap();
        assert_eq!(first, "Alpha beta gamma. ");
    }

    #[test]
    fn test_prefers_paragraph_over_word() {
        let text = "one two three\n\nfour five six seven eight nine ten";
        let params = WindowParams::new(20, 0).with_tolerance(10);
        let first = split_windows(text, params).next().unwrap();
        assert_eq!(first, "one two three\n\n");
    }

    #[test]
    fn test_hard_cut_without_boundary() {
        let text = "x".repeat(250);
        let params = WindowParams::new(100, 10);
        let windows: Vec<_> = split_windows(&text, params).collect();
        assert_eq!(windows[0].len(), 100);
        assert_eq!(windows[1].len(), 100);
        assert_eq!(reconstruct(&windows, 10), text);
    }

    #[test]
    fn test_multibyte_text() {
        let text = "Éducation pour tous — 教育 🎓 ".repeat(30);
        let params = WindowParams::new(40, 8);
        let windows: Vec<_> = split_windows(&text, params).collect();
        for window in &windows {
            assert!(window.chars().count() <= 40);
        }
        assert_eq!(reconstruct(&windows, 8), text);
    }

    #[test]
    fn test_iteration_is_lazy() {
        let text = "word ".repeat(10_000);
        let mut windows = split_windows(&text, WindowParams::new(50, 5));
        assert!(windows.next().is_some());
        assert!(windows.next().is_some());
    }
}
