//! Re-segmentation of the free-text "Premarket Review" cell.
//!
//! The cell is a run of text nodes split by links and `<br>`s at arbitrary
//! points. Sentence-final punctuation is the only reliable boundary, so
//! fragments are glued together until one ends in `.` or `)`.

use crate::classification::normalize::clean_fragment;

/// Characters that close a logical entry.
const ENTRY_TERMINATORS: [char; 2] = ['.', ')'];

#[derive(Debug, Default)]
struct Segmenter {
    pending: String,
    entries: Vec<String>,
}

impl Segmenter {
    fn push(mut self, raw: &str) -> Self {
        let fragment = clean_fragment(raw);
        if fragment.is_empty() {
            return self;
        }

        self.pending.push(' ');
        self.pending.push_str(&fragment);

        if fragment.ends_with(ENTRY_TERMINATORS) {
            self.flush()
        } else {
            self
        }
    }

    fn flush(mut self) -> Self {
        let entry = self.pending.trim();
        if !entry.is_empty() {
            self.entries.push(entry.to_string());
        }
        self.pending.clear();
        self
    }
}

/// Group text fragments into review entries, in document order.
pub fn segment<'a, I>(fragments: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    fragments
        .into_iter()
        .fold(Segmenter::default(), Segmenter::push)
        .flush()
        .entries
}
