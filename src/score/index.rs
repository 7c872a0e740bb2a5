//! Beat-sorted note storage with cursor-based consumption.
//!
//! Notes are sorted once on load. A cursor tracks the first note that has not
//! yet been considered for emission, so each lookahead window only scans the
//! notes it can actually yield.

use super::note::Note;
use super::BEAT_EPSILON;

/// A sorted, read-only score with a forward-moving cursor.
#[derive(Debug, Default)]
pub struct ScoreIndex {
    notes: Vec<Note>,
    cursor: usize,
}

impl ScoreIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the score and rewind the cursor.
    ///
    /// Uses a stable sort so notes sharing a start keep their submission order.
    pub fn load(&mut self, notes: impl IntoIterator<Item = Note>) {
        self.notes = notes.into_iter().collect();
        self.notes.sort_by(|a, b| a.start.total_cmp(&b.start));
        self.cursor = 0;
    }

    /// Move the cursor past every note that starts before `beat`.
    ///
    /// Never moves backwards, so repeated calls with the same or a smaller
    /// beat are no-ops.
    pub fn advance_to(&mut self, beat: f64) {
        while self.cursor < self.notes.len() && self.notes[self.cursor].start < beat - BEAT_EPSILON
        {
            self.cursor += 1;
        }
    }

    /// Lazily yield every note with `start` in `[from - ε, to + ε]`.
    ///
    /// The cursor advances past each yielded note, so a note is handed out
    /// at most once until the next [`seek`](Self::seek) or [`load`](Self::load).
    pub fn collect(&mut self, from: f64, to: f64) -> Collect<'_> {
        self.advance_to(from);
        Collect {
            notes: &self.notes,
            cursor: &mut self.cursor,
            to,
        }
    }

    /// Rewind the cursor and place it on the first note at or after `beat`.
    ///
    /// Linear in the score length; seeks are user-initiated and rare.
    pub fn seek(&mut self, beat: f64) {
        self.cursor = 0;
        self.advance_to(beat);
    }

    /// Position of the next unconsumed note.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The next unconsumed note, if any.
    pub fn peek_next(&self) -> Option<&Note> {
        self.notes.get(self.cursor)
    }

    /// All notes in playback order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Number of notes at or after the cursor.
    pub fn remaining(&self) -> usize {
        self.notes.len().saturating_sub(self.cursor)
    }
}

/// Lazy window over a [`ScoreIndex`], returned by [`ScoreIndex::collect`].
///
/// Dropping it early leaves the cursor on the first note not yet yielded.
pub struct Collect<'a> {
    notes: &'a [Note],
    cursor: &'a mut usize,
    to: f64,
}

impl<'a> Iterator for Collect<'a> {
    type Item = &'a Note;

    fn next(&mut self) -> Option<Self::Item> {
        let notes = self.notes;
        let note = notes.get(*self.cursor)?;
        if note.start > self.to + BEAT_EPSILON {
            return None;
        }
        *self.cursor += 1;
        Some(note)
    }
}
