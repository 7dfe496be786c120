//! Text chunking into overlapping character windows.
//!
//! Each window holds at most `chunk_size` characters. A window is cut at the
//! last paragraph break it contains, else the last line break, else the last
//! sentence end, else the last whitespace, else at the hard size limit. The
//! next window starts up to `chunk_overlap` characters before the cut, moved
//! forward to a word start when one exists in that overlap.
//!
//! Windows are produced lazily and tile the input exactly: dropping each
//! window's overlap with its predecessor and concatenating gives back the
//! original text.

use docqa_core::config::ChunkingConfig;
use docqa_core::Result;

/// Break-point tiers, strongest first. A tier wins if any of its separators
/// occurs in the window.
const SEPARATOR_TIERS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? "]];

/// One window of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunk<'a> {
    pub text: &'a str,
    pub chunk_index: usize,
    /// Character offset of the first character in the source text.
    pub start_char: usize,
    /// Character offset one past the last character.
    pub end_char: usize,
}

/// Chunker with validated window parameters.
#[derive(Debug, Clone, Copy)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Fails with `InvalidConfig` unless `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        Self::from_config(&ChunkingConfig {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        })
    }

    /// A fresh lazy pass over `text`. Call again to restart.
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            pos: 0,
            char_pos: 0,
            index: 0,
        }
    }
}

/// Split `text` into overlapping windows of at most `chunk_size` characters.
pub fn split_text_into_chunks(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Chunks<'_>> {
    Ok(RecursiveChunker::new(chunk_size, chunk_overlap)?.chunks(text))
}

/// Lazy iterator over the windows of one text.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    chunk_size: usize,
    chunk_overlap: usize,
    /// Byte offset where the next window starts.
    pos: usize,
    /// Same position, in characters.
    char_pos: usize,
    index: usize,
}

impl<'a> Chunks<'a> {
    /// Byte offset at which the window following `[start, end)` begins.
    ///
    /// `[start, end)` holds more than `chunk_overlap` characters.
    fn overlap_start(&self, start: usize, end: usize) -> usize {
        if self.chunk_overlap == 0 {
            return end;
        }
        let back = self.text[start..end]
            .char_indices()
            .rev()
            .nth(self.chunk_overlap - 1)
            .map_or(start, |(b, _)| start + b);

        let at_word_start = self.text[..back]
            .chars()
            .next_back()
            .map_or(true, char::is_whitespace);
        if at_word_start {
            return back;
        }
        match self.text[back..end]
            .char_indices()
            .find(|(_, c)| c.is_whitespace())
        {
            Some((i, c)) if back + i + c.len_utf8() < end => back + i + c.len_utf8(),
            _ => back,
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = TextChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }

        let rest = &self.text[self.pos..];
        let hard_end = rest
            .char_indices()
            .nth(self.chunk_size)
            .map_or(self.text.len(), |(b, _)| self.pos + b);

        let end = if hard_end == self.text.len() {
            hard_end
        } else {
            // A break must leave more than `chunk_overlap` characters behind it.
            let floor = rest
                .char_indices()
                .nth(self.chunk_overlap)
                .map_or(hard_end, |(b, _)| self.pos + b);
            find_break(&self.text[floor..hard_end]).map_or(hard_end, |i| floor + i)
        };

        let piece = &self.text[self.pos..end];
        let chunk = TextChunk {
            text: piece,
            chunk_index: self.index,
            start_char: self.char_pos,
            end_char: self.char_pos + piece.chars().count(),
        };
        self.index += 1;

        if end == self.text.len() {
            self.pos = end;
            self.char_pos = chunk.end_char;
        } else {
            let next = self.overlap_start(self.pos, end);
            self.char_pos = chunk.end_char - self.text[next..end].chars().count();
            self.pos = next;
        }
        Some(chunk)
    }
}

/// Byte offset just past the best break point in `window`, if any.
fn find_break(window: &str) -> Option<usize> {
    for tier in SEPARATOR_TIERS {
        let best = tier
            .iter()
            .filter_map(|sep| window.rfind(sep).map(|i| i + sep.len()))
            .max();
        if best.is_some() {
            return best;
        }
    }
    window
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
}
