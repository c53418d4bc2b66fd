// src/data/line.rs

//! Implement [`LogLine`], [`LineCursor`], [`Marker`], and
//! [`find_marker`] for scanning a log buffer line by line in an explicit
//! [`ScanDirection`].
//!
//! A [`LineCursor`] never copies the buffer. Scanning in
//! [`ScanDirection::Reverse`] walks backwards from the end of the buffer
//! with [`memrchr`] so only the tail of a large log is visited when the
//! marker is near the end.
//!
//! [`memrchr`]: memchr::memrchr

use std::fmt;

use crate::common::{FileOffset, CRu8, NLu8};

use ::bstr::ByteSlice;
use ::memchr::memmem::Finder;
use ::memchr::{memchr, memrchr};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Order in which lines are visited.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ScanDirection {
    /// first line of the buffer to the last line
    Forward,
    /// last line of the buffer to the first line
    Reverse,
}

/// One line of a log buffer.
///
/// The line does not include the newline and does not include a
/// carriage return preceding the newline.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct LogLine<'a> {
    /// byte offset of the first byte of the line in the source buffer
    fileoffset: FileOffset,
    bytes: &'a [u8],
}

impl<'a> LogLine<'a> {
    pub fn new(fileoffset: FileOffset, bytes: &'a [u8]) -> LogLine<'a> {
        LogLine { fileoffset, bytes }
    }

    /// Byte offset of this line within the source buffer.
    pub const fn fileoffset(&self) -> FileOffset {
        self.fileoffset
    }

    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Space-delimited fields of the line, like Python `bytes.split(b" ")`.
    ///
    /// Consecutive spaces produce empty fields.
    pub fn fields(&self) -> impl DoubleEndedIterator<Item = &'a [u8]> {
        self.bytes.split(|b| *b == b' ')
    }

    /// Whitespace-delimited tokens of the line; empty tokens are skipped.
    pub fn tokens(&self) -> impl Iterator<Item = &'a [u8]> {
        self.bytes.fields()
    }

    /// Lossy `String` copy of the line, for error messages.
    pub fn to_string_lossy(&self) -> String {
        self.bytes.to_str_lossy().into_owned()
    }
}

impl fmt::Debug for LogLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogLine")
            .field("fileoffset", &self.fileoffset)
            .field("bytes", &self.bytes.as_bstr())
            .finish()
    }
}

/// Drop one trailing `'\r'`.
#[inline(always)]
fn trim_cr(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(&CRu8) => &line[..line.len() - 1],
        _ => line,
    }
}

/// Double-ended iterator of the [`LogLine`s] of a buffer.
///
/// Lines are split on `'\n'`. A final trailing `'\n'` does not produce an
/// extra empty line, so `b"a\nb\n"` has two lines and `b"a\n\n"` has lines
/// `"a"` and `""`. An empty buffer has no lines.
///
/// [`next`] takes lines from the front, [`next_back`] takes lines from the
/// back. Both ends may be mixed; each line is returned once.
///
/// [`LogLine`s]: LogLine
/// [`next`]: Iterator::next
/// [`next_back`]: DoubleEndedIterator::next_back
#[derive(Clone, Debug)]
pub struct LineCursor<'a> {
    buffer: &'a [u8],
    /// offset of the front of the unvisited region
    start: usize,
    /// offset one past the back of the unvisited region
    end: usize,
    finished: bool,
}

impl<'a> LineCursor<'a> {
    pub fn new(buffer: &'a [u8]) -> LineCursor<'a> {
        let end: usize = match buffer.last() {
            Some(&NLu8) => buffer.len() - 1,
            _ => buffer.len(),
        };

        LineCursor {
            buffer,
            start: 0,
            end,
            finished: buffer.is_empty(),
        }
    }
}

impl<'a> Iterator for LineCursor<'a> {
    type Item = LogLine<'a>;

    fn next(&mut self) -> Option<LogLine<'a>> {
        if self.finished {
            return None;
        }
        let beg: usize = self.start;
        match memchr(NLu8, &self.buffer[beg..self.end]) {
            Some(index) => {
                self.start = beg + index + 1;

                Some(LogLine::new(beg, trim_cr(&self.buffer[beg..beg + index])))
            }
            None => {
                self.finished = true;

                Some(LogLine::new(beg, trim_cr(&self.buffer[beg..self.end])))
            }
        }
    }
}

impl<'a> DoubleEndedIterator for LineCursor<'a> {
    fn next_back(&mut self) -> Option<LogLine<'a>> {
        if self.finished {
            return None;
        }
        let end: usize = self.end;
        match memrchr(NLu8, &self.buffer[self.start..end]) {
            Some(index) => {
                let beg: usize = self.start + index + 1;
                self.end = self.start + index;

                Some(LogLine::new(beg, trim_cr(&self.buffer[beg..end])))
            }
            None => {
                self.finished = true;

                Some(LogLine::new(self.start, trim_cr(&self.buffer[self.start..end])))
            }
        }
    }
}

/// Iterator of the [`LogLine`s] of a buffer in a chosen [`ScanDirection`].
///
/// [`LogLine`s]: LogLine
#[derive(Clone, Debug)]
pub struct DirectedLines<'a> {
    cursor: LineCursor<'a>,
    direction: ScanDirection,
}

impl<'a> DirectedLines<'a> {
    pub fn new(buffer: &'a [u8], direction: ScanDirection) -> DirectedLines<'a> {
        DirectedLines {
            cursor: LineCursor::new(buffer),
            direction,
        }
    }
}

impl<'a> Iterator for DirectedLines<'a> {
    type Item = LogLine<'a>;

    #[inline(always)]
    fn next(&mut self) -> Option<LogLine<'a>> {
        match self.direction {
            ScanDirection::Forward => self.cursor.next(),
            ScanDirection::Reverse => self.cursor.next_back(),
        }
    }
}

/// A fixed byte substring identifying a meaningful log line.
///
/// Matching is exact substring matching, never a regular expression.
#[derive(Clone, Debug)]
pub struct Marker {
    finder: Finder<'static>,
}

impl Marker {
    pub fn new(marker: &[u8]) -> Marker {
        Marker {
            finder: Finder::new(marker).into_owned(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.finder.needle()
    }

    /// Lossy `String` copy of the marker, for error messages.
    pub fn to_string_lossy(&self) -> String {
        self.finder.needle().to_str_lossy().into_owned()
    }

    /// Does `haystack` contain this marker?
    #[inline(always)]
    pub fn is_in(&self, haystack: &[u8]) -> bool {
        self.finder.find(haystack).is_some()
    }

    /// Byte offset of the first occurrence of this marker in `haystack`.
    #[inline(always)]
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        self.finder.find(haystack)
    }
}

impl From<&str> for Marker {
    fn from(marker: &str) -> Marker {
        Marker::new(marker.as_bytes())
    }
}

/// A line matching a [`Marker`] plus the lines around it in file order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MarkerMatch<'a> {
    pub line: LogLine<'a>,
    /// line immediately before `line` in the buffer, if any
    pub file_prev: Option<LogLine<'a>>,
    /// line immediately after `line` in the buffer, if any
    pub file_next: Option<LogLine<'a>>,
}

/// Scan `buffer` in `direction` and return the first line in scan order
/// containing `marker`.
///
/// With [`ScanDirection::Forward`] that is the first occurrence in the
/// buffer, with [`ScanDirection::Reverse`] it is the last occurrence.
/// The neighbours of the match are always reported in file order.
pub fn find_marker<'a>(
    buffer: &'a [u8],
    marker: &Marker,
    direction: ScanDirection,
) -> Option<MarkerMatch<'a>> {
    defn!("(buffer len {}, marker {:?}, {:?})", buffer.len(), marker.as_bytes().as_bstr(), direction);
    let mut lines = DirectedLines::new(buffer, direction);
    let mut visited_prior: Option<LogLine<'a>> = None;
    while let Some(line) = lines.next() {
        if !marker.is_in(line.as_bytes()) {
            visited_prior = Some(line);
            continue;
        }
        defo!("found at fileoffset {}", line.fileoffset());
        let visited_after: Option<LogLine<'a>> = lines.next();
        let (file_prev, file_next) = match direction {
            ScanDirection::Forward => (visited_prior, visited_after),
            ScanDirection::Reverse => (visited_after, visited_prior),
        };
        defx!("return Some; file_prev {:?}, file_next {:?}", file_prev, file_next);

        return Some(MarkerMatch { line, file_prev, file_next });
    }
    defx!("return None");

    None
}
