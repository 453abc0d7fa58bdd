//! Source location tracking

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source position (line, column, and byte offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Byte offset from start of file
    pub offset: usize,
}

impl Position {
    /// Create a new position
    #[inline]
    pub fn new(
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            line,
            column,
            offset: 0,
        }
    }

    /// Create a new position with offset
    #[inline]
    pub fn with_offset(
        line: usize,
        column: usize,
        offset: usize,
    ) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Create a dummy position
    #[inline]
    pub fn dummy() -> Self {
        Self {
            line: 0,
            column: 0,
            offset: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Source span (start position to end position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start position (inclusive)
    pub start: Position,
    /// End position (exclusive)
    pub end: Position,
}

impl Span {
    /// Create a new span
    #[inline]
    pub fn new(
        start: Position,
        end: Position,
    ) -> Self {
        Self { start, end }
    }

    /// Create a dummy span
    #[inline]
    pub fn dummy() -> Self {
        Self {
            start: Position::dummy(),
            end: Position::dummy(),
        }
    }

    /// Check if this is a dummy span
    #[inline]
    pub fn is_dummy(&self) -> bool {
        self.start.line == 0
    }

    /// Span covering both `self` and `other`
    ///
    /// Dummy spans are absorbed, so merging token spans of synthetic tokens
    /// never drags a real span back to line 0.
    pub fn merge(
        self,
        other: Span,
    ) -> Span {
        if self.is_dummy() {
            return other;
        }
        if other.is_dummy() {
            return self;
        }
        let start = if other.start.offset < self.start.offset {
            other.start
        } else {
            self.start
        };
        let end = if other.end.offset > self.end.offset {
            other.end
        } else {
            self.end
        };
        Span { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "[{} - {}]", self.start, self.end)
    }
}

/// Source file information
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// File name
    pub name: String,
    /// File content
    pub content: String,
    /// Line start offsets for fast line lookup
    line_offsets: Vec<usize>,
}

impl SourceFile {
    /// Create a new source file
    pub fn new(
        name: String,
        content: String,
    ) -> Self {
        let mut line_offsets = vec![0];
        for (i, ch) in content.char_indices() {
            if ch == '\n' {
                line_offsets.push(i + 1);
            }
        }

        Self {
            name,
            content,
            line_offsets,
        }
    }

    /// Get position from byte offset
    pub fn position_from_offset(
        &self,
        offset: usize,
    ) -> Position {
        let line = self.line_offsets.partition_point(|&o| o <= offset);
        let column = offset.saturating_sub(self.line_offsets[line.saturating_sub(1)]);
        Position::with_offset(line, column + 1, offset)
    }

    /// Get a line of text (1-indexed), without its line terminator
    pub fn line(
        &self,
        line: usize,
    ) -> Option<&str> {
        let start = *self.line_offsets.get(line.checked_sub(1)?)?;
        let end = self
            .line_offsets
            .get(line)
            .copied()
            .unwrap_or(self.content.len());
        self.content
            .get(start..end)
            .map(|s| s.trim_end_matches(['\n', '\r']))
    }
}

impl fmt::Display for SourceFile {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_from_offset() {
        let file = SourceFile::new("t".to_string(), "a + b\nc ! d".to_string());
        let pos = file.position_from_offset(8);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 3);
        assert_eq!(file.line(2), Some("c ! d"));
        assert_eq!(file.line(3), None);
    }

    #[test]
    fn test_merge_absorbs_dummy() {
        let real = Span::new(
            Position::with_offset(1, 3, 2),
            Position::with_offset(1, 4, 3),
        );
        assert_eq!(Span::dummy().merge(real), real);
        assert_eq!(real.merge(Span::dummy()), real);

        let later = Span::new(
            Position::with_offset(1, 7, 6),
            Position::with_offset(1, 9, 8),
        );
        let merged = real.merge(later);
        assert_eq!(merged.start.offset, 2);
        assert_eq!(merged.end.offset, 8);
    }
}
