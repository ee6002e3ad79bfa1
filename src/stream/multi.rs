use std::collections::VecDeque;
use std::io::{self, Read};

use super::ByteSource;

/// Presents an ordered list of byte sources as one continuous stream.
///
/// Bytes come out in exactly the order the sources were supplied; a later
/// source is not opened for reading until every earlier one is exhausted.
/// Exhausted sources are dropped from the front, which also releases
/// whatever connection they held. Advancing is a loop, not recursion, so a
/// long run of empty segments cannot grow the stack.
pub struct MultiReader {
    sources: VecDeque<ByteSource>,
}

impl MultiReader {
    pub fn new(sources: impl IntoIterator<Item = ByteSource>) -> Self {
        Self {
            sources: sources.into_iter().collect(),
        }
    }

    /// Sources not yet fully consumed (including the one currently active).
    pub fn remaining_sources(&self) -> usize {
        self.sources.len()
    }
}

impl Read for MultiReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while let Some(front) = self.sources.front_mut() {
            let n = front.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            // Current source exhausted: drop it and move to the next.
            self.sources.pop_front();
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::stream::BoundedReader;
    use std::io::Cursor;

    fn source(bytes: &[u8]) -> ByteSource {
        Box::new(Cursor::new(bytes.to_vec()))
    }

    /// Byte source that fails the test if read before `armed` is set.
    struct Tripwire {
        armed: std::rc::Rc<std::cell::Cell<bool>>,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for Tripwire {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            assert!(self.armed.get(), "later source read before earlier one was exhausted");
            self.inner.read(buf)
        }
    }

    #[test]
    fn test_concatenates_in_order() {
        let mut reader = MultiReader::new([source(b"Hello"), source(b"World")]);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"HelloWorld");
    }

    #[test]
    fn test_empty_list_is_eof() {
        let mut reader = MultiReader::new([]);
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_empty_segments_are_skipped() {
        let mut reader = MultiReader::new([
            source(b""),
            source(b"a"),
            source(b""),
            source(b""),
            source(b"bc"),
            source(b""),
        ]);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_all_empty_segments_is_eof() {
        let mut reader = MultiReader::new([source(b""), source(b""), source(b"")]);
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        assert_eq!(reader.remaining_sources(), 0);
    }

    #[test]
    fn test_later_source_untouched_until_earlier_exhausted() {
        let armed = std::rc::Rc::new(std::cell::Cell::new(false));
        let tripwire = Tripwire {
            armed: armed.clone(),
            inner: Cursor::new(b"second".to_vec()),
        };

        let mut reader = MultiReader::new([source(b"first"), Box::new(tripwire) as ByteSource]);
        let mut buf = [0u8; 5];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"first");

        armed.set(true);
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"second");
    }

    #[test]
    fn test_incomplete_segment_error_propagates() {
        let truncated: ByteSource = Box::new(BoundedReader::new(Cursor::new(b"ab".to_vec()), 5));
        let mut reader = MultiReader::new([source(b"ok"), truncated, source(b"never")]);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        match Error::from(err) {
            Error::IncompleteStream { expected, read } => {
                assert_eq!(expected, 5);
                assert_eq!(read, 2);
            }
            other => panic!("expected IncompleteStream, got {other:?}"),
        }
    }

    #[test]
    fn test_exhausted_sources_are_released() {
        let mut reader = MultiReader::new([source(b"ab"), source(b"cd")]);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(reader.remaining_sources(), 0);
    }
}
