use std::io::{self, Read};

use crate::Error;

/// Reader with a declared, exact length.
///
/// Produces exactly `expected` bytes from the underlying source and then
/// reports end-of-stream without touching the source again. If the source
/// runs dry first, that is a protocol violation and surfaces as
/// [`Error::IncompleteStream`], never as a normal end-of-stream.
#[derive(Debug)]
pub struct BoundedReader<R> {
    inner: R,
    expected: u64,
    produced: u64,
}

impl<R: Read> BoundedReader<R> {
    pub fn new(inner: R, expected: u64) -> Self {
        Self {
            inner,
            expected,
            produced: 0,
        }
    }

    pub fn expected(&self) -> u64 {
        self.expected
    }

    pub fn produced(&self) -> u64 {
        self.produced
    }
}

impl<R: Read> Read for BoundedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let remaining = self.expected - self.produced;
        if remaining == 0 {
            return Ok(0);
        }

        // Never request past the declared boundary.
        let cap = remaining.min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..cap])?;
        if n == 0 {
            return Err(Error::IncompleteStream {
                expected: self.expected,
                read: self.produced,
            }
            .into_io());
        }
        self.produced += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Underlying source that must never be read.
    struct Untouchable;

    impl Read for Untouchable {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            panic!("bounded reader touched the source past its limit");
        }
    }

    #[test]
    fn test_produces_exactly_expected_then_eof() {
        let mut reader = BoundedReader::new(&b"1234567890"[..], 4);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"1234");
        assert_eq!(reader.produced(), 4);

        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_zero_length_never_reads_source() {
        let mut reader = BoundedReader::new(Untouchable, 0);
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_exhausted_reader_never_reads_source() {
        // Once the declared length is produced, further reads must report
        // end-of-stream without going back to the source.
        let mut reader = BoundedReader::new(b"abc".as_slice().chain(Untouchable), 3);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abc");
        assert_eq!(reader.read(&mut [0u8; 1]).unwrap(), 0);
    }

    #[test]
    fn test_short_source_is_incomplete_stream() {
        let mut reader = BoundedReader::new(&b"abc"[..], 5);
        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        // The error fires exactly when the source is exhausted, so the
        // three real bytes were delivered first.
        assert_eq!(out, b"abc");
        match Error::from(err) {
            Error::IncompleteStream { expected, read } => {
                assert_eq!(expected, 5);
                assert_eq!(read, 3);
            }
            other => panic!("expected IncompleteStream, got {other:?}"),
        }
    }

    #[test]
    fn test_never_requests_past_boundary() {
        // Source with more data than the bound; the reader must cap its
        // requests so the extra bytes stay unread.
        let data = b"HelloWorld";
        let mut inner = &data[..];
        {
            let mut reader = BoundedReader::new(&mut inner, 5);
            let mut buf = [0u8; 64];
            assert_eq!(reader.read(&mut buf).unwrap(), 5);
            assert_eq!(&buf[..5], b"Hello");
        }
        let mut rest = Vec::new();
        inner.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"World");
    }

    #[test]
    fn test_single_byte_reads() {
        let mut reader = BoundedReader::new(&b"xy"[..], 2);
        let mut buf = [0u8; 1];
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'x');
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'y');
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }
}
