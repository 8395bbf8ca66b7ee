/// An inclusive, 0-indexed byte range. `start` or `end` may be `-1` to mean
/// "unspecified" in a *logical* range parsed straight from a `Range` header;
/// `translate` resolves a logical range against a concrete file size into a
/// *physical* range with both bounds set and `start <= end < size`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LogicalRange {
    pub start: i64,
    pub end: i64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RangeError {
    #[error("range not satisfiable")]
    NotSatisfiable,
    #[error("invalid range")]
    Invalid,
}

impl LogicalRange {
    /// Resolves this logical range against a file of `size` bytes, per the
    /// translation table: an empty file ignores any range; an out-of-bounds
    /// start is unsatisfiable; a missing or oversized end clamps to EOF; a
    /// negative start with a non-negative end means "last `end` bytes"; two
    /// negative bounds are invalid.
    pub fn translate(self, size: u64) -> Result<Option<ByteRange>, RangeError> {
        if size == 0 {
            return Ok(None);
        }

        if self.start >= 0 {
            let start = self.start as u64;
            if start >= size {
                return Err(RangeError::NotSatisfiable);
            }
            let end = if self.end < 0 || self.end as u64 >= size {
                size - 1
            } else {
                self.end as u64
            };
            return Ok(Some(ByteRange { start, end }));
        }

        if self.end >= 0 {
            let suffix_len = self.end as u64;
            let start = size.saturating_sub(suffix_len);
            return Ok(Some(ByteRange {
                start,
                end: size - 1,
            }));
        }

        Err(RangeError::Invalid)
    }
}

impl ByteRange {
    pub fn len(self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lr(start: i64, end: i64) -> LogicalRange {
        LogicalRange { start, end }
    }

    #[test]
    fn empty_file_ignores_range() {
        assert_eq!(lr(5, 10).translate(0), Ok(None));
    }

    #[test]
    fn start_beyond_size_is_unsatisfiable() {
        assert_eq!(lr(10, -1).translate(10), Err(RangeError::NotSatisfiable));
    }

    #[test]
    fn missing_end_clamps_to_eof() {
        assert_eq!(
            lr(5, -1).translate(10),
            Ok(Some(ByteRange { start: 5, end: 9 }))
        );
    }

    #[test]
    fn oversized_end_clamps_to_eof() {
        assert_eq!(
            lr(5, 999).translate(10),
            Ok(Some(ByteRange { start: 5, end: 9 }))
        );
    }

    #[test]
    fn suffix_range_takes_last_n_bytes() {
        assert_eq!(
            lr(-1, 3).translate(10),
            Ok(Some(ByteRange { start: 7, end: 9 }))
        );
    }

    #[test]
    fn suffix_range_larger_than_file_clamps_to_start() {
        assert_eq!(
            lr(-1, 999).translate(10),
            Ok(Some(ByteRange { start: 0, end: 9 }))
        );
    }

    #[test]
    fn both_negative_is_invalid() {
        assert_eq!(lr(-1, -1).translate(10), Err(RangeError::Invalid));
    }

    #[test]
    fn byte_range_len() {
        assert_eq!(ByteRange { start: 5, end: 7 }.len(), 3);
    }
}
