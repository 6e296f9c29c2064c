use std::{fmt, ops::Range};

/// An inclusive byte span resolved against an object of known length.
///
/// Invariant: `start <= end < total`. Construction goes through
/// [`resolve`], which rejects out-of-bounds spans instead of clamping
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ResolvedRange {
    pub fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for a partial response.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }

    /// Half-open span handed to the store read cursor.
    pub fn fetch_range(&self) -> Range<u64> {
        self.start..self.end + 1
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RangeError {
    /// The header does not parse as a single `bytes=start-[end]` range.
    Malformed { header: String },
    /// The header parsed, but the bounds select no bytes inside the object.
    Unsatisfiable { start: u64, end: u64, total: u64 },
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::Malformed { header } => {
                write!(f, "malformed range header: {}", header)
            }
            RangeError::Unsatisfiable { start, end, total } => write!(
                f,
                "unsatisfiable range {}-{} for object of {} bytes",
                start, end, total
            ),
        }
    }
}

impl std::error::Error for RangeError {}

/// Resolves a `Range` request header against the total object length.
///
/// Accepts a single `bytes=start-` or `bytes=start-end` range. An open
/// end resolves to the last byte of the object. Suffix ranges and
/// multi-range headers are reported as malformed.
pub fn resolve(header: &str, total: u64) -> Result<ResolvedRange, RangeError> {
    let malformed = || RangeError::Malformed {
        header: header.to_string(),
    };

    let range = header.strip_prefix("bytes=").ok_or_else(malformed)?;
    let (start_str, end_str) = range.split_once('-').ok_or_else(malformed)?;

    let start: u64 = start_str.parse().map_err(|_| malformed())?;
    let end: u64 = match end_str {
        "" => total.saturating_sub(1),
        end_str => end_str.parse().map_err(|_| malformed())?,
    };

    if start > end || end >= total {
        return Err(RangeError::Unsatisfiable { start, end, total });
    }

    Ok(ResolvedRange { start, end, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_range() {
        let range = resolve("bytes=10-19", 100).unwrap();
        assert_eq!(range.start, 10);
        assert_eq!(range.end, 19);
        assert_eq!(range.content_length(), 10);
        assert_eq!(range.content_range(), "bytes 10-19/100");
        assert_eq!(range.fetch_range(), 10..20);
    }

    #[test]
    fn test_open_ended_range() {
        let range = resolve("bytes=10-", 100).unwrap();
        assert_eq!(range.end, 99);
        assert_eq!(range.content_length(), 90);
        assert_eq!(range.content_range(), "bytes 10-99/100");
    }

    #[test]
    fn test_single_byte_ranges() {
        let range = resolve("bytes=0-0", 100).unwrap();
        assert_eq!(range.content_length(), 1);
        assert_eq!(range.fetch_range(), 0..1);

        let range = resolve("bytes=99-99", 100).unwrap();
        assert_eq!(range.content_length(), 1);
        assert_eq!(range.content_range(), "bytes 99-99/100");
    }

    #[test]
    fn test_full_object_range() {
        let range = resolve("bytes=0-99", 100).unwrap();
        assert_eq!(range.content_length(), 100);
        assert_eq!(range.fetch_range(), 0..100);
    }

    #[test]
    fn test_start_past_length_is_unsatisfiable() {
        assert_eq!(
            resolve("bytes=100-", 100),
            Err(RangeError::Unsatisfiable {
                start: 100,
                end: 99,
                total: 100,
            })
        );
        assert!(matches!(
            resolve("bytes=250-300", 100),
            Err(RangeError::Unsatisfiable { .. })
        ));
    }

    #[test]
    fn test_end_past_length_is_not_clamped() {
        assert_eq!(
            resolve("bytes=0-100", 100),
            Err(RangeError::Unsatisfiable {
                start: 0,
                end: 100,
                total: 100,
            })
        );
    }

    #[test]
    fn test_inverted_range_is_unsatisfiable() {
        assert!(matches!(
            resolve("bytes=20-10", 100),
            Err(RangeError::Unsatisfiable { .. })
        ));
    }

    #[test]
    fn test_empty_object_has_no_satisfiable_range() {
        assert!(matches!(
            resolve("bytes=0-", 0),
            Err(RangeError::Unsatisfiable { .. })
        ));
    }

    #[test]
    fn test_malformed_headers() {
        for header in [
            "not-a-range",
            "bytes=",
            "bytes=-",
            "bytes=-500",
            "bytes=abc-def",
            "bytes=10-abc",
            "bytes= 10-20",
            "bytes=10-20,30-40",
            "items=10-20",
        ] {
            assert_eq!(
                resolve(header, 100),
                Err(RangeError::Malformed {
                    header: header.to_string(),
                }),
                "expected malformed: {}",
                header
            );
        }
    }
}
