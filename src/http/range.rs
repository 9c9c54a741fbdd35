//! HTTP Range request parsing module
//!
//! Single `bytes=` ranges only (RFC 7233); multi-range requests are served
//! as a full response.

/// Inclusive byte span within a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

/// Outcome of looking at a Range header
#[derive(Debug, PartialEq, Eq)]
pub enum RangeSpec {
    /// Serve only this span (206)
    Partial(ByteRange),
    /// Syntactically valid but outside the file (416)
    Unsatisfiable,
    /// Absent, malformed or unsupported: serve the whole file
    Full,
}

/// Interpret a Range header against a file of `size` bytes
pub fn parse_range(header: Option<&str>, size: u64) -> RangeSpec {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeSpec::Full;
    };
    if spec.contains(',') {
        return RangeSpec::Full;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return RangeSpec::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        // "-N": final N bytes
        return match last.parse::<u64>() {
            Ok(0) => RangeSpec::Unsatisfiable,
            Ok(_) if size == 0 => RangeSpec::Unsatisfiable,
            Ok(n) => RangeSpec::Partial(ByteRange {
                start: size.saturating_sub(n),
                end: size - 1,
            }),
            Err(_) => RangeSpec::Full,
        };
    }

    let Ok(start) = first.parse::<u64>() else {
        return RangeSpec::Full;
    };
    if start >= size {
        return RangeSpec::Unsatisfiable;
    }

    let end = if last.is_empty() {
        size - 1
    } else {
        match last.parse::<u64>() {
            Ok(end) if end < start => return RangeSpec::Full,
            Ok(end) => end.min(size - 1),
            Err(_) => return RangeSpec::Full,
        }
    };

    RangeSpec::Partial(ByteRange { start, end })
}
