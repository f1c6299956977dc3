//! Accept-Encoding negotiation.

use std::fmt;

use axum::http::HeaderValue;

/// A supported content coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Brotli,
    Gzip,
    Deflate,
}

impl Encoding {
    /// Selection order, most preferred first.
    pub const PRIORITY: [Encoding; 3] = [Encoding::Brotli, Encoding::Gzip, Encoding::Deflate];

    /// Token used in `Accept-Encoding` / `Content-Encoding`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Brotli => "br",
            Encoding::Gzip => "gzip",
            Encoding::Deflate => "deflate",
        }
    }

    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }

    fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("br") {
            Some(Encoding::Brotli)
        } else if token.eq_ignore_ascii_case("gzip") {
            Some(Encoding::Gzip)
        } else if token.eq_ignore_ascii_case("deflate") {
            Some(Encoding::Deflate)
        } else {
            None
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the encoding to use for a response, if any.
///
/// Returns `None` when the header is absent, unreadable, or names none of the
/// supported codings. A coding listed with `q=0` counts as not offered.
pub fn negotiate(accept_encoding: Option<&HeaderValue>) -> Option<Encoding> {
    let header = accept_encoding?.to_str().ok()?;

    let mut offered = [false; 3];
    for part in header.split(',') {
        let mut params = part.split(';');
        let Some(encoding) = params.next().map(str::trim).and_then(Encoding::from_token) else {
            continue;
        };
        if params.any(is_zero_quality) {
            continue;
        }
        if let Some(slot) = Encoding::PRIORITY.iter().position(|e| *e == encoding) {
            offered[slot] = true;
        }
    }

    Encoding::PRIORITY
        .iter()
        .zip(offered)
        .find_map(|(encoding, ok)| ok.then_some(*encoding))
}

fn is_zero_quality(param: &str) -> bool {
    let Some((name, value)) = param.split_once('=') else {
        return false;
    };
    name.trim().eq_ignore_ascii_case("q")
        && value.trim().parse::<f32>().map(|q| q <= 0.0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick(header: &str) -> Option<Encoding> {
        negotiate(Some(&HeaderValue::from_str(header).unwrap()))
    }

    #[test]
    fn absent_header_selects_nothing() {
        assert_eq!(negotiate(None), None);
    }

    #[test]
    fn brotli_beats_gzip_regardless_of_order() {
        assert_eq!(pick("br, gzip"), Some(Encoding::Brotli));
        assert_eq!(pick("gzip, deflate, br"), Some(Encoding::Brotli));
        assert_eq!(pick("gzip;q=1.0, br;q=0.1"), Some(Encoding::Brotli));
    }

    #[test]
    fn falls_through_priority() {
        assert_eq!(pick("deflate, gzip"), Some(Encoding::Gzip));
        assert_eq!(pick("deflate"), Some(Encoding::Deflate));
    }

    #[test]
    fn unknown_codings_select_nothing() {
        assert_eq!(pick("zstd, identity"), None);
        assert_eq!(pick("*"), None);
        assert_eq!(pick(""), None);
    }

    #[test]
    fn zero_quality_is_refused() {
        assert_eq!(pick("br;q=0, gzip"), Some(Encoding::Gzip));
        assert_eq!(pick("gzip; q=0.0"), None);
    }

    #[test]
    fn tokens_are_case_insensitive() {
        assert_eq!(pick("GZIP"), Some(Encoding::Gzip));
    }
}
