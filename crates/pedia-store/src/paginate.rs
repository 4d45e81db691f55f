//! Offset/limit paging with a decimal continuation token.

use std::ops::Range;

/// The slice of a result set one List call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub range: Range<usize>,
    /// Token for the following page, absent on the last page.
    pub continue_token: Option<String>,
    /// Items left after this page.
    pub remaining: usize,
}

/// Decode a continuation token. Absent, unparsable and negative tokens all
/// mean "start from the beginning".
pub fn parse_offset(token: Option<&str>) -> usize {
    token
        .and_then(|t| t.trim().parse::<i64>().ok())
        .and_then(|offset| usize::try_from(offset).ok())
        .unwrap_or(0)
}

/// Choose the window of a `total`-sized set to return.
///
/// - `limit <= 0` or `limit >= total`: everything.
/// - offset past the end: an empty page.
/// - otherwise `[offset, offset + limit)`, clipped to `total`.
pub fn paginate(total: usize, limit: i64, token: Option<&str>) -> PageWindow {
    let whole = PageWindow {
        range: 0..total,
        continue_token: None,
        remaining: 0,
    };
    let Ok(limit) = usize::try_from(limit) else {
        return whole;
    };
    if limit == 0 || limit >= total {
        return whole;
    }

    let offset = parse_offset(token);
    if offset > total {
        return PageWindow {
            range: total..total,
            continue_token: None,
            remaining: 0,
        };
    }
    let end = offset.saturating_add(limit).min(total);
    PageWindow {
        range: offset..end,
        continue_token: (end < total).then(|| end.to_string()),
        remaining: total - end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_boundaries_over_ten_items() {
        let first = paginate(10, 4, None);
        assert_eq!(first.range, 0..4);
        assert_eq!(first.continue_token.as_deref(), Some("4"));
        assert_eq!(first.remaining, 6);

        let last = paginate(10, 4, Some("8"));
        assert_eq!(last.range, 8..10);
        assert_eq!(last.continue_token, None);
        assert_eq!(last.remaining, 0);

        let past = paginate(10, 4, Some("12"));
        assert!(past.range.is_empty());
        assert_eq!(past.continue_token, None);

        assert_eq!(paginate(10, 0, Some("8")).range, 0..10);
        assert_eq!(paginate(10, -3, None).range, 0..10);
    }

    #[test]
    fn limit_covering_the_set_returns_everything() {
        let window = paginate(10, 10, Some("6"));
        assert_eq!(window.range, 0..10);
        assert_eq!(window.continue_token, None);
        assert_eq!(paginate(3, 50, None).range, 0..3);
    }

    #[test]
    fn offset_equal_to_total_is_an_empty_page() {
        let window = paginate(10, 4, Some("10"));
        assert!(window.range.is_empty());
        assert_eq!(window.remaining, 0);
    }

    #[test]
    fn bad_tokens_restart_from_zero() {
        assert_eq!(parse_offset(None), 0);
        assert_eq!(parse_offset(Some("abc")), 0);
        assert_eq!(parse_offset(Some("-5")), 0);
        assert_eq!(parse_offset(Some(" 7 ")), 7);
        assert_eq!(paginate(10, 4, Some("oops")).range, 0..4);
    }
}
