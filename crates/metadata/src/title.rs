pub const MIN_TITLE_CHARS: usize = 6;

/// Substrings that mark a blocked or error page rather than a real title.
const BLOCKED_MARKERS: &[&str] = &[
    "access denied",
    "forbidden",
    "service unavailable",
    "not found",
    "404",
    "403",
    "no available service",
    // DMM/FANZA region-block page ("not available in your region" and its
    // "no available service" headline).
    "お住まいの地域からはご利用になれません",
    "利用可能なサービスはありません",
];

pub fn is_valid_title(title: &str) -> bool {
    let trimmed = title.trim();
    if trimmed.chars().count() < MIN_TITLE_CHARS {
        return false;
    }
    let lowered = trimmed.to_lowercase();
    !BLOCKED_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::is_valid_title;

    #[test]
    fn rejects_empty_and_short() {
        assert!(!is_valid_title(""));
        assert!(!is_valid_title("Hi"));
        assert!(!is_valid_title("   abc   "));
    }

    #[test]
    fn rejects_error_pages() {
        assert!(!is_valid_title("Access Denied"));
        assert!(!is_valid_title("403 Forbidden"));
        assert!(!is_valid_title("Page NOT FOUND on this server"));
        assert!(!is_valid_title("このページはお住まいの地域からはご利用になれません。"));
        assert!(!is_valid_title("申し訳ございません。利用可能なサービスはありません"));
    }

    #[test]
    fn accepts_real_titles() {
        assert!(is_valid_title("A Real Video Title Here"));
        assert!(is_valid_title("夏の終わりの物語"));
    }
}
