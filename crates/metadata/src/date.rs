use common::ReleaseDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

pub const MIN_YEAR: i32 = 1990;
pub const MAX_YEAR: i32 = 2030;

/// Date shapes in order of preference. Group 1 is the year, groups 2 and 3
/// (when present) are month and day.
static DATE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        (
            "ymd",
            Regex::new(r"(?:^|[^0-9])([0-9]{4})[-/.]([0-9]{1,2})[-/.]([0-9]{1,2})")
                .expect("ymd pattern"),
        ),
        (
            "ymd_kanji",
            Regex::new(r"(?:^|[^0-9])([0-9]{4})年\s*([0-9]{1,2})月\s*([0-9]{1,2})日")
                .expect("ymd_kanji pattern"),
        ),
        (
            "ym_kanji",
            Regex::new(r"(?:^|[^0-9])([0-9]{4})年\s*([0-9]{1,2})月").expect("ym_kanji pattern"),
        ),
        (
            "y_kanji",
            Regex::new(r"(?:^|[^0-9])([0-9]{4})年").expect("y_kanji pattern"),
        ),
        (
            "release_label",
            Regex::new(r"(?i)release(?:\s+date)?\s*[:：]\s*([0-9]{4})")
                .expect("release_label pattern"),
        ),
        (
            "jp_label",
            Regex::new(r"(?:発売日|配信開始日|公開日)\s*[:：]?\s*([0-9]{4})")
                .expect("jp_label pattern"),
        ),
        (
            "y_slash",
            Regex::new(r"(?:^|[^0-9])([0-9]{4})/").expect("y_slash pattern"),
        ),
        (
            "y_dot",
            Regex::new(r"(?:^|[^0-9])([0-9]{4})\.").expect("y_dot pattern"),
        ),
    ]
});

/// Finds the first date-like substring in `text`. The first pattern that
/// matches decides the result; an out-of-range year, month or day discards
/// it entirely. Missing month/day default to 1.
pub fn parse_release_date(text: &str) -> Option<ReleaseDate> {
    for (name, regex) in DATE_PATTERNS.iter() {
        if let Some(caps) = regex.captures(text) {
            let date = date_from_captures(&caps);
            debug!("date pattern {} matched: {:?}", name, date);
            return date;
        }
    }
    None
}

fn date_from_captures(caps: &Captures<'_>) -> Option<ReleaseDate> {
    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let month = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1,
    };
    let day = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1,
    };
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return None;
    }
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some(ReleaseDate::new(year, month, day))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_separated_dates() {
        assert_eq!(parse_release_date("2024-03-15"), Some(ReleaseDate::new(2024, 3, 15)));
        assert_eq!(
            parse_release_date("Released 2019/11/02 in stores"),
            Some(ReleaseDate::new(2019, 11, 2))
        );
        assert_eq!(parse_release_date("2001.7.4"), Some(ReleaseDate::new(2001, 7, 4)));
    }

    #[test]
    fn parses_kanji_forms() {
        assert_eq!(
            parse_release_date("発売日：2022年10月5日"),
            Some(ReleaseDate::new(2022, 10, 5))
        );
        assert_eq!(parse_release_date("2024年3月"), Some(ReleaseDate::new(2024, 3, 1)));
        assert_eq!(parse_release_date("2018年"), Some(ReleaseDate::new(2018, 1, 1)));
    }

    #[test]
    fn parses_labeled_and_bare_years() {
        assert_eq!(
            parse_release_date("Release Date: 2015"),
            Some(ReleaseDate::new(2015, 1, 1))
        );
        assert_eq!(parse_release_date("配信開始日 2012"), Some(ReleaseDate::new(2012, 1, 1)));
        assert_eq!(parse_release_date("(2009/"), Some(ReleaseDate::new(2009, 1, 1)));
    }

    #[test]
    fn out_of_range_year_discards_result() {
        assert_eq!(parse_release_date("2031-01-01"), None);
        assert_eq!(parse_release_date("1989年5月"), None);
    }

    #[test]
    fn invalid_month_or_day_discards_result() {
        assert_eq!(parse_release_date("2024-13-01"), None);
        assert_eq!(parse_release_date("2024-02-32"), None);
    }

    #[test]
    fn first_matching_pattern_wins() {
        // The full date is preferred even when a kanji year appears first.
        assert_eq!(
            parse_release_date("2010年 ... 2011-06-07"),
            Some(ReleaseDate::new(2011, 6, 7))
        );
        // A rejected match does not fall through to later patterns.
        assert_eq!(parse_release_date("2099-01-01 2015年"), None);
    }

    #[test]
    fn no_date_returns_none() {
        assert_eq!(parse_release_date("no date here"), None);
        assert_eq!(parse_release_date("12345678"), None);
    }
}
