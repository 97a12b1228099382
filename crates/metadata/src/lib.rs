//! Pure parsing helpers shared by the scrapers and the catalog: work-code
//! normalization, release-date extraction, title validation and whitespace
//! cleanup of scraped text. Nothing here performs I/O.

mod code;
mod date;
mod text;
mod title;

pub use code::{extract_pattern, normalize_code};
pub use date::{parse_release_date, MAX_YEAR, MIN_YEAR};
pub use text::clean_text;
pub use title::{is_valid_title, MIN_TITLE_CHARS};
