use metadata::{clean_text, extract_pattern, normalize_code, parse_release_date};
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::client::{url_escape, ScrapeClient, ScrapeError};
use crate::source::{ScrapeHit, SourceScraper};

/// Where a title candidate is read from: the element text, or one of its
/// attributes.
pub struct TextRule {
    pub selector: Selector,
    pub attr: Option<&'static str>,
}

/// Selector lists for one site. Every list is tried in order and the first
/// usable match wins.
pub struct SiteProfile {
    pub name: &'static str,
    pub base_url: &'static str,
    /// Path and query of the search page for a normalized code.
    pub search_path: fn(&str) -> String,
    pub detail_links: Vec<Selector>,
    pub detail_titles: Vec<TextRule>,
    pub search_titles: Vec<TextRule>,
    pub date_regions: Vec<Selector>,
}

fn css(source: &'static str) -> Selector {
    Selector::parse(source).expect("site selector")
}

fn text(source: &'static str) -> TextRule {
    TextRule {
        selector: css(source),
        attr: None,
    }
}

fn attr(source: &'static str, name: &'static str) -> TextRule {
    TextRule {
        selector: css(source),
        attr: Some(name),
    }
}

pub static JAVDB: Lazy<SiteProfile> = Lazy::new(|| SiteProfile {
    name: "JavDB",
    base_url: "https://javdb.com",
    search_path: |code| format!("/search?q={}&f=all", url_escape(code)),
    detail_links: vec![css(r#"div.item > a[href^="/v/"]"#), css(r#"a[href^="/v/"]"#)],
    detail_titles: vec![text("strong.current-title"), text("h2.title"), text("strong")],
    search_titles: vec![
        text("div.item div.video-title"),
        attr(r#"a[href^="/v/"][title]"#, "title"),
        text("div.title"),
    ],
    date_regions: vec![css("div.panel-block span.value"), css("div.item div.meta")],
});

pub static JAVLIBRARY: Lazy<SiteProfile> = Lazy::new(|| SiteProfile {
    name: "JavLibrary",
    base_url: "https://www.javlibrary.com",
    search_path: |code| format!("/en/vl_searchbyid.php?keyword={}", url_escape(code)),
    detail_links: vec![css("div.video > a[href]")],
    detail_titles: vec![text("#video_title a"), text("h3.post-title")],
    // An exact id match redirects straight to the detail page, so the
    // detail selectors come first here too.
    search_titles: vec![
        text("#video_title a"),
        attr("div.video > a[title]", "title"),
        attr(r#"a[href*="/vl"][title]"#, "title"),
    ],
    date_regions: vec![css("#video_date td.text")],
});

pub struct SiteScraper {
    profile: &'static SiteProfile,
    client: ScrapeClient,
    base_url: String,
}

impl SiteScraper {
    pub fn new(profile: &'static SiteProfile, client: ScrapeClient) -> Self {
        Self {
            profile,
            client,
            base_url: profile.base_url.to_string(),
        }
    }

    /// Points the scraper at a mirror of the site.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn lookup(&self, code: &str) -> Result<Option<ScrapeHit>, ScrapeError> {
        let search_url = format!("{}{}", self.base_url, (self.profile.search_path)(code));
        let search_page = Html::parse_document(&self.client.get_text(&search_url)?);

        if let Some(href) = first_link(&self.profile.detail_links, &search_page) {
            let detail_url = resolve_url(&search_url, &href)?;
            match self.client.get_text(&detail_url) {
                Ok(body) => {
                    let detail_page = Html::parse_document(&body);
                    let hit = extract_hit(
                        self.profile,
                        &self.profile.detail_titles,
                        &detail_page,
                        code,
                    );
                    if hit.is_some() {
                        return Ok(hit);
                    }
                    debug!("{}: no title on detail page {}", self.profile.name, detail_url);
                }
                Err(err) => {
                    warn!("{}: detail page {} failed: {}", self.profile.name, detail_url, err);
                }
            }
        }
        Ok(extract_hit(
            self.profile,
            &self.profile.search_titles,
            &search_page,
            code,
        ))
    }
}

impl SourceScraper for SiteScraper {
    fn name(&self) -> &str {
        self.profile.name
    }

    fn scrape(&self, code: &str) -> Option<ScrapeHit> {
        let code = normalize_code(code);
        if extract_pattern(&code).is_none() {
            debug!("{}: {} is not a searchable code", self.profile.name, code);
            return None;
        }
        match self.lookup(&code) {
            Ok(hit) => hit,
            Err(err) => {
                warn!("{}: lookup for {} failed: {}", self.profile.name, code, err);
                None
            }
        }
    }
}

fn first_link(selectors: &[Selector], page: &Html) -> Option<String> {
    selectors.iter().find_map(|selector| {
        page.select(selector)
            .filter_map(|element| element.value().attr("href"))
            .map(str::trim)
            .find(|href| !href.is_empty())
            .map(str::to_string)
    })
}

fn resolve_url(base: &str, href: &str) -> Result<String, ScrapeError> {
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(String::from)
        .map_err(|err| ScrapeError::Url(format!("{} ({})", href, err)))
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Title from the first matching rule in `titles`, and a release date from
/// the profile's date regions or, failing those, the whole page text.
fn extract_hit(
    profile: &SiteProfile,
    titles: &[TextRule],
    page: &Html,
    code: &str,
) -> Option<ScrapeHit> {
    let title = extract_title(titles, page, code)?;
    let date = profile
        .date_regions
        .iter()
        .flat_map(|selector| page.select(selector))
        .filter_map(element_text)
        .find_map(|text| parse_release_date(&text))
        .or_else(|| element_text(page.root_element()).and_then(|text| parse_release_date(&text)));
    Some(ScrapeHit { title, date })
}

fn extract_title(rules: &[TextRule], page: &Html, code: &str) -> Option<String> {
    rules.iter().find_map(|rule| {
        page.select(&rule.selector).find_map(|element| {
            let raw = match rule.attr {
                Some(name) => clean_text(element.value().attr(name)?),
                None => element_text(element),
            }?;
            clean_title(&raw, code)
        })
    })
}

fn clean_title(text: &str, code: &str) -> Option<String> {
    let title = strip_code_prefix(text, code);
    if title.chars().count() > 5 {
        Some(title.to_string())
    } else {
        None
    }
}

fn strip_code_prefix<'a>(text: &'a str, code: &str) -> &'a str {
    if text.len() >= code.len()
        && text.is_char_boundary(code.len())
        && text[..code.len()].eq_ignore_ascii_case(code)
    {
        text[code.len()..].trim_start_matches(|ch: char| ch.is_whitespace() || ch == '-' || ch == ':')
    } else {
        text
    }
}
