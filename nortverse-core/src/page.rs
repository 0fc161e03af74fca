use std::sync::LazyLock;

use cbz::ComicInfo;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tracing::warn;
use url::Url;

use crate::{document::Document, Error, Result};

pub static SERIES: &str = "Nortverse";
pub static LANGUAGE_ISO: &str = "en";
pub static FORMAT: &str = "Web";

/// Character pages all live under this url, the anchors pointing there name the cast
pub static CHARACTER_INDEX_URL: &str = "https://nortverse.com/comic-character/";

/// Layout of the "posted on" text, e.g. `January 2, 2006`
static DATE_FORMAT: &str = "%B %d, %Y";

/// Relative shortlinks are resolved against the site root
static SITE_URL: LazyLock<Url> = LazyLock::new(|| Url::parse("https://nortverse.com/").unwrap());

/// `Some arc #12`, the number itself isn't kept
static STORY_ARC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(.*)#(\d+)\s*$").unwrap());

/// Everything extracted from an issue page, before any image is downloaded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuePage {
    pub id: u64,
    pub next_url: String,
    pub posted_on: Vec<String>,
    pub title: Option<String>,
    pub story_arc: Option<String>,
    pub characters: Vec<String>,
    pub images: Vec<String>,
}

impl IssuePage {
    /// ## Errors
    ///
    /// Fails if the shortlink isn't a valid url or doesn't hold a numeric `p` parameter
    pub fn parse(html: &str) -> Result<Self> {
        let document = Document::parse(html);
        let mut page = Self {
            id: issue_id(&document)?,
            ..Self::default()
        };

        for next in document.select("a.next-comic")? {
            if let Some(href) = next.attr("href") {
                page.next_url = href.to_string();
            }
        }

        page.posted_on = document
            .select(".posted-on a")?
            .iter()
            .map(|element| element.text())
            .collect();

        for title in document.select(".default-lang .entry-title")? {
            let title = title.text();
            if let Some(captures) = STORY_ARC.captures(&title) {
                page.story_arc = Some(captures[1].trim().to_string());
            }
            page.title = Some(title);
        }

        page.characters = document
            .select(&format!("a[href^='{CHARACTER_INDEX_URL}']"))?
            .iter()
            .map(|element| element.text())
            .collect();

        page.images = document
            .select("div#comic img")?
            .iter()
            .map(|element| element.attr("src").unwrap_or_default().to_string())
            .collect();

        Ok(page)
    }

    /// `nortverse - 0042.cbz`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{} - {:04}.cbz", SERIES.to_lowercase(), self.id)
    }

    /// Metadata for this issue, `page_count` is left to the caller
    ///
    /// ## Errors
    ///
    /// Fails if a publication date doesn't follow the `January 2, 2006` layout
    pub fn comic_info(&self, source_url: &str) -> Result<ComicInfo> {
        let mut comic_info = ComicInfo::new();
        comic_info.series = Some(SERIES.to_string());
        comic_info.web = Some(source_url.to_string());
        comic_info.language_iso = Some(LANGUAGE_ISO.to_string());
        comic_info.format = Some(FORMAT.to_string());
        comic_info.title.clone_from(&self.title);
        comic_info.story_arc.clone_from(&self.story_arc);
        comic_info.number = Some(self.id.to_string());

        for posted_on in &self.posted_on {
            let date = parse_date(posted_on)?;
            comic_info.year = Some(date.year());
            comic_info.month = Some(date.month());
            comic_info.day = Some(date.day());
        }

        if !self.characters.is_empty() {
            comic_info.characters = Some(self.characters.join(","));
        }

        Ok(comic_info)
    }
}

fn issue_id(document: &Document) -> Result<u64> {
    let mut id = None;
    for shortlink in document.select("link[rel=shortlink]")? {
        let Some(href) = shortlink.attr("href") else {
            continue;
        };
        let url = Url::options()
            .base_url(Some(&*SITE_URL))
            .parse(href)
            .map_err(|source| Error::Shortlink {
                value: href.to_string(),
                source,
            })?;
        let post_id = url
            .query_pairs()
            .find(|(key, _)| key == "p")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        id = Some(post_id.parse().map_err(|source| Error::IssueId {
            value: href.to_string(),
            source,
        })?);
    }

    Ok(id.unwrap_or_else(|| {
        warn!("no shortlink found, issue id defaults to 0");
        0
    }))
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|source| Error::Date {
        value: text.to_string(),
        source,
    })
}
