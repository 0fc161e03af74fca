use scraper::{ElementRef, Html, Selector};

use crate::{Error, Result};

/// A parsed html page, only queryable through css selectors
#[derive(Debug)]
pub struct Document(Html);

impl Document {
    /// Parsing is lenient, malformed markup still yields a (possibly empty) document
    pub fn parse(html: &str) -> Self {
        Self(Html::parse_document(html))
    }

    /// All the elements matching `selector`, in document order
    ///
    /// ## Errors
    ///
    /// Fails if `selector` isn't valid css
    pub fn select<'a>(&'a self, selector: &str) -> Result<Vec<Element<'a>>> {
        let parsed = Selector::parse(selector).map_err(|err| Error::Selector {
            selector: selector.to_string(),
            message: err.to_string(),
        })?;

        Ok(self.0.select(&parsed).map(Element).collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Element<'a>(ElementRef<'a>);

impl<'a> Element<'a> {
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    /// Text content of the element and all its descendants
    pub fn text(&self) -> String {
        self.0.text().collect()
    }
}
