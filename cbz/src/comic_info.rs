use quick_xml::se::Serializer;
use serde::Serialize;

use crate::Result;

static XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";
static XMLNS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
static XMLNS_XSD: &str = "http://www.w3.org/2001/XMLSchema";

/// The `ComicInfo.xml` sidecar, fields are declared in the schema order
/// since some readers validate against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "ComicInfo", rename_all = "PascalCase")]
pub struct ComicInfo {
    #[serde(rename = "@xmlns:xsi")]
    xmlns_xsi: &'static str,
    #[serde(rename = "@xmlns:xsd")]
    xmlns_xsd: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
    pub page_count: usize,
    #[serde(rename = "LanguageISO", skip_serializing_if = "Option::is_none")]
    pub language_iso: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_arc: Option<String>,
}

impl ComicInfo {
    #[must_use]
    pub fn new() -> Self {
        Self {
            xmlns_xsi: XMLNS_XSI,
            xmlns_xsd: XMLNS_XSD,
            title: None,
            series: None,
            number: None,
            year: None,
            month: None,
            day: None,
            web: None,
            page_count: 0,
            language_iso: None,
            format: None,
            characters: None,
            story_arc: None,
        }
    }

    /// Serializes into an indented xml document, declaration included
    ///
    /// ## Errors
    ///
    /// Fails if serialization fails
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::from(XML_DECLARATION);
        let mut serializer = Serializer::new(&mut xml);
        serializer.indent(' ', 2);
        self.serialize(serializer)?;

        Ok(xml)
    }
}

impl Default for ComicInfo {
    fn default() -> Self {
        Self::new()
    }
}
