use std::{fs, io};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cbz::{page_file_name, CbzWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{Client, Error, IssuePage, Request, Result};

pub static DEFAULT_OUTPUT_DIR: &str = "download";

/// Pages are stored as-is, whatever the server sends is named `.png`
pub static PAGE_EXTENSION: &str = "png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A new archive has been written with that many pages
    Archived(usize),
    /// An archive already existed and overwrite is disabled
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub id: u64,
    pub path: Utf8PathBuf,
    pub next_url: String,
    pub outcome: Outcome,
}

/// Downloads the issue at `url` and packs its pages, along with a `ComicInfo.xml`,
/// into `{output_dir}/nortverse - {id:04}.cbz`.
///
/// A failure mid-way leaves the partially written archive on disk.
#[derive(Debug, Clone)]
pub struct ProcessIssue<'a> {
    client: &'a Client,
    url: String,
    output_dir: Utf8PathBuf,
    overwrite: bool,
    cancel: CancellationToken,
}

impl<'a> ProcessIssue<'a> {
    pub fn new(client: &'a Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            output_dir: DEFAULT_OUTPUT_DIR.into(),
            overwrite: false,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn set_output_dir(mut self, output_dir: impl Into<Utf8PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    #[must_use]
    pub fn set_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn set_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    async fn fetch_page(&self) -> Result<IssuePage> {
        let mut html = Vec::new();
        self.client
            .fetch(&self.cancel, &self.url)
            .await
            .map_err(|err| Error::page(&self.url, err))?
            .copy_to(&self.cancel, &mut html)
            .await
            .map_err(|err| Error::page(&self.url, err))?;

        IssuePage::parse(&String::from_utf8_lossy(&html))
    }
}

#[async_trait]
impl<'a> Request for ProcessIssue<'a> {
    type Response = Response;

    async fn request(self) -> Result<Self::Response> {
        info!("Downloading issue {}", self.url);
        let page = self.fetch_page().await?;
        let path = self.output_dir.join(page.file_name());

        if !self.overwrite && exists(&path)? {
            info!("{path} already exists, skipping");
            return Ok(Response {
                id: page.id,
                path,
                next_url: page.next_url,
                outcome: Outcome::Skipped,
            });
        }

        fs::create_dir_all(&self.output_dir)?;
        let mut comic_info = page.comic_info(&self.url)?;

        info!("Creating {path}");
        let mut cbz_writer = CbzWriter::create(&path)?;
        for (index, src) in (1..).zip(&page.images) {
            cbz_writer.start_file(page_file_name(index, PAGE_EXTENSION))?;
            debug!("Downloading page {index}: {src}");
            let copied = self
                .client
                .fetch(&self.cancel, src)
                .await
                .map_err(|err| Error::image(src, err))?
                .copy_to(&self.cancel, &mut cbz_writer)
                .await
                .map_err(|err| Error::image(src, err))?;
            debug!("Packed page {index} ({copied} bytes)");
            comic_info.page_count = index;
        }

        cbz_writer.insert_comic_info(&comic_info)?;
        cbz_writer.finish()?;
        info!("Archived {path} ({} pages)", comic_info.page_count);

        Ok(Response {
            id: page.id,
            path,
            next_url: page.next_url,
            outcome: Outcome::Archived(comic_info.page_count),
        })
    }
}

/// Only a definite "not found" means the archive is missing, any other failure to stat it
/// is reported.
fn exists(path: &Utf8Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}
