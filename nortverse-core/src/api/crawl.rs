use std::time::Duration;

use async_trait::async_trait;
use camino::Utf8PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::process_issue::{Outcome, DEFAULT_OUTPUT_DIR};
use crate::{
    delay::{pause, random_delay},
    Client, Error, ProcessIssue, Request, Result,
};

pub static DEFAULT_START_URL: &str = "https://nortverse.com/comic/overconfidence/";
pub static DEFAULT_SLEEP_MIN: Duration = Duration::from_secs(60);
pub static DEFAULT_SLEEP_MAX: Duration = Duration::from_secs(70);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub archived: usize,
    pub skipped: usize,
}

/// Follows the next links from `start_url`, archiving every issue on the way,
/// until an issue has no next link (or after the first one in single mode).
#[derive(Debug, Clone)]
pub struct Crawl<'a> {
    client: &'a Client,
    start_url: String,
    single: bool,
    sleep_min: Duration,
    sleep_max: Duration,
    output_dir: Utf8PathBuf,
    overwrite: bool,
    cancel: CancellationToken,
}

impl<'a> Crawl<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            start_url: DEFAULT_START_URL.to_string(),
            single: false,
            sleep_min: DEFAULT_SLEEP_MIN,
            sleep_max: DEFAULT_SLEEP_MAX,
            output_dir: DEFAULT_OUTPUT_DIR.into(),
            overwrite: false,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn set_start_url(mut self, start_url: impl Into<String>) -> Self {
        self.start_url = start_url.into();
        self
    }

    #[must_use]
    pub fn set_single(mut self, single: bool) -> Self {
        self.single = single;
        self
    }

    /// Window the pause between two issues is picked from
    #[must_use]
    pub fn set_sleep(mut self, min: Duration, max: Duration) -> Self {
        self.sleep_min = min;
        self.sleep_max = max;
        self
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
}

#[async_trait]
impl<'a> Request for Crawl<'a> {
    type Response = Summary;

    async fn request(self) -> Result<Self::Response> {
        let mut summary = Summary::default();
        let mut url = self.start_url.clone();

        loop {
            let response = ProcessIssue::new(self.client, &url)
                .set_output_dir(&self.output_dir)
                .set_overwrite(self.overwrite)
                .set_cancellation_token(self.cancel.clone())
                .request()
                .await
                .map_err(|err| Error::issue(&url, err))?;

            match response.outcome {
                Outcome::Archived(_) => summary.archived += 1,
                Outcome::Skipped => summary.skipped += 1,
            }

            if self.single || response.next_url.is_empty() {
                break;
            }
            url = response.next_url;

            pause(&self.cancel, random_delay(self.sleep_min, self.sleep_max)).await?;
        }

        info!(
            "Done, {} issue(s) archived, {} skipped",
            summary.archived, summary.skipped
        );

        Ok(summary)
    }
}
