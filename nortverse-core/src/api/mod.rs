use async_trait::async_trait;

pub use crawl::Crawl;
pub use process_issue::ProcessIssue;

use crate::Result;

pub mod crawl;
pub mod process_issue;

#[async_trait]
pub trait Request {
    type Response;

    async fn request(self) -> Result<Self::Response>;
}
