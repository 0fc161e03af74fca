pub use api::{Crawl, ProcessIssue, Request};
pub use client::{Body, Client};
pub use errors::{Error, Result};
pub use page::IssuePage;

pub mod api;
pub mod client;
pub mod delay;
pub mod document;
pub mod errors;
pub mod page;
