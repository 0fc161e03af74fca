use std::{io::Write, time::Duration};

use bytes::Bytes;
use rand::seq::SliceRandom;
use reqwest::{
    header::{ACCEPT, USER_AGENT},
    StatusCode,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::{Error, Result};

pub static DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How long flaresolverr may spend solving a challenge, in milliseconds
pub static DEFAULT_MAX_SOLVE_TIMEOUT: u64 = 60_000;

/// A fresh user agent is drawn from this pool for every request
static USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

#[must_use]
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Transport {
    Direct,
    FlareSolverr { endpoint: Url, max_timeout: u64 },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolveRequest<'a> {
    cmd: &'static str,
    url: &'a str,
    max_timeout: u64,
}

#[derive(Debug, Deserialize)]
struct SolveResponse {
    status: String,
    #[serde(default)]
    message: String,
    solution: Option<Solution>,
}

#[derive(Debug, Deserialize)]
struct Solution {
    status: u16,
    #[serde(default)]
    response: String,
}

/// The body of a successful fetch, consumed chunk by chunk
#[derive(Debug)]
pub enum Body {
    Stream(reqwest::Response),
    Buffered(Option<Bytes>),
}

impl Body {
    /// Next chunk of the body, `None` once it's exhausted
    ///
    /// ## Errors
    ///
    /// Fails if the connection breaks while reading
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        match self {
            Self::Stream(response) => Ok(response.chunk().await?),
            Self::Buffered(bytes) => Ok(bytes.take()),
        }
    }

    /// Streams the whole body into `writer`, returns the amount of bytes copied
    ///
    /// ## Errors
    ///
    /// Fails if the token is cancelled, the body can't be read, or the writer fails
    pub async fn copy_to<W>(mut self, cancel: &CancellationToken, writer: &mut W) -> Result<usize>
    where
        W: Write + Send + ?Sized,
    {
        let mut copied = 0;
        loop {
            let chunk = tokio::select! {
                () = cancel.cancelled() => return Err(Error::Cancelled),
                chunk = self.chunk() => chunk?,
            };
            let Some(chunk) = chunk else {
                break;
            };
            writer.write_all(&chunk)?;
            copied += chunk.len();
        }

        Ok(copied)
    }
}

/// Http client shared by every fetch of a run, so connections are reused
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    transport: Transport,
}

impl Client {
    /// ## Errors
    ///
    /// Fails if the underlying tls backend can't be initialized
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            transport: Transport::Direct,
        })
    }

    /// Route every request through a flaresolverr instance listening at `endpoint`
    #[must_use]
    pub fn set_flaresolverr(mut self, endpoint: Option<Url>) -> Self {
        self.transport = match endpoint {
            Some(endpoint) => Transport::FlareSolverr {
                endpoint,
                max_timeout: DEFAULT_MAX_SOLVE_TIMEOUT,
            },
            None => Transport::Direct,
        };
        self
    }

    /// Get `url`, only a 200 response is considered a success
    ///
    /// ## Errors
    ///
    /// Fails on transport errors, on any other status, or if `cancel` is cancelled first
    pub async fn fetch(&self, cancel: &CancellationToken, url: &str) -> Result<Body> {
        let request = async {
            match &self.transport {
                Transport::Direct => self.fetch_direct(url).await,
                Transport::FlareSolverr {
                    endpoint,
                    max_timeout,
                } => self.fetch_solved(endpoint, *max_timeout, url).await,
            }
        };

        tokio::select! {
            () = cancel.cancelled() => Err(Error::Cancelled),
            body = request => body,
        }
    }

    async fn fetch_direct(&self, url: &str) -> Result<Body> {
        debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "*/*")
            .header(USER_AGENT, random_user_agent())
            .send()
            .await?;
        check_status(response.status())?;

        Ok(Body::Stream(response))
    }

    async fn fetch_solved(&self, endpoint: &Url, max_timeout: u64, url: &str) -> Result<Body> {
        let mut api = endpoint.clone();
        api.set_path("v1");
        debug!("GET {url} through {api}");
        let response = self
            .http
            .post(api)
            .json(&SolveRequest {
                cmd: "request.get",
                url,
                max_timeout,
            })
            .send()
            .await?;

        // failed solves come back as 500s carrying a json message
        let status = response.status();
        let solved = match response.json::<SolveResponse>().await {
            Ok(solved) => solved,
            Err(_) if status != StatusCode::OK => return Err(Error::Status(status)),
            Err(err) => return Err(err.into()),
        };
        if solved.status != "ok" {
            return Err(Error::FlareSolverr(solved.message));
        }
        check_status(status)?;
        let Some(solution) = solved.solution else {
            return Err(Error::FlareSolverr(String::from("missing solution")));
        };
        let status = StatusCode::from_u16(solution.status)
            .map_err(|_| Error::FlareSolverr(format!("invalid status {}", solution.status)))?;
        check_status(status)?;

        Ok(Body::Buffered(Some(solution.response.into())))
    }
}

fn check_status(status: StatusCode) -> Result<()> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(Error::Status(status))
    }
}

#[cfg(test)]
mod tests {
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };

    use super::*;

    async fn read_all(body: Body) -> Vec<u8> {
        let mut buf = Vec::new();
        body.copy_to(&CancellationToken::new(), &mut buf)
            .await
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn fetch_sends_identification_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/comic/")
                    .header("accept", "*/*")
                    .header_exists("user-agent");
                then.status(200).body("<html></html>");
            })
            .await;
        let client = Client::new(DEFAULT_TIMEOUT).unwrap();

        let body = client
            .fetch(&CancellationToken::new(), &server.url("/comic/"))
            .await
            .unwrap();

        assert_eq!(read_all(body).await, b"<html></html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_200_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing.png");
                then.status(404);
            })
            .await;
        let client = Client::new(DEFAULT_TIMEOUT).unwrap();

        let err = client
            .fetch(&CancellationToken::new(), &server.url("/missing.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Status(StatusCode::NOT_FOUND)));
        assert_eq!(err.to_string(), "status code error: 404 Not Found");
    }

    #[tokio::test]
    async fn other_success_codes_are_errors_too() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/partial");
                then.status(206).body("partial");
            })
            .await;
        let client = Client::new(DEFAULT_TIMEOUT).unwrap();

        let err = client
            .fetch(&CancellationToken::new(), &server.url("/partial"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Status(StatusCode::PARTIAL_CONTENT)));
    }

    #[tokio::test]
    async fn empty_url_is_a_transport_error() {
        let client = Client::new(DEFAULT_TIMEOUT).unwrap();

        let err = client
            .fetch(&CancellationToken::new(), "")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Reqwest(_)));
    }

    #[tokio::test]
    async fn cancelled_token_aborts_fetch() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow");
                then.status(200).delay(Duration::from_secs(5)).body("late");
            })
            .await;
        let client = Client::new(DEFAULT_TIMEOUT).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client
            .fetch(&cancel, &server.url("/slow"))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn flaresolverr_solution_becomes_the_body() {
        let server = MockServer::start_async().await;
        let target = "https://nortverse.com/comic/origins/";
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1").json_body_includes(
                    serde_json::json!({ "cmd": "request.get", "url": target }).to_string(),
                );
                then.status(200).json_body(serde_json::json!({
                    "status": "ok",
                    "message": "Challenge not detected!",
                    "solution": { "status": 200, "response": "<html>solved</html>" }
                }));
            })
            .await;
        let endpoint = Url::parse(&server.base_url()).unwrap();
        let client = Client::new(DEFAULT_TIMEOUT)
            .unwrap()
            .set_flaresolverr(Some(endpoint));

        let body = client
            .fetch(&CancellationToken::new(), target)
            .await
            .unwrap();

        assert_eq!(read_all(body).await, b"<html>solved</html>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn flaresolverr_forwards_target_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1");
                then.status(200).json_body(serde_json::json!({
                    "status": "ok",
                    "message": "",
                    "solution": { "status": 403, "response": "denied" }
                }));
            })
            .await;
        let endpoint = Url::parse(&server.base_url()).unwrap();
        let client = Client::new(DEFAULT_TIMEOUT)
            .unwrap()
            .set_flaresolverr(Some(endpoint));

        let err = client
            .fetch(&CancellationToken::new(), "https://nortverse.com/")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Status(StatusCode::FORBIDDEN)));
    }

    #[tokio::test]
    async fn flaresolverr_failure_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1");
                then.status(200).json_body(serde_json::json!({
                    "status": "error",
                    "message": "Error solving the challenge. Timeout after 60.0 seconds."
                }));
            })
            .await;
        let endpoint = Url::parse(&server.base_url()).unwrap();
        let client = Client::new(DEFAULT_TIMEOUT)
            .unwrap()
            .set_flaresolverr(Some(endpoint));

        let err = client
            .fetch(&CancellationToken::new(), "https://nortverse.com/")
            .await
            .unwrap_err();

        assert!(
            matches!(err, Error::FlareSolverr(message) if message.starts_with("Error solving"))
        );
    }

    #[tokio::test]
    async fn flaresolverr_error_status_keeps_the_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1");
                then.status(500).json_body(serde_json::json!({
                    "status": "error",
                    "message": "Error: Error solving the challenge. Timeout after 60.0 seconds."
                }));
            })
            .await;
        let endpoint = Url::parse(&server.base_url()).unwrap();
        let client = Client::new(DEFAULT_TIMEOUT)
            .unwrap()
            .set_flaresolverr(Some(endpoint));

        let err = client
            .fetch(&CancellationToken::new(), "https://nortverse.com/")
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "flaresolverr error: Error: Error solving the challenge. Timeout after 60.0 seconds."
        );
    }

    #[tokio::test]
    async fn flaresolverr_unreadable_error_falls_back_to_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1");
                then.status(502).body("Bad Gateway");
            })
            .await;
        let endpoint = Url::parse(&server.base_url()).unwrap();
        let client = Client::new(DEFAULT_TIMEOUT)
            .unwrap()
            .set_flaresolverr(Some(endpoint));

        let err = client
            .fetch(&CancellationToken::new(), "https://nortverse.com/")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Status(StatusCode::BAD_GATEWAY)));
    }

    #[test]
    fn user_agents_come_from_the_pool() {
        for _ in 0..16 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }
}
