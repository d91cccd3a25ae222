//! Page fetcher.
//!
//! Downloads run in their own task and race a deadline timer. When the
//! deadline wins, the join handle is dropped: the download keeps running
//! detached until the client's hard timeout and its result is discarded.

use std::collections::BTreeMap;
use std::error::Error as _;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Target;

/// Default fetch deadline.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Fetches target pages with a bounded deadline.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    deadline: Duration,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Fetch the decoded markup of a target.
    pub async fn fetch(&self, target: &Target) -> Result<String> {
        let download = tokio::spawn(download(
            self.client.clone(),
            target.url.clone(),
            target.headers.clone(),
        ));

        match tokio::time::timeout(self.deadline, download).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(AppError::task(target.id(), join_error)),
            Err(_) => {
                log::debug!(
                    "Abandoning fetch of {} after {:?}",
                    target.url,
                    self.deadline
                );
                Err(AppError::Timeout {
                    url: target.url.to_string(),
                })
            }
        }
    }
}

/// Perform one request and decode the body with the charset declared in
/// `Content-Type`, UTF-8 otherwise.
async fn download(client: Client, url: Url, headers: BTreeMap<String, String>) -> Result<String> {
    let mut request = client.get(url.clone());
    for (name, value) in &headers {
        request = request.header(name, value);
    }

    let response = request
        .send()
        .await
        .map_err(|e| classify_transport_error(e, &url))?;

    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(AppError::Remote {
            url: url.to_string(),
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    let text = response
        .text()
        .await
        .map_err(|e| classify_transport_error(e, &url))?;
    if text.is_empty() {
        return Err(AppError::EmptyResponse {
            url: url.to_string(),
        });
    }

    Ok(text)
}

/// A connection closed before any response arrived counts as an empty
/// response; everything else stays an HTTP error.
fn classify_transport_error(error: reqwest::Error, url: &Url) -> AppError {
    if ended_without_data(&error) {
        AppError::EmptyResponse {
            url: url.to_string(),
        }
    } else {
        AppError::Http(error)
    }
}

fn ended_without_data(error: &reqwest::Error) -> bool {
    std::iter::successors(error.source(), |&e| e.source()).any(|e| {
        e.downcast_ref::<hyper::Error>()
            .is_some_and(hyper::Error::is_incomplete_message)
            || e.downcast_ref::<std::io::Error>()
                .is_some_and(|io| io.kind() == std::io::ErrorKind::UnexpectedEof)
    })
}
