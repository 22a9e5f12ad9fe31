use std::time::Duration;
use futures::FutureExt;
use log::debug;
use reqwest::StatusCode;
use crate::error::{Result, ViewerError};
use crate::zarr::store::{ArrayStore, StoreFuture};
/// Read-only store over plain HTTP(S) GETs, e.g. a public S3 bucket.
pub struct HttpStore {
    base_url: String,
    client: reqwest::Client,
}
impl HttpStore {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ViewerError::Connection(format!("cannot build http client: {e}")))?;
        Ok(Self::with_client(base_url, client))
    }
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key.trim_start_matches('/'))
    }
}
fn map_transport_error(key: &str, err: reqwest::Error) -> ViewerError {
    if err.is_connect() {
        ViewerError::Connection(format!("{key}: {err}"))
    } else {
        ViewerError::fetch(key, err)
    }
}
impl ArrayStore for HttpStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a> {
        async move {
            let url = self.url_for(key);
            debug!("GET {url}");
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| map_transport_error(key, e))?;
            match response.status() {
                // S3 answers 403 for absent keys when listing is not allowed.
                StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Ok(None),
                status if status.is_success() => {
                    let body = response
                        .bytes()
                        .await
                        .map_err(|e| map_transport_error(key, e))?;
                    Ok(Some(body.to_vec()))
                }
                status => Err(ViewerError::fetch(key, format!("http status {status}"))),
            }
        }
        .boxed()
    }
    fn location(&self) -> String {
        self.base_url.clone()
    }
}
