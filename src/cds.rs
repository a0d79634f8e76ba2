//! Climate Data Store API client.
//!
//! Submits a request, polls the task until the archive has staged the
//! result, then streams it to the target file.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Era5Error;

/// Retrieval seam between the fetch pool and the archive. Blocking from
/// the caller's point of view; may fail on authentication, quota or
/// network errors.
#[async_trait]
pub trait Retrieve: Send + Sync {
    async fn retrieve(&self, dataset: &str, body: &Value, target: &Path) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub key: String,
}

impl Credentials {
    /// Reads `CDSAPI_URL`/`CDSAPI_KEY`, falling back to `~/.cdsapirc`.
    pub fn discover() -> Result<Self, Era5Error> {
        if let (Ok(url), Ok(key)) = (std::env::var("CDSAPI_URL"), std::env::var("CDSAPI_KEY")) {
            return Ok(Credentials { url, key });
        }

        let rc = dirs::home_dir()
            .map(|home| home.join(".cdsapirc"))
            .filter(|rc| rc.is_file())
            .ok_or_else(|| {
                Era5Error::Configuration(
                    "no archive credentials: set CDSAPI_URL and CDSAPI_KEY, or create ~/.cdsapirc"
                        .into(),
                )
            })?;
        let contents = fs::read_to_string(&rc).map_err(|e| {
            Era5Error::Configuration(format!("failed to read {}: {e}", rc.display()))
        })?;

        Self::parse_rc(&contents).ok_or_else(|| {
            Era5Error::Configuration(format!(
                "{} is missing its `url:` or `key:` line",
                rc.display()
            ))
        })
    }

    fn parse_rc(contents: &str) -> Option<Self> {
        let mut url = None;
        let mut key = None;

        for line in contents.lines() {
            if let Some((name, value)) = line.split_once(':') {
                match name.trim() {
                    "url" => url = Some(value.trim().to_string()),
                    "key" => key = Some(value.trim().to_string()),
                    _ => {}
                }
            }
        }

        Some(Credentials {
            url: url?,
            key: key?,
        })
    }

    // The key is `uid:secret`; a bare token is sent as the username.
    fn auth(&self) -> (String, Option<String>) {
        match self.key.split_once(':') {
            Some((user, secret)) => (user.to_string(), Some(secret.to_string())),
            None => (self.key.clone(), None),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.url.trim_end_matches('/'))
    }
}

/// Production archive client. Constructed once per process and shared
/// across the fetch pool's workers.
pub struct CdsClient {
    http: reqwest::Client,
    credentials: Credentials,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct TaskReply {
    state: String,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

impl CdsClient {
    pub fn new(credentials: Credentials) -> Self {
        CdsClient {
            http: reqwest::Client::new(),
            credentials,
            poll_interval: Duration::from_secs(5),
        }
    }

    async fn submit(&self, dataset: &str, body: &Value) -> Result<TaskReply> {
        let url = self.credentials.endpoint(&format!("resources/{dataset}"));
        let (user, secret) = self.credentials.auth();

        tracing::debug!(dataset, "submitting request");
        let reply = self
            .http
            .post(&url)
            .basic_auth(&user, secret.as_deref())
            .json(body)
            .send()
            .await
            .with_context(|| format!("failed to submit request to {url}"))?;

        let status = reply.status();
        if !status.is_success() {
            return Err(anyhow!("archive rejected request for {dataset}: {status}"));
        }

        Ok(reply.json().await?)
    }

    async fn poll(&self, mut task: TaskReply) -> Result<String> {
        loop {
            match task.state.as_str() {
                "completed" => {
                    return task
                        .location
                        .ok_or_else(|| anyhow!("completed task carries no download location"));
                }
                "failed" => {
                    let cause = task
                        .error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "unknown cause".to_string());
                    return Err(anyhow!("archive reported failure: {cause}"));
                }
                state => tracing::debug!(state, "task not ready"),
            }

            let id = task
                .request_id
                .clone()
                .ok_or_else(|| anyhow!("queued task carries no request id"))?;
            tokio::time::sleep(self.poll_interval).await;

            let url = self.credentials.endpoint(&format!("tasks/{id}"));
            let (user, secret) = self.credentials.auth();
            task = self
                .http
                .get(&url)
                .basic_auth(&user, secret.as_deref())
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
        }
    }

    async fn download(&self, location: &str, target: &Path) -> Result<()> {
        let reply = self.http.get(location).send().await?;
        if !reply.status().is_success() {
            return Err(anyhow!("failed to download result: {}", reply.status()));
        }

        let mut file = File::create(target)
            .with_context(|| format!("failed to create {}", target.display()))?;
        let mut stream = reply.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("error reading result chunk")?;
            file.write_all(&chunk)?;
        }

        Ok(())
    }
}

#[async_trait]
impl Retrieve for CdsClient {
    async fn retrieve(&self, dataset: &str, body: &Value, target: &Path) -> Result<()> {
        let task = self.submit(dataset, body).await?;
        let location = self.poll(task).await?;
        self.download(&location, target).await?;

        Ok(())
    }
}

// -- Tests -------------------------------------------------------------------
