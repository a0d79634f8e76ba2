//! Bounded concurrent dispatch of pending monthly requests.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;

use crate::cds::Retrieve;
use crate::error::Era5Error;
use crate::plan::MonthlyRequest;
use crate::request;

pub const DEFAULT_CONCURRENCY: usize = 10;

/// Dispatches every pending request to the archive, at most `concurrency`
/// in flight at once.
///
/// Each request's failure is captured independently; the remaining
/// requests run to completion and the failures are reported in aggregate
/// afterwards. No retries.
pub async fn run(
    pending: Vec<MonthlyRequest>,
    client: Arc<dyn Retrieve>,
    concurrency: usize,
) -> Result<(), Era5Error> {
    let total = pending.len();
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let progress_bar = Arc::new(Mutex::new(
        ProgressBar::new(total as u64).with_message("Fetching monthly files"),
    ));
    progress_bar.lock().unwrap().set_style(
        ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    let tasks: Vec<_> = pending
        .into_iter()
        .map(|request| {
            let client = Arc::clone(&client);
            let semaphore = Arc::clone(&semaphore);
            let pb = Arc::clone(&progress_bar);
            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.unwrap();
                fetch_one(&*client, &request, pb).await
            })
        })
        .collect();

    let mut failed = 0usize;
    for result in join_all(tasks).await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                failed += 1;
                tracing::warn!(error = ?e, "retrieval failed");
                eprintln!("Error fetching file: {:?}", e);
            }
            Err(e) => {
                failed += 1;
                eprintln!("Task join error: {:?}", e);
            }
        }
    }
    progress_bar
        .lock()
        .unwrap()
        .finish_with_message("Fetch complete");

    if failed > 0 {
        return Err(Era5Error::Retrieval { failed, total });
    }

    Ok(())
}

async fn fetch_one(
    client: &dyn Retrieve,
    request: &MonthlyRequest,
    progress_bar: Arc<Mutex<ProgressBar>>,
) -> Result<()> {
    let body = request::body(request);
    client
        .retrieve(&request.dataset, &body, &request.target)
        .await
        .with_context(|| format!("retrieval of {} failed", request.target.display()))?;

    println!("{} complete", request.target.display());
    {
        let pb = progress_bar.lock().unwrap();
        pb.inc(1);
    }

    Ok(())
}

// -- Tests -------------------------------------------------------------------
