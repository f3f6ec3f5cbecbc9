//! Background page loading.
//!
//! The store is owned by a single worker thread. The UI sends it
//! [`LoadRequest`]s and polls for [`LoadReply`]s without blocking the draw
//! loop. Every request carries an id, and replies echo it back so the UI can
//! discard answers to questions it no longer cares about.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use rvw_core::core::{ReviewPage, ReviewService};
use rvw_core::model::{Filters, Review};

/// What to fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Browse {
        filters: Filters,
        page: i64,
        page_size: i64,
    },
    Search {
        keywords: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub id: u64,
    pub query: Query,
}

/// Successful result of a [`Query`].
#[derive(Debug, Clone)]
pub enum Loaded {
    Page(ReviewPage),
    Search(Vec<Review>),
}

#[derive(Debug, Clone)]
pub struct LoadReply {
    pub id: u64,
    pub result: Result<Loaded, String>,
}

/// Handle to the worker thread.
pub struct Loader {
    requests: Option<Sender<LoadRequest>>,
    replies: Receiver<LoadReply>,
    worker: Option<JoinHandle<()>>,
}

impl Loader {
    /// Move `service` onto a new worker thread.
    pub fn spawn(service: ReviewService) -> Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<LoadRequest>();
        let (reply_tx, reply_rx) = mpsc::channel::<LoadReply>();

        let worker = thread::Builder::new()
            .name("rvw-loader".to_string())
            .spawn(move || {
                for request in request_rx {
                    let reply = execute(&service, request);
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
                tracing::debug!("loader thread exiting");
            })?;

        Ok(Self {
            requests: Some(request_tx),
            replies: reply_rx,
            worker: Some(worker),
        })
    }

    /// Queue a request for the worker.
    pub fn send(&self, request: LoadRequest) -> Result<()> {
        tracing::debug!(id = request.id, "queueing load request");
        self.requests
            .as_ref()
            .ok_or_else(|| anyhow!("loader is shut down"))?
            .send(request)
            .map_err(|_| anyhow!("loader thread exited"))
    }

    /// Next finished reply, if any.
    pub fn poll(&self) -> Result<Option<LoadReply>> {
        match self.replies.try_recv() {
            Ok(reply) => Ok(Some(reply)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(anyhow!("loader thread exited")),
        }
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        // Closing the channel ends the worker's receive loop.
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("loader thread panicked");
            }
        }
    }
}

fn execute(service: &ReviewService, request: LoadRequest) -> LoadReply {
    let result = match request.query {
        Query::Browse {
            filters,
            page,
            page_size,
        } => service
            .browse(Some(&filters), page, page_size)
            .map(Loaded::Page),
        Query::Search { keywords } => service.search(&keywords).map(Loaded::Search),
    };
    if let Err(e) = &result {
        tracing::warn!(id = request.id, error = %e, "load failed");
    }
    LoadReply {
        id: request.id,
        result: result.map_err(|e| e.to_string()),
    }
}
