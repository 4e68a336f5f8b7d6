//! Caller-paced pagination.
//!
//! # Design
//! `each_page` hands every page to a callback together with a `Next`
//! continuation. The following page is requested only after `Next::call`;
//! dropping `Next` ends the walk. The continuation is a oneshot sender, so it
//! can be kept and called later from another task while the walk waits.
//!
//! Every page request of one walk shares the originating request's
//! cancellation token: aborting the original stops the walk wherever it is.

use tokio::sync::oneshot;
use tracing::trace;

use crate::error::Result;
use crate::request::MapiRequest;
use crate::response::MapiResponse;

/// Continuation handed to an `each_page` callback.
#[derive(Debug)]
pub struct Next {
    resume: oneshot::Sender<()>,
}

impl Next {
    /// Request the next page.
    pub fn call(self) {
        let _ = self.resume.send(());
    }
}

impl<T> MapiRequest<T> {
    /// Walk the pages of a listing, one page per `Next::call`.
    ///
    /// The walk stops after the last page, after an error, when the callback
    /// drops `Next` without calling it, or when this request is aborted. Like
    /// `send`, this consumes the request's single use.
    pub async fn each_page<F>(&self, mut callback: F) -> Result<()>
    where
        F: FnMut(Result<MapiResponse<T>>, Next),
    {
        self.claim()?;
        let cancel = self.cancel_token().clone();
        let mut following: Option<MapiRequest<T>> = None;
        let mut page = 1usize;

        loop {
            let outcome = match &following {
                Some(request) => request.dispatch(&cancel).await,
                None => self.dispatch(&cancel).await,
            };
            let next_request = outcome.as_ref().ok().and_then(MapiResponse::next_page);
            let failed = outcome.is_err();

            let (resume, resumed) = oneshot::channel();
            callback(outcome, Next { resume });

            let Some(next_request) = next_request.filter(|_| !failed) else {
                trace!(request_id = %self.id(), page, "pagination finished");
                break;
            };

            let proceed = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                resumed = resumed => resumed.is_ok(),
            };
            if !proceed {
                trace!(request_id = %self.id(), page, "pagination stopped by caller");
                break;
            }

            page += 1;
            trace!(request_id = %self.id(), page, "fetching next page");
            following = Some(next_request);
        }

        self.settle();
        Ok(())
    }
}
