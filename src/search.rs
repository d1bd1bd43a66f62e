//! Search operations and result streams.

use std::{
    collections::VecDeque,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    task::{Context, Poll},
};

use futures::{future::BoxFuture, Future, Stream, TryStreamExt};
use parking_lot::RwLock;
use rasn_ldap::{Controls, LdapMessage, ProtocolOp, ResultCode, SearchResultDone};

use crate::{
    client::{LdapClient, Result},
    conn::MessageStream,
    controls::SimplePagedResultsControl,
    error::Error,
    model::SearchEntry,
    request::SearchRequest,
};

impl LdapClient {
    /// Perform a search without paging. Returns a stream of entries.
    pub async fn search(&mut self, request: SearchRequest) -> Result<SearchEntries> {
        let id = self.new_id();

        let msg = LdapMessage::new(id, ProtocolOp::SearchRequest(request.into()));
        let stream = self.connection.send_recv_stream(msg).await?;

        Ok(SearchEntries {
            inner: stream,
            page_control: None,
            page_finished: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Perform a search and return its first entry, if any.
    pub async fn search_one(&mut self, request: SearchRequest) -> Result<Option<SearchEntry>> {
        let entries = self.search(request).await?;
        let mut entries = entries.try_collect::<VecDeque<_>>().await?;
        Ok(entries.pop_front())
    }

    /// Perform a paged search. Returns a stream of pages, each of which is
    /// itself a stream of entries. Every page carries the cookie returned by
    /// the server for the previous one, until the server signals completion
    /// with an empty cookie.
    pub fn search_paged(&mut self, request: SearchRequest, page_size: u32) -> Pages {
        Pages {
            page_control: Arc::new(RwLock::new(SimplePagedResultsControl::new(page_size))),
            page_finished: Arc::new(AtomicBool::new(true)),
            client: self.clone(),
            request,
            page_size,
            inner: None,
        }
    }
}

/// A stream of [`SearchEntry`] items from one search operation.
///
/// Referral messages are skipped. A failed `SearchResultDone` surfaces as
/// [`Error::OperationFailed`], the end of a successful search as the end of
/// the stream.
pub struct SearchEntries {
    inner: MessageStream,
    page_control: Option<Arc<RwLock<SimplePagedResultsControl>>>,
    page_finished: Arc<AtomicBool>,
}

impl SearchEntries {
    fn search_done(
        self: Pin<&mut Self>,
        controls: Option<Controls>,
        done: SearchResultDone,
    ) -> Poll<Option<Result<SearchEntry>>> {
        self.page_finished.store(true, Ordering::SeqCst);

        if done.0.result_code != ResultCode::Success {
            return Poll::Ready(Some(Err(Error::OperationFailed(done.0.into()))));
        }

        let Some(ref control_ref) = self.page_control else {
            return Poll::Ready(None);
        };

        // a paged search must return the control on every result
        let page_control = controls.and_then(|controls| {
            controls
                .into_iter()
                .find(|c| c.control_type == SimplePagedResultsControl::OID)
                .and_then(|c| SimplePagedResultsControl::try_from(c).ok())
        });

        match page_control {
            Some(page_control) => {
                *control_ref.write() = page_control;
                Poll::Ready(None)
            }
            None => Poll::Ready(Some(Err(Error::InvalidResponse))),
        }
    }
}

impl Stream for SearchEntries {
    type Item = Result<SearchEntry>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            return match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(None) => Poll::Ready(Some(Err(Error::ConnectionClosed))),
                Poll::Ready(Some(msg)) => match msg.protocol_op {
                    ProtocolOp::SearchResEntry(entry) => Poll::Ready(Some(Ok(entry.into()))),
                    ProtocolOp::SearchResRef(_) => continue,
                    ProtocolOp::SearchResDone(done) => {
                        self.as_mut().search_done(msg.controls, done)
                    }
                    _ => Poll::Ready(Some(Err(Error::InvalidResponse))),
                },
            };
        }
    }
}

/// A stream of result pages from a paged search.
///
/// Each item is a [`SearchEntries`] stream for one page. The previous page
/// must be drained before the next one is requested, since the continuation
/// cookie only becomes known when the page's final message arrives.
pub struct Pages {
    page_control: Arc<RwLock<SimplePagedResultsControl>>,
    page_finished: Arc<AtomicBool>,
    client: LdapClient,
    request: SearchRequest,
    page_size: u32,
    inner: Option<BoxFuture<'static, Result<SearchEntries>>>,
}

impl Pages {
    fn is_page_finished(&self) -> bool {
        self.page_finished.load(Ordering::SeqCst)
    }
}

impl Stream for Pages {
    type Item = Result<SearchEntries>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if !self.page_control.read().has_entries() {
            return Poll::Ready(None);
        }

        if self.inner.is_none() {
            if !self.is_page_finished() {
                return Poll::Ready(None);
            }

            let mut client = self.client.clone();
            let request = self.request.clone();
            let control_ref = self.page_control.clone();
            let page_size = self.page_size;
            let page_finished = self.page_finished.clone();

            self.page_finished.store(false, Ordering::SeqCst);

            let fut = async move {
                let id = client.new_id();

                let control = control_ref.read().clone().with_size(page_size);
                let mut msg =
                    LdapMessage::new(id, ProtocolOp::SearchRequest(request.into()));
                msg.controls = Some(vec![control.try_into()?]);

                let stream = client.connection.send_recv_stream(msg).await?;
                Ok(SearchEntries {
                    inner: stream,
                    page_control: Some(control_ref),
                    page_finished,
                })
            };
            self.inner = Some(Box::pin(fut));
        }

        let fut = self.inner.as_mut().expect("pending page future");
        match Pin::new(fut).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(err)) => {
                self.inner = None;
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(Ok(entries)) => {
                self.inner = None;
                Poll::Ready(Some(Ok(entries)))
            }
        }
    }
}
