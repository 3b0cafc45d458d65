use fieldline_core::api::{AppendEventRequest, AppendEventResponse, TimelineResponse};
use fieldline_core::model::TimelineEvent;
use reqwest::Client;
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("timeline request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("daemon rejected append for {request_id}")]
    Rejected { request_id: String },
}

/// Read/append boundary to the timeline backend. Reads that fail degrade to
/// "no events yet" at the call site; appends go through the outbox so they
/// are retried and never silently dropped.
pub trait TimelineGateway: Send + Sync + 'static {
    fn get_events(
        &self,
        request_id: &str,
    ) -> impl Future<Output = Result<Vec<TimelineEvent>, TransportError>> + Send;

    fn append_event(
        &self,
        request_id: &str,
        event: &TimelineEvent,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// HTTP gateway against the fieldline daemon.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn timeline_url(&self, request_id: &str) -> String {
        format!("{}/v1/requests/{}/timeline", self.base_url, request_id)
    }
}

impl TimelineGateway for HttpGateway {
    async fn get_events(&self, request_id: &str) -> Result<Vec<TimelineEvent>, TransportError> {
        let resp = self
            .client
            .get(self.timeline_url(request_id))
            .send()
            .await?
            .error_for_status()?
            .json::<TimelineResponse>()
            .await?;
        Ok(resp.events)
    }

    async fn append_event(
        &self,
        request_id: &str,
        event: &TimelineEvent,
    ) -> Result<(), TransportError> {
        let req = AppendEventRequest {
            event: event.clone(),
        };
        let resp = self
            .client
            .post(self.timeline_url(request_id))
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json::<AppendEventResponse>()
            .await?;
        if !resp.ok {
            return Err(TransportError::Rejected {
                request_id: request_id.to_string(),
            });
        }
        Ok(())
    }
}
