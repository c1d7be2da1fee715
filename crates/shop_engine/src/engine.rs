use std::sync::{mpsc, Arc};
use std::thread;

use shop_logging::{shop_debug, shop_warn};

use crate::client::{ClientSettings, ForumClient, ReqwestForumClient};
use crate::{EngineEvent, FetchError, RequestId};

/// Receives engine completions. Called from runtime worker threads.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build http client: {0}")]
    Client(#[from] FetchError),
}

enum EngineCommand {
    Fetch {
        request: RequestId,
        url: String,
        token_field: String,
    },
    Submit {
        request: RequestId,
        url: String,
        fields: Vec<(String, String)>,
    },
}

/// Non-blocking front of the HTTP workflow: commands return immediately and
/// completions arrive through the [`EventSink`].
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(
        client: Arc<dyn ForumClient>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let client = client.clone();
                let sink = sink.clone();
                runtime.spawn(async move {
                    handle_command(client.as_ref(), command, sink.as_ref()).await;
                });
            }
            shop_debug!("Engine command channel closed");
        });

        Ok(Self { cmd_tx })
    }

    pub fn with_reqwest(
        settings: ClientSettings,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let client = ReqwestForumClient::new(settings)?;
        Self::new(Arc::new(client), sink)
    }

    pub fn fetch(
        &self,
        request: RequestId,
        url: impl Into<String>,
        token_field: impl Into<String>,
    ) {
        self.send(EngineCommand::Fetch {
            request,
            url: url.into(),
            token_field: token_field.into(),
        });
    }

    pub fn submit(
        &self,
        request: RequestId,
        url: impl Into<String>,
        fields: Vec<(String, String)>,
    ) {
        self.send(EngineCommand::Submit {
            request,
            url: url.into(),
            fields,
        });
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            shop_warn!("Engine thread is gone; command dropped");
        }
    }
}

async fn handle_command(client: &dyn ForumClient, command: EngineCommand, sink: &dyn EventSink) {
    match command {
        EngineCommand::Fetch {
            request,
            url,
            token_field,
        } => {
            let result = client.fetch_form(&url, &token_field).await;
            sink.emit(EngineEvent::PageFetched { request, result });
        }
        EngineCommand::Submit {
            request,
            url,
            fields,
        } => {
            let result = client.submit_form(&url, &fields).await;
            sink.emit(EngineEvent::FormSubmitted { request, result });
        }
    }
}
