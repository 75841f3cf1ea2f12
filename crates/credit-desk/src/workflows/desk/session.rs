use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::catalog::ApplicationCatalog;
use super::controller::{Intent, Listener, SubscriptionId, WorkflowController};
use super::domain::{DecisionAction, FileDescriptor, WorkflowError};
use super::settings::DeskSettings;
use super::view::{DeskEvent, DeskView};
use crate::workflows::progress::{RunHandle, TokioTicker};

/// Everything the session loop consumes: intents from handles and ticks from run timers.
pub enum SessionEvent {
    Intent {
        intent: Intent,
        reply: oneshot::Sender<Result<DeskView, WorkflowError>>,
    },
    View {
        reply: oneshot::Sender<DeskView>,
    },
    Subscribe {
        listener: Listener,
        reply: oneshot::Sender<SubscriptionId>,
    },
    Unsubscribe {
        id: SubscriptionId,
        reply: oneshot::Sender<bool>,
    },
    Tick(RunHandle),
}

impl From<RunHandle> for SessionEvent {
    fn from(run: RunHandle) -> Self {
        SessionEvent::Tick(run)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("desk session has shut down")]
    Closed,
}

/// Single-owner event loop around a [`WorkflowController`] driven by wall-clock ticks.
///
/// Intents and ticks share one queue, so they are applied strictly in arrival order.
pub struct DeskSession {
    controller: WorkflowController<TokioTicker<SessionEvent>>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl DeskSession {
    pub fn new(catalog: ApplicationCatalog, settings: DeskSettings) -> (Self, DeskHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ticker = TokioTicker::new(&tx);
        let session = Self {
            controller: WorkflowController::new(catalog, settings, ticker),
            events: rx,
        };
        (session, DeskHandle { tx })
    }

    /// Spawn the loop on the current runtime.
    pub fn spawn(catalog: ApplicationCatalog, settings: DeskSettings) -> (DeskHandle, JoinHandle<()>) {
        let (session, handle) = Self::new(catalog, settings);
        (handle, tokio::spawn(session.run()))
    }

    pub fn controller_mut(&mut self) -> &mut WorkflowController<TokioTicker<SessionEvent>> {
        &mut self.controller
    }

    /// Runs until every [`DeskHandle`] has been dropped.
    pub async fn run(mut self) {
        info!("desk session started");
        while let Some(event) = self.events.recv().await {
            self.handle(event);
        }
        info!("desk session closed");
    }

    fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Intent { intent, reply } => {
                let result = self.controller.dispatch(intent);
                if reply.send(result).is_err() {
                    debug!("intent caller went away before the reply");
                }
            }
            SessionEvent::View { reply } => {
                let _ = reply.send(self.controller.view());
            }
            SessionEvent::Subscribe { listener, reply } => {
                let id = self.controller.subscribe(listener);
                let _ = reply.send(id);
            }
            SessionEvent::Unsubscribe { id, reply } => {
                let _ = reply.send(self.controller.unsubscribe(id));
            }
            SessionEvent::Tick(run) => {
                self.controller.on_tick(run);
            }
        }
    }
}

/// Cloneable client for a running [`DeskSession`].
#[derive(Clone)]
pub struct DeskHandle {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl DeskHandle {
    pub async fn submit(&self, intent: Intent) -> Result<DeskView, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionEvent::Intent { intent, reply })?;
        let result = rx.await.map_err(|_| SessionError::Closed)?;
        Ok(result?)
    }

    pub async fn view(&self) -> Result<DeskView, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionEvent::View { reply })?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn subscribe(
        &self,
        listener: impl Fn(&DeskEvent) + Send + 'static,
    ) -> Result<SubscriptionId, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionEvent::Subscribe {
            listener: Box::new(listener),
            reply,
        })?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<bool, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionEvent::Unsubscribe { id, reply })?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Subscribe with a listener that forwards every event into a channel.
    pub async fn events(
        &self,
    ) -> Result<(SubscriptionId, mpsc::UnboundedReceiver<DeskEvent>), SessionError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self
            .subscribe(move |event: &DeskEvent| {
                let _ = tx.send(event.clone());
            })
            .await?;
        Ok((id, rx))
    }

    pub async fn open_application(&self, id: &str) -> Result<DeskView, SessionError> {
        self.submit(Intent::OpenApplication(id.to_owned())).await
    }

    pub async fn start_upload(&self, files: Vec<FileDescriptor>) -> Result<DeskView, SessionError> {
        self.submit(Intent::StartUpload(files)).await
    }

    pub async fn check_document(&self, id: &str, checked: bool) -> Result<DeskView, SessionError> {
        self.submit(Intent::CheckDocument {
            id: id.to_owned(),
            checked,
        })
        .await
    }

    pub async fn start_memo_generation(&self) -> Result<DeskView, SessionError> {
        self.submit(Intent::StartMemoGeneration).await
    }

    pub async fn decide(&self, decision: DecisionAction) -> Result<DeskView, SessionError> {
        self.submit(Intent::Decide(decision)).await
    }

    fn send(&self, event: SessionEvent) -> Result<(), SessionError> {
        self.tx.send(event).map_err(|_| SessionError::Closed)
    }
}
