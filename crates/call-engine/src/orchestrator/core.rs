use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::command::{Command, Request, Response};
use crate::config::HotlineConfig;
use crate::error::{HotlineError, Result};
use crate::routing::{EngineSnapshot, RoutingEngine};
use crate::timer::{RingExpiry, TokioRingScheduler};

use super::events::{EngineRequest, Notification};

/// Handle to the engine task
///
/// Cheap to clone. The task owns the [`RoutingEngine`] outright and processes
/// commands and ring timer expiries one at a time. It stops once every handle
/// has been dropped.
#[derive(Debug, Clone)]
pub struct CallCenterEngine {
    requests: mpsc::Sender<EngineRequest>,
    notifications: broadcast::Sender<Notification>,
}

impl CallCenterEngine {
    /// Validate `config` and spawn the engine task on the current runtime
    pub fn start(config: &HotlineConfig) -> Result<Self> {
        config.validate()?;

        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        let engine = RoutingEngine::from_config(config, TokioRingScheduler::new(expiry_tx))?;

        let (request_tx, request_rx) = mpsc::channel(config.routing.command_channel_capacity);
        let (notification_tx, _) = broadcast::channel(config.routing.notification_capacity);

        tokio::spawn(run_engine(engine, request_rx, expiry_rx, notification_tx.clone()));
        info!(
            "✅ Call center engine started with {} operators",
            config.operators.count
        );

        Ok(Self {
            requests: request_tx,
            notifications: notification_tx,
        })
    }

    /// Run one command and return its result text
    pub async fn execute(&self, command: Command) -> Result<String> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(EngineRequest::Execute { command, reply })
            .await
            .map_err(|_| HotlineError::engine_unavailable("engine task has stopped"))?;

        response
            .await
            .map_err(|_| HotlineError::engine_unavailable("engine dropped the reply"))?
    }

    /// Decode a verb and textual id, then run the command
    pub async fn execute_raw(&self, verb: &str, id: Option<&str>) -> Result<String> {
        let command = Command::from_parts(verb, id)?;
        self.execute(command).await
    }

    /// Run a wire request, turning any command error into its message text
    pub async fn respond(&self, request: &Request) -> Response {
        let result = match Command::try_from(request) {
            Ok(command) => self.execute(command).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(message) => Response::new(message),
            Err(e) => {
                debug!("Command {:?} failed: {}", request.command, e);
                Response::new(e.to_string())
            }
        }
    }

    pub async fn snapshot(&self) -> Result<EngineSnapshot> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(EngineRequest::Snapshot { reply })
            .await
            .map_err(|_| HotlineError::engine_unavailable("engine task has stopped"))?;

        response
            .await
            .map_err(|_| HotlineError::engine_unavailable("engine dropped the reply"))
    }

    /// Receive ring timeout notifications from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn is_running(&self) -> bool {
        !self.requests.is_closed()
    }
}

async fn run_engine(
    mut engine: RoutingEngine<TokioRingScheduler>,
    mut requests: mpsc::Receiver<EngineRequest>,
    mut expiries: mpsc::UnboundedReceiver<RingExpiry>,
    notifications: broadcast::Sender<Notification>,
) {
    debug!("🔄 Engine task running");

    loop {
        tokio::select! {
            request = requests.recv() => match request {
                Some(request) => handle_request(&mut engine, request),
                None => break,
            },
            Some(expiry) = expiries.recv() => {
                if let Some(message) = engine.handle_expiry(&expiry) {
                    if notifications.send(Notification::new(message)).is_err() {
                        debug!("No subscribers for ring timeout notification of operator {}", expiry.operator);
                    }
                }
            }
        }
    }

    info!("🛑 Engine task stopped");
}

fn handle_request(engine: &mut RoutingEngine<TokioRingScheduler>, request: EngineRequest) {
    match request {
        EngineRequest::Execute { command, reply } => {
            debug!("📨 Executing {}", command);
            let result = engine.execute(&command);
            match &result {
                Err(e) if e.is_command_error() => debug!("Command {} rejected: {}", command, e),
                Err(e) => warn!("Command {} failed: {}", command, e),
                Ok(_) => {
                    let operators = engine.operators().stats();
                    debug!(
                        "📊 Operators: {} available, {} ringing, {} busy; {} waiting",
                        operators.available,
                        operators.ringing,
                        operators.busy,
                        engine.queue().len()
                    );
                }
            }
            if reply.send(result).is_err() {
                warn!("Caller went away before the result of {} was delivered", command);
            }
        }
        EngineRequest::Snapshot { reply } => {
            if reply.send(engine.snapshot()).is_err() {
                warn!("Caller went away before the snapshot was delivered");
            }
        }
    }
}
