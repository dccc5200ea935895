// 9.5 service.rs: the engine as an actor. one tokio task owns the engine and applies requests
// one at a time in arrival order. callers hold a cloneable PoolHandle and await the reply on a
// oneshot channel. the task ends when every handle is dropped and gives the engine back.

use crate::api::{ApiError, ApiResponse, Command, Query};
use crate::engine::Engine;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("pool service is closed")]
    Closed,

    #[error(transparent)]
    Api(#[from] ApiError),
}

enum Request {
    Execute {
        command: Command,
        reply: oneshot::Sender<Result<ApiResponse, ApiError>>,
    },
    Query {
        query: Query,
        reply: oneshot::Sender<Result<ApiResponse, ApiError>>,
    },
}

#[derive(Debug, Clone)]
pub struct PoolHandle {
    tx: mpsc::Sender<Request>,
}

impl PoolHandle {
    pub async fn execute(&self, command: Command) -> Result<ApiResponse, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request::Execute { command, reply })
            .await
            .map_err(|_| ServiceError::Closed)?;
        Ok(rx.await.map_err(|_| ServiceError::Closed)??)
    }

    pub async fn query(&self, query: Query) -> Result<ApiResponse, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request::Query { query, reply })
            .await
            .map_err(|_| ServiceError::Closed)?;
        Ok(rx.await.map_err(|_| ServiceError::Closed)??)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Moves `engine` onto its own task. `capacity` bounds the request queue.
pub fn spawn(engine: Engine, capacity: usize) -> (PoolHandle, JoinHandle<Engine>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let task = tokio::spawn(run(engine, rx));
    (PoolHandle { tx }, task)
}

async fn run(mut engine: Engine, mut rx: mpsc::Receiver<Request>) -> Engine {
    info!(pool = %engine.pool_address(), symbol = engine.symbol(), "pool service started");
    let mut handled: u64 = 0;

    while let Some(request) = rx.recv().await {
        handled += 1;
        match request {
            Request::Execute { command, reply } => {
                let name = command.name();
                let result = engine.execute(command);
                debug!(command = name, ok = result.is_ok(), "executed");
                // the caller may have stopped waiting
                let _ = reply.send(result);
            }
            Request::Query { query, reply } => {
                let _ = reply.send(engine.query(query));
            }
        }
    }

    info!(handled, "pool service stopped");
    engine
}
