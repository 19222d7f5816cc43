use crate::core::entry::{Machine, PendingRequest, Resolution};
use crate::core::keymap::Key;
use crate::domain::model::OperatorKind;
use crate::domain::ports::Evaluator;
use crate::utils::error::{CalcError, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};

const COMMAND_BUFFER: usize = 64;

#[derive(Debug)]
pub enum Command {
    Key(Key),
    Function(String),
    Snapshot(oneshot::Sender<Snapshot>),
    Settle(oneshot::Sender<()>),
}

/// Outcomes the UI must show: committed history entries and surfaced errors.
#[derive(Debug)]
pub enum Notice {
    Committed { entry: String },
    Failed { error: CalcError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub display: String,
    pub pending_operand: Option<String>,
    pub pending_operator: Option<OperatorKind>,
    pub awaiting_fresh_entry: bool,
    pub awaiting_result: bool,
    pub history: Vec<String>,
}

impl Snapshot {
    fn of(machine: &Machine) -> Self {
        let state = machine.state();
        Self {
            display: state.text().to_string(),
            pending_operand: state.pending_operand().map(str::to_string),
            pending_operator: state.pending_operator(),
            awaiting_fresh_entry: state.awaiting_fresh_entry(),
            awaiting_result: machine.awaiting_result(),
            history: machine.history().texts(),
        }
    }
}

/// Cloneable input side of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    pub async fn press(&self, key: Key) -> Result<()> {
        self.send(Command::Key(key)).await
    }

    /// Presses every bound key in `keys`, in order, without waiting for results.
    pub async fn type_keys(&self, keys: &str) -> Result<()> {
        for key in keys.chars().filter_map(Key::from_char) {
            self.press(key).await?;
        }
        Ok(())
    }

    pub async fn apply_function(&self, name: &str) -> Result<()> {
        self.send(Command::Function(name.to_string())).await
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx)).await?;
        rx.await.map_err(|_| CalcError::SessionClosed)
    }

    /// Waits until every request issued so far has landed.
    pub async fn settle(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Settle(tx)).await?;
        rx.await.map_err(|_| CalcError::SessionClosed)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CalcError::SessionClosed)
    }
}

/// Sole owner of the [`Machine`]. Keystrokes and evaluator completions are
/// both processed on this one task, so they never interleave.
pub struct Session<E: Evaluator + 'static> {
    machine: Machine,
    evaluator: Arc<E>,
    commands: mpsc::Receiver<Command>,
    notices: mpsc::UnboundedSender<Notice>,
    in_flight: JoinSet<(u64, Result<f64>)>,
    settle_waiters: Vec<oneshot::Sender<()>>,
}

impl<E: Evaluator + 'static> Session<E> {
    pub fn spawn(
        evaluator: E,
        machine: Machine,
    ) -> (SessionHandle, mpsc::UnboundedReceiver<Notice>, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let session = Self {
            machine,
            evaluator: Arc::new(evaluator),
            commands: command_rx,
            notices: notice_tx,
            in_flight: JoinSet::new(),
            settle_waiters: Vec::new(),
        };
        let task = tokio::spawn(session.run());

        (
            SessionHandle {
                commands: command_tx,
            },
            notice_rx,
            task,
        )
    }

    async fn run(mut self) {
        tracing::debug!("Calculator session started");
        loop {
            tokio::select! {
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    self.on_completion(joined);
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }
            self.wake_settled();
        }

        // Nothing is cancelled: requests still in flight land before the task ends.
        while let Some(joined) = self.in_flight.join_next().await {
            self.on_completion(joined);
        }
        self.wake_settled();
        tracing::debug!("Calculator session stopped");
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Key(key) => {
                if let Some(pending) = self.machine.press(key) {
                    self.dispatch(pending);
                }
            }
            Command::Function(name) => {
                let pending = self.machine.unary_function(&name);
                self.dispatch(pending);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(Snapshot::of(&self.machine));
            }
            Command::Settle(reply) => self.settle_waiters.push(reply),
        }
    }

    fn dispatch(&mut self, pending: PendingRequest) {
        let PendingRequest { seq, request } = pending;
        tracing::debug!(
            "Request #{}: {} a={} b={:?}",
            seq,
            request.operation,
            request.a,
            request.b
        );
        let evaluator = Arc::clone(&self.evaluator);
        self.in_flight.spawn(async move {
            // The inner task absorbs evaluator panics so `seq` always comes back.
            let outcome = tokio::spawn(async move { evaluator.evaluate(&request).await })
                .await
                .unwrap_or_else(|e| Err(CalcError::from(e)));
            (seq, outcome)
        });
    }

    fn on_completion(&mut self, joined: std::result::Result<(u64, Result<f64>), tokio::task::JoinError>) {
        let (seq, outcome) = match joined {
            Ok(done) => done,
            Err(e) => {
                tracing::error!("Evaluator task aborted: {}", e);
                return;
            }
        };

        let notice = match self.machine.resolve(seq, outcome) {
            Resolution::Committed { entry } => Notice::Committed { entry },
            Resolution::Failed(error) => Notice::Failed { error },
            Resolution::Discarded | Resolution::Unknown => return,
        };
        // Nobody listening is fine; the state is still updated.
        let _ = self.notices.send(notice);
    }

    fn wake_settled(&mut self) {
        if self.in_flight.is_empty() {
            for waiter in self.settle_waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }
}
