//! Entry state machine for chained two-operand arithmetic.
//!
//! `EntryState` holds what the keypad has typed so far; `Machine` owns it
//! together with the history log and the ledger of requests sent to the
//! evaluator. Keystrokes are synchronous transitions. Anything needing
//! arithmetic comes back as a `PendingRequest` that the caller runs and
//! later hands to [`Machine::resolve`].

use crate::core::history::HistoryLog;
use crate::core::keymap::Key;
use crate::core::number::{format_number, parse_operand};
use crate::domain::model::{EvalRequest, OperatorKind};
use crate::domain::ports::ResponsePolicy;
use crate::utils::error::{CalcError, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    /// Typing the left operand. Also the initial and cleared state (`"0"`).
    EnteringFirst { text: String },
    /// A result is on display and nothing is pending; the next digit starts over.
    Idle { text: String },
    /// An operator was chosen; the display still shows `text` until a digit arrives.
    OperatorChosen {
        operand: String,
        operator: OperatorKind,
        text: String,
    },
    /// Typing the right operand.
    EnteringSecond {
        operand: String,
        operator: OperatorKind,
        text: String,
    },
}

impl Default for EntryState {
    fn default() -> Self {
        EntryState::EnteringFirst {
            text: "0".to_string(),
        }
    }
}

fn append_digit(mut text: String, digit: char) -> String {
    if text == "0" {
        return digit.to_string();
    }
    text.push(digit);
    text
}

fn append_point(mut text: String) -> String {
    if !text.contains('.') {
        text.push('.');
    }
    text
}

impl EntryState {
    pub fn text(&self) -> &str {
        match self {
            EntryState::EnteringFirst { text }
            | EntryState::Idle { text }
            | EntryState::OperatorChosen { text, .. }
            | EntryState::EnteringSecond { text, .. } => text,
        }
    }

    pub fn pending_operand(&self) -> Option<&str> {
        match self {
            EntryState::OperatorChosen { operand, .. }
            | EntryState::EnteringSecond { operand, .. } => Some(operand),
            _ => None,
        }
    }

    pub fn pending_operator(&self) -> Option<OperatorKind> {
        match self {
            EntryState::OperatorChosen { operator, .. }
            | EntryState::EnteringSecond { operator, .. } => Some(*operator),
            _ => None,
        }
    }

    /// True when the next digit replaces the display instead of extending it.
    pub fn awaiting_fresh_entry(&self) -> bool {
        matches!(
            self,
            EntryState::Idle { .. } | EntryState::OperatorChosen { .. }
        )
    }

    pub fn on_digit(self, digit: char) -> Self {
        if !digit.is_ascii_digit() {
            return self;
        }
        match self {
            EntryState::Idle { .. } => EntryState::EnteringFirst {
                text: digit.to_string(),
            },
            EntryState::EnteringFirst { text } => EntryState::EnteringFirst {
                text: append_digit(text, digit),
            },
            EntryState::OperatorChosen {
                operand, operator, ..
            } => EntryState::EnteringSecond {
                operand,
                operator,
                text: digit.to_string(),
            },
            EntryState::EnteringSecond {
                operand,
                operator,
                text,
            } => EntryState::EnteringSecond {
                operand,
                operator,
                text: append_digit(text, digit),
            },
        }
    }

    pub fn on_decimal_point(self) -> Self {
        match self {
            EntryState::Idle { .. } => EntryState::EnteringFirst {
                text: "0.".to_string(),
            },
            EntryState::EnteringFirst { text } => EntryState::EnteringFirst {
                text: append_point(text),
            },
            EntryState::OperatorChosen {
                operand, operator, ..
            } => EntryState::EnteringSecond {
                operand,
                operator,
                text: "0.".to_string(),
            },
            EntryState::EnteringSecond {
                operand,
                operator,
                text,
            } => EntryState::EnteringSecond {
                operand,
                operator,
                text: append_point(text),
            },
        }
    }

    /// Captures the display as the left operand. When a right operand was
    /// being typed, the previous operation is returned so it can be resolved
    /// first.
    pub fn on_operator(self, op: OperatorKind) -> (Self, Option<(OperatorKind, f64, f64)>) {
        match self {
            EntryState::EnteringSecond {
                operand,
                operator,
                text,
            } => {
                let chained = (operator, parse_operand(&operand), parse_operand(&text));
                let next = EntryState::OperatorChosen {
                    operand: text.clone(),
                    operator: op,
                    text,
                };
                (next, Some(chained))
            }
            other => {
                let text = other.text().to_string();
                let next = EntryState::OperatorChosen {
                    operand: text.clone(),
                    operator: op,
                    text,
                };
                (next, None)
            }
        }
    }
}

/// An evaluator call the caller must run and feed back through `resolve`.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub seq: u64,
    pub request: EvalRequest,
}

#[derive(Debug, Clone)]
enum Ticket {
    Binary { op: OperatorKind, a: f64, b: f64 },
    Chained { op: OperatorKind, a: f64, b: f64 },
    Unary { name: String, a: f64 },
}

impl Ticket {
    fn request(&self) -> EvalRequest {
        match self {
            Ticket::Binary { op, a, b } | Ticket::Chained { op, a, b } => {
                EvalRequest::binary(*op, *a, *b)
            }
            Ticket::Unary { name, a } => EvalRequest::unary(name.clone(), *a),
        }
    }

    fn history_entry(&self, result: &str) -> String {
        match self {
            Ticket::Binary { op, a, b } | Ticket::Chained { op, a, b } => format!(
                "{} {} {} = {}",
                format_number(*a),
                op,
                format_number(*b),
                result
            ),
            Ticket::Unary { name, a } => format!("{}({}) = {}", name, format_number(*a), result),
        }
    }
}

#[derive(Debug)]
struct Issued {
    ticket: Ticket,
    clears_seen: u64,
}

/// What happened when a response was handed back.
#[derive(Debug)]
pub enum Resolution {
    /// Result committed; carries the new history entry.
    Committed { entry: String },
    /// The call failed; nothing changed.
    Failed(CalcError),
    /// Overtaken by a newer request or a clear and dropped.
    Discarded,
    /// No request with that sequence number is outstanding.
    Unknown,
}

#[derive(Debug)]
pub struct Machine {
    state: EntryState,
    history: HistoryLog,
    policy: ResponsePolicy,
    ledger: HashMap<u64, Issued>,
    last_seq: u64,
    clears: u64,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(HistoryLog::default(), ResponsePolicy::default())
    }
}

impl Machine {
    pub fn new(history: HistoryLog, policy: ResponsePolicy) -> Self {
        Self {
            state: EntryState::default(),
            history,
            policy,
            ledger: HashMap::new(),
            last_seq: 0,
            clears: 0,
        }
    }

    pub fn state(&self) -> &EntryState {
        &self.state
    }

    pub fn display(&self) -> &str {
        self.state.text()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn policy(&self) -> ResponsePolicy {
        self.policy
    }

    /// At least one request has been issued and not resolved yet.
    pub fn awaiting_result(&self) -> bool {
        !self.ledger.is_empty()
    }

    pub fn press(&mut self, key: Key) -> Option<PendingRequest> {
        match key {
            Key::Digit(d) => {
                self.digit(d);
                None
            }
            Key::DecimalPoint => {
                self.decimal_point();
                None
            }
            Key::Operator(op) => self.operator(op),
            Key::Evaluate => self.evaluate(),
            Key::Clear => {
                self.clear();
                None
            }
        }
    }

    pub fn digit(&mut self, digit: char) {
        self.state = std::mem::take(&mut self.state).on_digit(digit);
    }

    pub fn decimal_point(&mut self) {
        self.state = std::mem::take(&mut self.state).on_decimal_point();
    }

    pub fn operator(&mut self, op: OperatorKind) -> Option<PendingRequest> {
        let (next, chained) = std::mem::take(&mut self.state).on_operator(op);
        self.state = next;
        chained.map(|(prev, a, b)| {
            tracing::debug!("Resolving {} {} {} before {}", a, prev, b, op);
            self.issue(Ticket::Chained { op: prev, a, b })
        })
    }

    /// Resolves the pending binary operation. No-op without one.
    pub fn evaluate(&mut self) -> Option<PendingRequest> {
        let (op, operand) = match &self.state {
            EntryState::OperatorChosen {
                operand, operator, ..
            }
            | EntryState::EnteringSecond {
                operand, operator, ..
            } => (*operator, operand.as_str()),
            _ => return None,
        };
        if operand.is_empty() {
            return None;
        }
        let a = parse_operand(operand);
        let b = parse_operand(self.state.text());
        Some(self.issue(Ticket::Binary { op, a, b }))
    }

    pub fn unary_function(&mut self, name: &str) -> PendingRequest {
        let a = parse_operand(self.state.text());
        self.issue(Ticket::Unary {
            name: name.to_string(),
            a,
        })
    }

    /// Back to `"0"` with nothing pending. In-flight requests are not cancelled.
    pub fn clear(&mut self) {
        self.state = EntryState::default();
        self.clears += 1;
    }

    fn issue(&mut self, ticket: Ticket) -> PendingRequest {
        self.last_seq += 1;
        let seq = self.last_seq;
        let request = ticket.request();
        self.ledger.insert(
            seq,
            Issued {
                ticket,
                clears_seen: self.clears,
            },
        );
        PendingRequest { seq, request }
    }

    pub fn resolve(&mut self, seq: u64, outcome: Result<f64>) -> Resolution {
        let Some(issued) = self.ledger.remove(&seq) else {
            tracing::debug!("Ignoring response for unknown request #{}", seq);
            return Resolution::Unknown;
        };

        if self.policy == ResponsePolicy::DiscardStale
            && (seq < self.last_seq || issued.clears_seen < self.clears)
        {
            tracing::debug!("Discarding stale response for request #{}", seq);
            return Resolution::Discarded;
        }

        let value = match outcome {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Request #{} failed: {}", seq, e);
                return Resolution::Failed(e);
            }
        };

        // A chained answer issued before a clear no longer belongs to the
        // pending operation; it commits like a plain evaluate.
        let cleared_since = issued.clears_seen < self.clears;
        let result = format_number(value);
        let entry = issued.ticket.history_entry(&result);
        self.state = match (issued.ticket, std::mem::take(&mut self.state)) {
            (Ticket::Binary { .. }, _) => EntryState::Idle { text: result },
            (Ticket::Chained { .. }, _) if cleared_since => EntryState::Idle { text: result },
            (Ticket::Chained { .. }, EntryState::OperatorChosen { operator, .. }) => {
                EntryState::OperatorChosen {
                    operand: result.clone(),
                    operator,
                    text: result,
                }
            }
            (Ticket::Chained { .. }, EntryState::EnteringSecond { operator, text, .. }) => {
                EntryState::EnteringSecond {
                    operand: result,
                    operator,
                    text,
                }
            }
            (Ticket::Chained { .. }, _) => EntryState::Idle { text: result },
            (
                Ticket::Unary { .. },
                EntryState::OperatorChosen {
                    operand, operator, ..
                }
                | EntryState::EnteringSecond {
                    operand, operator, ..
                },
            ) => EntryState::OperatorChosen {
                operand,
                operator,
                text: result,
            },
            (Ticket::Unary { .. }, _) => EntryState::Idle { text: result },
        };
        self.history.push(entry.clone());
        tracing::debug!("Committed request #{}: {}", seq, entry);
        Resolution::Committed { entry }
    }
}
