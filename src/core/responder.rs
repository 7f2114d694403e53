//! Message responder - Entry point for every inbound message.
//!
//! Operator messages that look like commands go to the interpreter and the
//! reply is sent back to the same conversation. Everything else is run
//! through the policy evaluator; when it says "send", the reply goes out
//! through the gateway and is recorded in the ledger only once delivery
//! succeeded, so a failed send can be retried on the next message.
//!
//! Gateway events are dispatched concurrently, so the decide, send and record
//! steps for one conversation run under a per-conversation lock. Different
//! conversations proceed in parallel.

use crate::{
    core::{
        commands::CommandInterpreter,
        context::AppContext,
        gateway::IncomingMessage,
        ledger,
        policy::{self, Decision, SuppressReason},
        settings::ConversationKind,
    },
    errors::Result,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

type ConversationLocks = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// An operator command was executed and `reply` was sent back
    Command {
        /// Interpreter reply
        reply: String,
    },
    /// An automatic reply was delivered and recorded
    Replied {
        /// Reply body
        message: String,
    },
    /// The policy decided to stay silent
    Suppressed(SuppressReason),
    /// The policy wanted to reply but the gateway did not confirm delivery
    SendFailed,
}

/// Routes inbound messages to the interpreter or the policy evaluator.
#[derive(Clone)]
pub struct Responder {
    context: AppContext,
    interpreter: CommandInterpreter,
    conversation_locks: ConversationLocks,
}

impl Responder {
    /// Creates a responder over the given context.
    #[must_use]
    pub fn new(context: AppContext) -> Self {
        let interpreter =
            CommandInterpreter::new(context.store.clone(), Arc::clone(&context.scheduler));
        Self {
            context,
            interpreter,
            conversation_locks: Arc::default(),
        }
    }

    /// The interpreter used for operator commands.
    #[must_use]
    pub const fn interpreter(&self) -> &CommandInterpreter {
        &self.interpreter
    }

    /// Handles one inbound message.
    ///
    /// # Errors
    /// Fails only when the store cannot be read or written. Gateway failures
    /// are reported as [`MessageOutcome::SendFailed`].
    pub async fn handle_message(&self, message: &IncomingMessage) -> Result<MessageOutcome> {
        if is_operator_command(message) {
            let reply = self.interpreter.interpret(&message.text).await;
            self.context
                .gateway
                .send_message(&message.conversation_id, &reply)
                .await?;
            return Ok(MessageOutcome::Command { reply });
        }

        let lock = self.conversation_lock(&message.conversation_id);
        let outcome = {
            let _guard = lock.lock().await;
            self.auto_reply(message).await
        };
        self.release_conversation_lock(&message.conversation_id, &lock);
        outcome
    }

    async fn auto_reply(&self, message: &IncomingMessage) -> Result<MessageOutcome> {
        let decision = policy::decide(
            self.context.database(),
            &message.conversation_id,
            message.sender_is_self,
            message.kind,
            message.timestamp,
        )
        .await?;

        let reply = match decision {
            Decision::Send { message } => message,
            Decision::Suppress(reason) => {
                debug!(
                    conversation = %message.conversation_id,
                    "Auto-reply suppressed: {:?}", reason
                );
                return Ok(MessageOutcome::Suppressed(reason));
            }
        };

        if let Err(e) = self
            .context
            .gateway
            .send_message(&message.conversation_id, &reply)
            .await
        {
            warn!(
                conversation = %message.conversation_id,
                "Auto-reply was not delivered: {}", e
            );
            return Ok(MessageOutcome::SendFailed);
        }

        ledger::record_send(
            self.context.database(),
            &message.conversation_id,
            message.timestamp,
        )
        .await?;
        info!(conversation = %message.conversation_id, "Auto-reply sent");
        Ok(MessageOutcome::Replied { message: reply })
    }

    fn conversation_lock(&self, conversation_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .conversation_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(conversation_id.to_string()).or_default())
    }

    /// Drops the map entry once no other task holds or waits on it.
    fn release_conversation_lock(&self, conversation_id: &str, lock: &Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self
            .conversation_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(lock) == 2 {
            locks.remove(conversation_id);
        }
    }
}

/// Commands are only taken from the operator, in a personal conversation,
/// and must start with `/`.
fn is_operator_command(message: &IncomingMessage) -> bool {
    message.sender_is_self
        && message.kind == ConversationKind::Personal
        && message.text.trim_start().starts_with('/')
}
