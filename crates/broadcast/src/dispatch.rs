//! Dispatch Engine: copies every staged message to every selected channel.

use std::{fmt, num::NonZeroUsize};

use {
    async_trait::async_trait,
    futures::{StreamExt, future, stream},
    tracing::{info, warn},
};

use crate::{channel::ChannelId, session::SessionHandle};

/// Most failure entries shown verbatim in a dispatch status.
pub const MAX_REPORTED_FAILURES: usize = 5;

/// Transport capability: copy one staged message to one channel.
///
/// Every failure mode must surface as `Err`; its display text is reported to
/// the operator verbatim.
#[async_trait]
pub trait MessageSender<M>: Send + Sync {
    async fn send(&self, message: &M, channel: ChannelId) -> anyhow::Result<()>;
}

/// A single failed `(message, channel)` send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFailure {
    pub channel: ChannelId,
    /// 1-based position of `channel` in the channel list.
    pub position: usize,
    /// Index of the message in the staged sequence.
    pub message_index: usize,
    pub detail: String,
}

impl fmt::Display for SendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to post to Channel {}: {}",
            self.position, self.detail
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Nothing was sent and the session is unchanged.
    NoChannelsSelected,
    /// Nothing was sent and the session is unchanged.
    NoMessagesStaged,
    AllSucceeded { sent: usize },
    /// At least one send failed. Failures are in staged-outer,
    /// channel-inner order.
    PartialFailure {
        attempted: usize,
        failures: Vec<SendFailure>,
    },
}

impl DispatchOutcome {
    /// Whether sends were attempted (and the session therefore reset).
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::AllSucceeded { .. } | Self::PartialFailure { .. })
    }

    pub fn failures(&self) -> &[SendFailure] {
        match self {
            Self::PartialFailure { failures, .. } => failures,
            _ => &[],
        }
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChannelsSelected => write!(f, "⚠️ Please select at least one channel."),
            Self::NoMessagesStaged => write!(f, "⚠️ No messages to post."),
            Self::AllSucceeded { .. } => write!(f, "✅ All messages posted successfully!"),
            Self::PartialFailure { failures, .. } => {
                write!(f, "❌ Some messages failed to post:")?;
                for failure in failures.iter().take(MAX_REPORTED_FAILURES) {
                    write!(f, "\n{failure}")?;
                }
                let remaining = failures.len().saturating_sub(MAX_REPORTED_FAILURES);
                if remaining > 0 {
                    write!(f, "\n...and {remaining} more errors.")?;
                }
                Ok(())
            },
        }
    }
}

/// Executes the staged x selected cross product.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    concurrency: NonZeroUsize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::MIN,
        }
    }
}

impl Dispatcher {
    /// `concurrency` bounds how many sends are in flight at once; `1` sends
    /// strictly one after another.
    pub fn new(concurrency: NonZeroUsize) -> Self {
        Self { concurrency }
    }

    pub fn concurrency(&self) -> NonZeroUsize {
        self.concurrency
    }

    /// Send every staged message to every selected channel, then reset the
    /// session.
    ///
    /// The session is held exclusively for the whole call. Precondition
    /// failures return early without touching the session.
    pub async fn dispatch<M>(
        &self,
        session: &SessionHandle<M>,
        sender: &dyn MessageSender<M>,
    ) -> DispatchOutcome
    where
        M: Clone + Send + Sync,
    {
        let mut session = session.lock().await;

        if !session.has_selection() {
            return DispatchOutcome::NoChannelsSelected;
        }
        if session.staged().is_empty() {
            return DispatchOutcome::NoMessagesStaged;
        }

        let targets = session.selected_targets();
        let staged = session.staged();
        let attempted = staged.len() * targets.len();
        info!(
            staged = staged.len(),
            selected = targets.len(),
            concurrency = self.concurrency.get(),
            "dispatching broadcast"
        );

        // Owned index triples; the futures borrow `staged` only inside their body.
        let pairs: Vec<(usize, usize, ChannelId)> = (0..staged.len())
            .flat_map(|message_index| {
                targets
                    .iter()
                    .map(move |&(position, channel)| (message_index, position, channel))
            })
            .collect();

        let failures: Vec<SendFailure> = stream::iter(pairs)
            .map(|(message_index, position, channel)| async move {
                let message = &staged[message_index];
                match sender.send(message, channel).await {
                    Ok(()) => None,
                    Err(e) => {
                        warn!(%channel, position, message_index, error = %e, "broadcast send failed");
                        Some(SendFailure {
                            channel,
                            position,
                            message_index,
                            detail: e.to_string(),
                        })
                    },
                }
            })
            .buffered(self.concurrency.get())
            .filter_map(future::ready)
            .collect()
            .await;

        session.reset_after_dispatch();

        info!(attempted, failed = failures.len(), "broadcast dispatched");
        if failures.is_empty() {
            DispatchOutcome::AllSucceeded { sent: attempted }
        } else {
            DispatchOutcome::PartialFailure {
                attempted,
                failures,
            }
        }
    }
}
