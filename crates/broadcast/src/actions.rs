//! Operator actions coming from the selection UI.

use tracing::debug;

use crate::{
    dispatch::{DispatchOutcome, Dispatcher, MessageSender},
    error::Result,
    render::{self, ALL_SELECTED_TEXT, ALL_UNSELECTED_TEXT, SelectionView},
    session::SessionHandle,
};

const TOGGLE_PREFIX: &str = "toggle:";
const SELECT_ALL: &str = "select_all";
const UNSELECT_ALL: &str = "unselect_all";
const DISPATCH_NOW: &str = "post_now";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Toggle the channel at this 1-based position.
    Toggle(usize),
    SelectAll,
    UnselectAll,
    DispatchNow,
}

impl Action {
    /// Encoding used as inline button callback data.
    pub fn callback_data(&self) -> String {
        match self {
            Self::Toggle(position) => format!("{TOGGLE_PREFIX}{position}"),
            Self::SelectAll => SELECT_ALL.to_string(),
            Self::UnselectAll => UNSELECT_ALL.to_string(),
            Self::DispatchNow => DISPATCH_NOW.to_string(),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        match data {
            SELECT_ALL => Some(Self::SelectAll),
            UNSELECT_ALL => Some(Self::UnselectAll),
            DISPATCH_NOW => Some(Self::DispatchNow),
            _ => data
                .strip_prefix(TOGGLE_PREFIX)
                .and_then(|n| n.parse().ok())
                .map(Self::Toggle),
        }
    }

    /// Fixed label for the non-toggle actions.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Toggle(_) => "Channel",
            Self::SelectAll => "✅ Select All",
            Self::UnselectAll => "❌ Unselect All",
            Self::DispatchNow => "🚀 POST",
        }
    }
}

/// What the operator sees after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReply {
    pub text: String,
    /// Selection to show underneath `text`; `None` once a dispatch completed.
    pub selection: Option<SelectionView>,
    pub outcome: Option<DispatchOutcome>,
}

/// Apply `action` to `session`.
///
/// An unknown toggle position is returned as `Error::InvalidChannel` with the
/// session unchanged.
pub async fn apply<M>(
    action: Action,
    session: &SessionHandle<M>,
    dispatcher: &Dispatcher,
    sender: &dyn MessageSender<M>,
) -> Result<ActionReply>
where
    M: Clone + Send + Sync,
{
    debug!(?action, "applying broadcast action");
    let text = match action {
        Action::Toggle(position) => {
            session.toggle_position(position).await?;
            None
        },
        Action::SelectAll => {
            session.select_all().await;
            Some(ALL_SELECTED_TEXT.to_string())
        },
        Action::UnselectAll => {
            session.unselect_all().await;
            Some(ALL_UNSELECTED_TEXT.to_string())
        },
        Action::DispatchNow => {
            let outcome = dispatcher.dispatch(session, sender).await;
            return Ok(reply_for_outcome(outcome, session).await);
        },
    };

    let view = selection(session).await;
    Ok(ActionReply {
        text: text.unwrap_or_else(|| view.status_text()),
        selection: Some(view),
        outcome: None,
    })
}

async fn reply_for_outcome<M: Clone>(
    outcome: DispatchOutcome,
    session: &SessionHandle<M>,
) -> ActionReply {
    let selection = if outcome.is_completed() {
        None
    } else {
        Some(selection(session).await)
    };
    ActionReply {
        text: outcome.to_string(),
        selection,
        outcome: Some(outcome),
    }
}

/// Current selection view of `session`.
pub async fn selection<M: Clone>(session: &SessionHandle<M>) -> SelectionView {
    let session = session.read().await;
    render::render(&session.snapshot(), session.channels())
}
