use {
    teloxide::{
        ApiError, RequestError,
        payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters, SendMessageSetters},
        prelude::*,
        types::{CallbackQuery, ChatId, MessageId, ReplyParameters},
    },
    tracing::{debug, info, warn},
};

use fanout_broadcast::{Action, ActionReply, actions};

use crate::{
    access::AccessDenied, keyboard::selection_keyboard, outbound::StagedMessage, state::BotState,
};

pub const UNAUTHORIZED_TEXT: &str = "🚫 You are not authorized to use this bot.";
pub const UNAUTHORIZED_CALLBACK_TEXT: &str = "Not authorized";
pub const WELCOME_TEXT: &str =
    "✅ Welcome!\nForward messages to me.\nThen use the buttons to select channels and post.";
pub const STAGED_TEXT: &str = "📥 Message saved.\nClick below to select channels and post:";

/// Handle a single inbound Telegram message (called from the polling loop).
///
/// `/start` greets the operator; any other non-command message is staged for
/// broadcast and answered with the selection keyboard.
pub async fn handle_message_direct(msg: Message, state: &BotState) -> anyhow::Result<()> {
    let caller = msg.from.as_ref().map(|u| u.id);
    let operator = match state.gate.check_access(caller) {
        Ok(id) => id,
        Err(reason) => {
            warn!(
                chat_id = msg.chat.id.0,
                user_id = ?caller.map(|u| u.0),
                %reason,
                "rejected telegram message"
            );
            if reason == AccessDenied::NotOperator {
                state
                    .bot
                    .send_message(msg.chat.id, UNAUTHORIZED_TEXT)
                    .reply_parameters(ReplyParameters::new(msg.id))
                    .await?;
            }
            return Ok(());
        },
    };

    let session = state.sessions.session(operator.0);

    if let Some(command) = msg.text().and_then(parse_command) {
        match command {
            "start" => {
                state.bot.send_message(msg.chat.id, WELCOME_TEXT).await?;
            },
            other => debug!(command = other, "ignoring unknown command"),
        }
        return Ok(());
    }

    let staged = session.stage(StagedMessage::from(&msg)).await;
    info!(
        operator = operator.0,
        message_id = msg.id.0,
        staged,
        "staged message for broadcast"
    );

    let view = actions::selection(&session).await;
    state
        .bot
        .send_message(msg.chat.id, STAGED_TEXT)
        .reply_parameters(ReplyParameters::new(msg.id))
        .reply_markup(selection_keyboard(&view))
        .await?;
    Ok(())
}

/// Handle a Telegram callback query (inline keyboard button press).
pub async fn handle_callback_query(query: CallbackQuery, state: &BotState) -> anyhow::Result<()> {
    if let Err(reason) = state.gate.check_access(Some(query.from.id)) {
        warn!(user_id = query.from.id.0, %reason, "rejected telegram callback query");
        state
            .bot
            .answer_callback_query(&query.id)
            .text(UNAUTHORIZED_CALLBACK_TEXT)
            .await?;
        return Ok(());
    }

    // Answer the callback to dismiss the loading spinner.
    state.bot.answer_callback_query(&query.id).await?;

    let Some(action) = query.data.as_deref().and_then(Action::parse) else {
        debug!(callback_data = ?query.data, "ignoring unknown callback data");
        return Ok(());
    };
    let Some((chat_id, message_id)) = query.message.as_ref().map(|m| (m.chat().id, m.id())) else {
        debug!(?action, "callback query has no message to edit");
        return Ok(());
    };

    let session = state.sessions.session(query.from.id.0);
    let reply =
        match actions::apply(action, &session, &state.dispatcher, state.sender.as_ref()).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(?action, error = %e, "ignoring invalid broadcast action");
                return Ok(());
            },
        };

    edit_with_reply(state, chat_id, message_id, &reply).await
}

/// Replace the keyboard message with the action's status text.
async fn edit_with_reply(
    state: &BotState,
    chat_id: ChatId,
    message_id: MessageId,
    reply: &ActionReply,
) -> anyhow::Result<()> {
    let mut request = state.bot.edit_message_text(chat_id, message_id, &reply.text);
    if let Some(view) = &reply.selection {
        request = request.reply_markup(selection_keyboard(view));
    }
    match request.await {
        Ok(_) => Ok(()),
        // Pressing "Select All" twice produces an identical message.
        Err(RequestError::Api(ApiError::MessageNotModified)) => {
            debug!(chat_id = chat_id.0, "selection message unchanged");
            Ok(())
        },
        Err(e) => Err(e.into()),
    }
}

/// Command name of a `/command[@bot] args` message.
fn parse_command(text: &str) -> Option<&str> {
    let head = text.strip_prefix('/')?.split_whitespace().next()?;
    Some(head.split_once('@').map_or(head, |(name, _)| name))
}
