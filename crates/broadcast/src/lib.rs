//! Broadcast session state machine.
//!
//! An operator stages forwarded messages into a [`session::Session`], picks a
//! subset of the fixed [`channel::ChannelList`], and the
//! [`dispatch::Dispatcher`] copies every staged message to every selected
//! channel. The transport is abstracted behind [`dispatch::MessageSender`].

pub mod actions;
pub mod channel;
pub mod dispatch;
pub mod error;
pub mod render;
pub mod session;

pub use {
    actions::{Action, ActionReply},
    channel::{ChannelId, ChannelList},
    dispatch::{DispatchOutcome, Dispatcher, MAX_REPORTED_FAILURES, MessageSender, SendFailure},
    error::{Error, Result},
    render::{ChannelEntry, SelectionSummary, SelectionView, render},
    session::{OperatorKey, SessionHandle, SessionScope, SessionStore, Snapshot},
};
