//! Session Store: staged messages and channel selections per operator.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use {
    serde::{Deserialize, Serialize},
    tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    tracing::debug,
};

use crate::{
    channel::{ChannelId, ChannelList},
    error::{Error, Result},
};

/// Identity of the operator a session belongs to (a Telegram user id).
pub type OperatorKey = u64;

/// How sessions are scoped across callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionScope {
    /// One session per operator identity.
    #[default]
    PerOperator,
    /// A single session shared by every caller for the process lifetime.
    Shared,
}

/// Staged messages plus the selected subset of the channel list.
#[derive(Debug)]
pub struct Session<M> {
    channels: ChannelList,
    staged: Vec<M>,
    selected: HashSet<ChannelId>,
}

impl<M> Session<M> {
    pub fn new(channels: ChannelList) -> Self {
        Self {
            channels,
            staged: Vec::new(),
            selected: HashSet::new(),
        }
    }

    pub fn channels(&self) -> &ChannelList {
        &self.channels
    }

    pub fn stage(&mut self, message: M) {
        self.staged.push(message);
    }

    /// Flip membership of `channel` in the selection.
    ///
    /// Returns whether the channel is selected afterwards.
    pub fn toggle(&mut self, channel: ChannelId) -> Result<bool> {
        if !self.channels.contains(channel) {
            return Err(Error::invalid_channel(channel));
        }
        if self.selected.remove(&channel) {
            Ok(false)
        } else {
            self.selected.insert(channel);
            Ok(true)
        }
    }

    /// Toggle the channel at 1-based `position` in the channel list.
    pub fn toggle_position(&mut self, position: usize) -> Result<bool> {
        let channel = self
            .channels
            .by_position(position)
            .ok_or_else(|| Error::invalid_channel(format!("position {position}")))?;
        self.toggle(channel)
    }

    pub fn select_all(&mut self) {
        self.selected = self.channels.iter().collect();
    }

    pub fn unselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn staged(&self) -> &[M] {
        &self.staged
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Selected channels with their 1-based positions, in channel-list order.
    pub fn selected_targets(&self) -> Vec<(usize, ChannelId)> {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, id)| self.selected.contains(id))
            .map(|(i, id)| (i + 1, id))
            .collect()
    }

    pub fn reset_after_dispatch(&mut self) {
        self.staged.clear();
        self.selected.clear();
    }
}

impl<M: Clone> Session<M> {
    pub fn snapshot(&self) -> Snapshot<M> {
        Snapshot {
            staged: self.staged.clone(),
            selected: self.selected_targets().into_iter().map(|(_, id)| id).collect(),
        }
    }
}

/// Owned, read-only copy of a session's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<M> {
    staged: Vec<M>,
    selected: Vec<ChannelId>,
}

impl<M> Snapshot<M> {
    pub fn staged(&self) -> &[M] {
        &self.staged
    }

    /// Selected channels in channel-list order.
    pub fn selected(&self) -> &[ChannelId] {
        &self.selected
    }

    pub fn is_selected(&self, channel: ChannelId) -> bool {
        self.selected.contains(&channel)
    }
}

/// Shared handle to one session.
///
/// Mutations take the write lock, snapshots the read lock, so a snapshot
/// never observes a half-applied change.
pub struct SessionHandle<M> {
    inner: Arc<RwLock<Session<M>>>,
}

impl<M> Clone for SessionHandle<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Clone> SessionHandle<M> {
    pub fn new(channels: ChannelList) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Session::new(channels))),
        }
    }

    pub async fn stage(&self, message: M) -> usize {
        let mut session = self.inner.write().await;
        session.stage(message);
        session.staged().len()
    }

    pub async fn toggle(&self, channel: ChannelId) -> Result<bool> {
        self.inner.write().await.toggle(channel)
    }

    pub async fn toggle_position(&self, position: usize) -> Result<bool> {
        self.inner.write().await.toggle_position(position)
    }

    pub async fn select_all(&self) {
        self.inner.write().await.select_all();
    }

    pub async fn unselect_all(&self) {
        self.inner.write().await.unselect_all();
    }

    pub async fn snapshot(&self) -> Snapshot<M> {
        self.inner.read().await.snapshot()
    }

    pub async fn reset_after_dispatch(&self) {
        self.inner.write().await.reset_after_dispatch();
    }

    /// Shared access, for reads that need more than a snapshot.
    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, Session<M>> {
        self.inner.read().await
    }

    /// Exclusive access for the whole duration of a dispatch.
    pub(crate) async fn lock(&self) -> RwLockWriteGuard<'_, Session<M>> {
        self.inner.write().await
    }
}

enum Slots<M> {
    PerOperator(Mutex<HashMap<OperatorKey, SessionHandle<M>>>),
    Shared(SessionHandle<M>),
}

/// Owns every live session. Sessions are created empty on first use and live
/// for the rest of the process.
pub struct SessionStore<M> {
    channels: ChannelList,
    slots: Slots<M>,
}

impl<M: Clone> SessionStore<M> {
    pub fn new(channels: ChannelList, scope: SessionScope) -> Self {
        let slots = match scope {
            SessionScope::PerOperator => Slots::PerOperator(Mutex::new(HashMap::new())),
            SessionScope::Shared => Slots::Shared(SessionHandle::new(channels.clone())),
        };
        Self { channels, slots }
    }

    pub fn channels(&self) -> &ChannelList {
        &self.channels
    }

    pub fn scope(&self) -> SessionScope {
        match self.slots {
            Slots::PerOperator(_) => SessionScope::PerOperator,
            Slots::Shared(_) => SessionScope::Shared,
        }
    }

    /// Session for `operator`, created on first interaction.
    pub fn session(&self, operator: OperatorKey) -> SessionHandle<M> {
        match &self.slots {
            Slots::Shared(handle) => handle.clone(),
            Slots::PerOperator(map) => {
                let mut map = map.lock().unwrap_or_else(|e| e.into_inner());
                map.entry(operator)
                    .or_insert_with(|| {
                        debug!(operator, "creating broadcast session");
                        SessionHandle::new(self.channels.clone())
                    })
                    .clone()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn channels() -> ChannelList {
        ChannelList::new([ChannelId(-10), ChannelId(-20), ChannelId(-30)]).unwrap()
    }

    fn session() -> Session<&'static str> {
        Session::new(channels())
    }

    #[rstest]
    #[case::nothing_selected(&[])]
    #[case::one_selected(&[1])]
    #[case::all_selected(&[1, 2, 3])]
    fn toggle_twice_restores_selection(#[case] initial: &[usize]) {
        let mut s = session();
        for position in initial {
            s.toggle_position(*position).unwrap();
        }
        let before = s.snapshot();
        for channel in channels().iter() {
            s.toggle(channel).unwrap();
            s.toggle(channel).unwrap();
            assert_eq!(s.snapshot(), before, "double toggle of {channel}");
        }
    }

    #[test]
    fn toggle_reports_new_state() {
        let mut s = session();
        assert!(s.toggle(ChannelId(-20)).unwrap());
        assert!(!s.toggle(ChannelId(-20)).unwrap());
    }

    #[test]
    fn toggle_unknown_channel_is_rejected_without_change() {
        let mut s = session();
        s.toggle(ChannelId(-10)).unwrap();
        let before = s.snapshot();

        assert!(matches!(
            s.toggle(ChannelId(-99)),
            Err(Error::InvalidChannel { .. })
        ));
        assert!(matches!(
            s.toggle_position(0),
            Err(Error::InvalidChannel { .. })
        ));
        assert!(matches!(
            s.toggle_position(4),
            Err(Error::InvalidChannel { .. })
        ));
        assert_eq!(s.snapshot(), before);
    }

    #[rstest]
    #[case::from_empty(&[])]
    #[case::from_partial(&[2])]
    #[case::from_full(&[1, 2, 3])]
    fn select_all_and_unselect_all(#[case] initial: &[usize]) {
        let mut s = session();
        for position in initial {
            s.toggle_position(*position).unwrap();
        }
        s.select_all();
        s.unselect_all();
        assert!(s.snapshot().selected().is_empty());

        for position in initial {
            s.toggle_position(*position).unwrap();
        }
        s.unselect_all();
        s.select_all();
        assert_eq!(s.snapshot().selected(), channels().iter().collect::<Vec<_>>());
    }

    #[test]
    fn selection_follows_channel_order_not_insertion_order() {
        let mut s = session();
        s.toggle(ChannelId(-30)).unwrap();
        s.toggle(ChannelId(-10)).unwrap();
        assert_eq!(s.snapshot().selected(), &[ChannelId(-10), ChannelId(-30)]);
        assert_eq!(s.selected_targets(), vec![
            (1, ChannelId(-10)),
            (3, ChannelId(-30))
        ]);
    }

    #[test]
    fn staging_keeps_order_and_duplicates() {
        let mut s = session();
        s.stage("a");
        s.stage("b");
        s.stage("a");
        assert_eq!(s.snapshot().staged(), &["a", "b", "a"]);
    }

    #[test]
    fn reset_clears_both_sides() {
        let mut s = session();
        s.stage("a");
        s.select_all();
        s.reset_after_dispatch();
        let snap = s.snapshot();
        assert!(snap.staged().is_empty());
        assert!(snap.selected().is_empty());
    }

    #[tokio::test]
    async fn per_operator_sessions_are_isolated() {
        let store: SessionStore<&str> = SessionStore::new(channels(), SessionScope::PerOperator);
        store.session(1).stage("one").await;
        store.session(1).select_all().await;

        let other = store.session(2).snapshot().await;
        assert!(other.staged().is_empty());
        assert!(other.selected().is_empty());
        assert_eq!(store.session(1).snapshot().await.staged(), &["one"]);
    }

    #[tokio::test]
    async fn shared_scope_uses_one_session() {
        let store: SessionStore<&str> = SessionStore::new(channels(), SessionScope::Shared);
        assert_eq!(store.scope(), SessionScope::Shared);
        store.session(1).stage("one").await;
        assert_eq!(store.session(2).snapshot().await.staged(), &["one"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_disjoint_toggles_commute() {
        let handle: SessionHandle<&str> = SessionHandle::new(channels());
        handle.toggle(ChannelId(-20)).await.unwrap();

        let tasks: Vec<_> = [ChannelId(-10), ChannelId(-20), ChannelId(-30)]
            .into_iter()
            .map(|channel| {
                let handle = handle.clone();
                tokio::spawn(async move { handle.toggle(channel).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(handle.snapshot().await.selected(), &[
            ChannelId(-10),
            ChannelId(-30)
        ]);
    }
}
