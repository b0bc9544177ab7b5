use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Stable identifier of a broadcast destination (a Telegram chat id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub i64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChannelId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The fixed, ordered list of broadcast destinations.
///
/// Built once at startup. Positions are 1-based and follow the configured
/// order; they are what the operator sees instead of raw ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelList {
    ids: Arc<[ChannelId]>,
}

impl ChannelList {
    pub fn new(ids: impl IntoIterator<Item = ChannelId>) -> Result<Self> {
        let ids: Vec<ChannelId> = ids.into_iter().collect();
        if ids.is_empty() {
            return Err(Error::EmptyChannelList);
        }
        for (i, id) in ids.iter().enumerate() {
            if ids[..i].contains(id) {
                return Err(Error::DuplicateChannel { channel: *id });
            }
        }
        Ok(Self { ids: ids.into() })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always `false` for a constructed list; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.ids.iter().copied()
    }

    pub fn contains(&self, id: ChannelId) -> bool {
        self.ids.contains(&id)
    }

    /// 1-based position of `id`, if it is part of the list.
    pub fn position(&self, id: ChannelId) -> Option<usize> {
        self.ids.iter().position(|c| *c == id).map(|i| i + 1)
    }

    /// Channel at the 1-based `position`.
    pub fn by_position(&self, position: usize) -> Option<ChannelId> {
        position
            .checked_sub(1)
            .and_then(|i| self.ids.get(i).copied())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn list(ids: &[i64]) -> Result<ChannelList> {
        ChannelList::new(ids.iter().copied().map(ChannelId))
    }

    #[test]
    fn positions_are_one_based() -> Result<()> {
        let channels = list(&[-100, -200, -300])?;
        assert_eq!(channels.len(), 3);
        assert_eq!(channels.position(ChannelId(-100)), Some(1));
        assert_eq!(channels.position(ChannelId(-300)), Some(3));
        assert_eq!(channels.position(ChannelId(-400)), None);
        assert_eq!(channels.by_position(2), Some(ChannelId(-200)));
        assert_eq!(channels.by_position(0), None);
        assert_eq!(channels.by_position(4), None);
        Ok(())
    }

    #[test]
    fn empty_list_rejected() {
        assert!(matches!(list(&[]), Err(Error::EmptyChannelList)));
    }

    #[test]
    fn duplicate_rejected() {
        assert!(matches!(
            list(&[-1, -2, -1]),
            Err(Error::DuplicateChannel {
                channel: ChannelId(-1)
            })
        ));
    }

    #[test]
    fn deserializes_from_bare_integers() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let ids: Vec<ChannelId> = serde_json::from_str("[-1002504723776, -1002489624380]")?;
        assert_eq!(ids, vec![
            ChannelId(-1002504723776),
            ChannelId(-1002489624380)
        ]);
        Ok(())
    }
}
