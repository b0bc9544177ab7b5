use teloxide::types::UserId;

/// Admits exactly one Telegram user: the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorGate {
    owner: UserId,
}

impl OperatorGate {
    pub fn new(owner_id: u64) -> Self {
        Self {
            owner: UserId(owner_id),
        }
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn is_authorized(&self, caller: UserId) -> bool {
        caller == self.owner
    }

    /// Determine if an update from `caller` may touch the session store.
    ///
    /// Returns `Ok(operator)` when allowed, or `Err(reason)` when the update
    /// must be rejected.
    pub fn check_access(&self, caller: Option<UserId>) -> Result<UserId, AccessDenied> {
        match caller {
            None => Err(AccessDenied::NoSender),
            Some(id) if self.is_authorized(id) => Ok(id),
            Some(_) => Err(AccessDenied::NotOperator),
        }
    }
}

/// Reason an inbound update was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    /// The update carries no user (e.g. a channel post).
    NoSender,
    NotOperator,
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSender => write!(f, "update has no sender"),
            Self::NotOperator => write!(f, "sender is not the operator"),
        }
    }
}
