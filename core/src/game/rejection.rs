use thiserror::Error;

/// A command that was refused for a business reason. State is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("Insufficient funds: need GBP {needed:.2}")]
    InsufficientFunds { needed: f64 },
    #[error("The pub is open; wait until closing")]
    PubOpen,
    #[error("The pub is closed; open the night first")]
    PubClosed,
    #[error("Unknown {kind}: {id}")]
    Unknown { kind: &'static str, id: String },
    #[error("Already owned: {0}")]
    AlreadyOwned(String),
    #[error("Already being installed: {0}")]
    AlreadyInstalling(String),
    #[error("{what} is locked: {reason}")]
    Locked { what: String, reason: String },
    #[error("Cap reached: {0}")]
    CapReached(String),
    #[error("No room left on the {0} rack")]
    RackFull(&'static str),
    #[error("{id} is on cooldown for {rounds} more round(s)")]
    Cooldown { id: String, rounds: u32 },
    #[error("Only one landlord action per round")]
    ActionAlreadyTaken,
    #[error("Only one security task per round")]
    TaskAlreadyQueued,
    #[error("The music can only change once per phase")]
    MusicAlreadyChanged,
    #[error("Credit refused: {0}")]
    CreditRefused(String),
    #[error("No payday bills are pending")]
    NoBillsPending,
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("The licence has been revoked; the run is over")]
    LicenceRevoked,
    #[error("Requirement not met: {0}")]
    Requirement(String),
}

impl Rejection {
    pub(crate) fn unknown(kind: &'static str, id: impl Into<String>) -> Self {
        Rejection::Unknown {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn locked(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Rejection::Locked {
            what: what.into(),
            reason: reason.into(),
        }
    }
}
