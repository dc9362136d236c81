use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::steamid::is_valid_steam_id64;

/// Privilege level attached to a [`Principal`](crate::session::Principal).
///
/// Totally ordered: `User < Vip < Admin`. An endpoint requiring `Vip`
/// accepts `Vip` and `Admin`; an endpoint requiring `Admin` accepts
/// only `Admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Vip,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Vip => "vip",
            Self::Admin => "admin",
        })
    }
}

/// Spendable currency held by an account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Coins,
    Gems,
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Coins => "coins",
            Self::Gems => "gems",
        })
    }
}

/// Consumer-defined user identifier (opaque string).
///
/// The consumer chooses the format (ULID, UUID, etc.).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Validated SteamID64 (17-digit, "7656119" prefix).
///
/// Guaranteed valid by construction: holding a `SteamId` proves the format
/// is correct. Use `"76561197960287930".parse::<SteamId>()` or
/// `SteamId::try_from(string)` to create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SteamId(String);

impl SteamId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SteamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SteamId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for SteamId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if is_valid_steam_id64(&s) {
            Ok(Self(s))
        } else {
            Err(Error::InvalidSteamId(s))
        }
    }
}

impl From<SteamId> for String {
    fn from(id: SteamId) -> Self {
        id.0
    }
}

/// Instant in epoch milliseconds.
///
/// All validity windows and expiry checks run on this representation, so
/// tests can pass a frozen clock instead of reading the system time.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
    Into,
)]
#[serde(transparent)]
pub struct UnixMillis(pub i64);

impl UnixMillis {
    /// Current system time.
    #[must_use]
    pub fn now() -> Self {
        let elapsed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock before Unix epoch");
        Self(elapsed.as_millis() as i64)
    }

    #[must_use]
    pub fn plus_millis(self, ms: i64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    #[must_use]
    pub fn plus_days(self, days: i64) -> Self {
        self.plus_millis(days.saturating_mul(86_400_000))
    }
}
