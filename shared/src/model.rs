use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::catalog::CatalogBrowser;
use crate::config::AppConfig;
use crate::{ALL_ENVIRONMENTS_KEY, ALL_ENVIRONMENTS_TITLE, MAX_USER_NAME_LEN};

// --- Typed keys ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(EnvironmentKey);
typed_id!(PlantId);

impl EnvironmentKey {
    #[must_use]
    pub fn all() -> Self {
        Self::new(ALL_ENVIRONMENTS_KEY)
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        self.0 == ALL_ENVIRONMENTS_KEY
    }
}

impl Default for EnvironmentKey {
    fn default() -> Self {
        Self::all()
    }
}

/// Monotonic id for one mounted catalog screen. Responses tagged with an
/// older session are dropped.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

// --- Catalog records ---

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub key: EnvironmentKey,
    pub title: String,
}

impl Environment {
    #[must_use]
    pub fn all() -> Self {
        Self {
            key: EnvironmentKey::all(),
            title: ALL_ENVIRONMENTS_TITLE.to_string(),
        }
    }
}

/// Environment record as served by the API. The key is optional on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RemoteEnvironment {
    #[serde(default)]
    pub key: Option<String>,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    pub times: u32,
    pub repeat_every: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    #[serde(deserialize_with = "deserialize_plant_id")]
    pub id: PlantId,
    pub name: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub water_tips: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub environments: Vec<EnvironmentKey>,
    pub frequency: Frequency,
}

impl Plant {
    #[must_use]
    pub fn grows_in(&self, key: &EnvironmentKey) -> bool {
        self.environments.iter().any(|k| k == key)
    }
}

// json-server hands out numeric ids; hand-written fixtures use strings.
fn deserialize_plant_id<'de, D>(deserializer: D) -> Result<PlantId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => PlantId(n.to_string()),
        RawId::Text(s) => PlantId(s),
    })
}

// --- User name ---

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserNameError {
    #[error("name is empty")]
    Empty,
    #[error("name too long ({len} > {max})")]
    TooLong { len: usize, max: usize },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserName(String);

impl UserName {
    pub fn new(raw: &str) -> Result<Self, UserNameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserNameError::Empty);
        }
        let len = trimmed.chars().count();
        if len > MAX_USER_NAME_LEN {
            return Err(UserNameError::TooLong {
                len,
                max: MAX_USER_NAME_LEN,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// --- App shell ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FontsState {
    #[default]
    Pending,
    Loaded,
    /// Shell could not supply the custom faces in time; platform fonts are used.
    Fallback,
}

impl FontsState {
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Exactly one screen is mounted at a time. The catalog browser lives inside
/// its screen and is dropped with it.
#[derive(Debug, Default)]
pub enum Screen {
    #[default]
    Welcome,
    UserIdentification,
    Confirmation,
    PlantSelect(Box<CatalogBrowser>),
}

impl Screen {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::UserIdentification => "user_identification",
            Self::Confirmation => "confirmation",
            Self::PlantSelect(_) => "plant_select",
        }
    }

    pub fn catalog(&self) -> Option<&CatalogBrowser> {
        match self {
            Self::PlantSelect(browser) => Some(browser.as_ref()),
            _ => None,
        }
    }

    pub fn catalog_mut(&mut self) -> Option<&mut CatalogBrowser> {
        match self {
            Self::PlantSelect(browser) => Some(browser.as_mut()),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: AppConfig,
    pub fonts: FontsState,
    pub screen: Screen,
    pub name_draft: String,
    pub user_name: Option<UserName>,
    next_session: u64,
}

impl Model {
    pub fn next_session_id(&mut self) -> SessionId {
        self.next_session += 1;
        SessionId(self.next_session)
    }

    /// Catalog for `session`, if that session is still mounted.
    pub fn live_catalog_mut(&mut self, session: SessionId) -> Option<&mut CatalogBrowser> {
        self.screen
            .catalog_mut()
            .filter(|browser| browser.session() == session)
    }
}
