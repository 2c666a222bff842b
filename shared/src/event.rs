use serde::{Deserialize, Serialize};

use crate::capabilities::{FetchError, FontResult};
use crate::config::AppConfig;
use crate::model::{EnvironmentKey, Plant, RemoteEnvironment, SessionId};

// --- Event enum: shell-facing variants first, capability responses boxed ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    // App shell
    AppStarted { config: AppConfig },
    StartRequested,
    UserNameChanged { name: String },
    UserNameSubmitted,
    ConfirmationAcknowledged,
    BackRequested,

    // Plant selection
    EnvironmentSelected { key: EnvironmentKey },
    EndReached { distance_from_end: f64 },
    RetryRequested,
    DismissError,

    // Capability responses (core-internal)
    #[serde(skip)]
    FontsResolved(Box<FontResult>),
    #[serde(skip)]
    EnvironmentsFetched {
        session: SessionId,
        result: Box<Result<Vec<RemoteEnvironment>, FetchError>>,
    },
    #[serde(skip)]
    PlantsPageFetched {
        session: SessionId,
        page: u32,
        result: Box<Result<Option<Vec<Plant>>, FetchError>>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted { .. } => "app_started",
            Self::StartRequested => "start_requested",
            Self::UserNameChanged { .. } => "user_name_changed",
            Self::UserNameSubmitted => "user_name_submitted",
            Self::ConfirmationAcknowledged => "confirmation_acknowledged",
            Self::BackRequested => "back_requested",
            Self::EnvironmentSelected { .. } => "environment_selected",
            Self::EndReached { .. } => "end_reached",
            Self::RetryRequested => "retry_requested",
            Self::DismissError => "dismiss_error",
            Self::FontsResolved(_) => "fonts_resolved",
            Self::EnvironmentsFetched { .. } => "environments_fetched",
            Self::PlantsPageFetched { .. } => "plants_page_fetched",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::StartRequested
                | Self::UserNameChanged { .. }
                | Self::UserNameSubmitted
                | Self::ConfirmationAcknowledged
                | Self::BackRequested
                | Self::EnvironmentSelected { .. }
                | Self::EndReached { .. }
                | Self::RetryRequested
                | Self::DismissError
        )
    }
}
