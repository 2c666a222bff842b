// lib.rs - Plant Manager shared core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod catalog;
pub mod config;
pub mod event;
pub mod model;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use catalog::{CatalogBrowser, Fetch, PageOutcome, Phase};
pub use config::{AppConfig, ConfigError};
pub use event::Event;
pub use model::{Environment, EnvironmentKey, FontsState, Model, Plant, Screen, SessionId};
pub use view::{ViewModel, ViewState};

use capabilities::{FetchError, FontError};

pub const PAGE_SIZE: u32 = 8;
pub const ALL_ENVIRONMENTS_KEY: &str = "all";
pub const ALL_ENVIRONMENTS_TITLE: &str = "Todos";
pub const MAX_USER_NAME_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    NotFound,
    RateLimited,
    Server,
    Deserialization,
    Configuration,
    Fonts,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::Server => "SERVER_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Fonts => "FONT_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::RateLimited | Self::Server | Self::Fonts => {
                ErrorSeverity::Transient
            }
            Self::Configuration => ErrorSeverity::Fatal,
            Self::NotFound | Self::Deserialization | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimited | Self::Server
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && !matches!(self.severity, ErrorSeverity::Fatal)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Não foi possível conectar. Verifique sua internet e tente novamente.".into()
            }
            ErrorKind::Timeout => "O servidor demorou para responder. Tente novamente.".into(),
            ErrorKind::NotFound => "Não encontramos o catálogo de plantas.".into(),
            ErrorKind::RateLimited => {
                "Muitas requisições. Aguarde um momento e tente novamente.".into()
            }
            ErrorKind::Server => {
                "O servidor está com problemas. Tente novamente em instantes.".into()
            }
            ErrorKind::Deserialization => {
                "Recebemos dados inválidos do servidor.".into()
            }
            ErrorKind::Configuration => "O aplicativo está mal configurado.".into(),
            ErrorKind::Fonts => "Não foi possível carregar as fontes.".into(),
            ErrorKind::Unknown => "Ocorreu um erro inesperado. Tente novamente.".into(),
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16) -> Self {
        let kind = match status {
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        };

        Self::new(kind, format!("HTTP error: {status}"))
            .with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)
    }
}

impl std::error::Error for AppError {}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Status { code } => AppError::from_http_status(code),
            FetchError::Timeout => AppError::new(ErrorKind::Timeout, e.to_string()),
            FetchError::Network(_) | FetchError::MissingBody => {
                AppError::new(ErrorKind::Network, e.to_string())
            }
            FetchError::Decode(_) => AppError::new(ErrorKind::Deserialization, e.to_string()),
            FetchError::InvalidUrl(_) => AppError::new(ErrorKind::Configuration, e.to_string()),
        }
    }
}

impl From<FontError> for AppError {
    fn from(e: FontError) -> Self {
        AppError::new(ErrorKind::Fonts, e.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

pub mod app {
    use tracing::{debug, error, info, info_span, warn};

    use super::*;
    use crate::capabilities::{decode_response, required_faces, FontOutput};
    use crate::model::UserName;

    #[derive(Default)]
    pub struct App;

    impl App {
        /// Issues the HTTP requests a catalog session asked for. Responses
        /// come back tagged with the session and page they belong to.
        fn dispatch(fetches: &[Fetch], session: SessionId, model: &mut Model, caps: &Capabilities) {
            let api = match model.config.catalog_api() {
                Ok(api) => api,
                Err(e) => {
                    error!(error = %e, "catalog api unavailable");
                    let failure = FetchError::InvalidUrl(e.to_string());
                    if let Some(browser) = model.live_catalog_mut(session) {
                        for fetch in fetches {
                            match *fetch {
                                Fetch::Environments => {
                                    browser.apply_environments(Err(failure.clone()));
                                }
                                Fetch::PlantsPage(page) => {
                                    browser.apply_page(page, Err(failure.clone()));
                                }
                            }
                        }
                    }
                    return;
                }
            };

            for fetch in fetches {
                match *fetch {
                    Fetch::Environments => match api.environments_url() {
                        Ok(url) => {
                            debug!(%session, %url, "fetching environments");
                            caps.http.get(url).send(move |result| Event::EnvironmentsFetched {
                                session,
                                result: Box::new(decode_response(result)),
                            });
                        }
                        Err(e) => {
                            if let Some(browser) = model.live_catalog_mut(session) {
                                browser.apply_environments(Err(e));
                            }
                        }
                    },
                    Fetch::PlantsPage(page) => match api.plants_page_url(page) {
                        Ok(url) => {
                            debug!(%session, page, %url, "fetching plants page");
                            caps.http.get(url).send(move |result| Event::PlantsPageFetched {
                                session,
                                page,
                                result: Box::new(decode_response(result)),
                            });
                        }
                        Err(e) => {
                            if let Some(browser) = model.live_catalog_mut(session) {
                                browser.apply_page(page, Err(e));
                            }
                        }
                    },
                }
            }
        }

        fn mount_catalog(model: &mut Model, caps: &Capabilities) {
            let session = model.next_session_id();
            let (browser, fetches) = CatalogBrowser::mount(session);
            model.screen = Screen::PlantSelect(Box::new(browser));
            Self::dispatch(&fetches, session, model, caps);
        }

        fn navigate(model: &mut Model, to: Screen) {
            if let Some(browser) = model.screen.catalog() {
                info!(
                    session = %browser.session(),
                    plants = browser.all_plants().len(),
                    "catalog session unmounted"
                );
            }
            debug!(from = model.screen.name(), to = to.name(), "screen change");
            model.screen = to;
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            let span = info_span!(
                "update",
                event = event.name(),
                user = event.is_user_initiated(),
                screen = model.screen.name()
            );
            let _entered = span.enter();

            match event {
                Event::AppStarted { config } => {
                    match config.validate() {
                        Ok(()) => model.config = config,
                        Err(e) => {
                            error!(error = %e, "rejected shell config, keeping defaults");
                        }
                    }
                    info!(api = %model.config.api_base_url, "app started");

                    model.fonts = FontsState::Pending;
                    caps.fonts.load(required_faces(), model.config.font_timeout_ms, |result| {
                        Event::FontsResolved(Box::new(result))
                    });
                    caps.render.render();
                }

                Event::FontsResolved(result) => {
                    model.fonts = match *result {
                        Ok(FontOutput::Loaded) => FontsState::Loaded,
                        Ok(FontOutput::TimedOut) => {
                            warn!(
                                timeout_ms = model.config.font_timeout_ms,
                                "font loading timed out, using platform fonts"
                            );
                            FontsState::Fallback
                        }
                        Err(e) => {
                            warn!(error = %e, "font loading failed, using platform fonts");
                            FontsState::Fallback
                        }
                    };
                    caps.render.render();
                }

                Event::StartRequested => {
                    if matches!(model.screen, Screen::Welcome) {
                        Self::navigate(model, Screen::UserIdentification);
                        caps.render.render();
                    }
                }

                Event::UserNameChanged { name } => {
                    if matches!(model.screen, Screen::UserIdentification) {
                        model.name_draft = name;
                        caps.render.render();
                    }
                }

                Event::UserNameSubmitted => {
                    if !matches!(model.screen, Screen::UserIdentification) {
                        return;
                    }
                    match UserName::new(&model.name_draft) {
                        Ok(name) => {
                            model.user_name = Some(name);
                            Self::navigate(model, Screen::Confirmation);
                            caps.render.render();
                        }
                        Err(e) => {
                            debug!(error = %e, "user name rejected");
                        }
                    }
                }

                Event::ConfirmationAcknowledged => {
                    if matches!(model.screen, Screen::Confirmation) {
                        Self::mount_catalog(model, caps);
                        caps.render.render();
                    }
                }

                Event::BackRequested => {
                    let previous = match model.screen {
                        Screen::Welcome => return,
                        Screen::UserIdentification => Screen::Welcome,
                        Screen::Confirmation => Screen::UserIdentification,
                        Screen::PlantSelect(_) => Screen::Confirmation,
                    };
                    Self::navigate(model, previous);
                    caps.render.render();
                }

                Event::EnvironmentSelected { key } => {
                    if let Some(browser) = model.screen.catalog_mut() {
                        browser.select_environment(key);
                        caps.render.render();
                    }
                }

                Event::EndReached { distance_from_end } => {
                    let Some(browser) = model.screen.catalog_mut() else {
                        return;
                    };
                    let session = browser.session();
                    if let Some(fetch) = browser.request_more(distance_from_end) {
                        Self::dispatch(&[fetch], session, model, caps);
                        caps.render.render();
                    }
                }

                Event::RetryRequested => {
                    let Some(browser) = model.screen.catalog_mut() else {
                        return;
                    };
                    let session = browser.session();
                    let fetches = browser.retry();
                    if !fetches.is_empty() {
                        info!(%session, count = fetches.len(), "retrying failed fetches");
                        Self::dispatch(&fetches, session, model, caps);
                        caps.render.render();
                    }
                }

                Event::DismissError => {
                    if let Some(browser) = model.screen.catalog_mut() {
                        browser.dismiss_error();
                        caps.render.render();
                    }
                }

                Event::EnvironmentsFetched { session, result } => {
                    match model.live_catalog_mut(session) {
                        Some(browser) => {
                            browser.apply_environments(*result);
                            caps.render.render();
                        }
                        None => debug!(%session, "environments for a closed session dropped"),
                    }
                }

                Event::PlantsPageFetched {
                    session,
                    page,
                    result,
                } => match model.live_catalog_mut(session) {
                    Some(browser) => {
                        if browser.apply_page(page, *result) != PageOutcome::Stale {
                            caps.render.render();
                        }
                    }
                    None => debug!(%session, page, "page for a closed session dropped"),
                },
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            view::build(model)
        }
    }
}
