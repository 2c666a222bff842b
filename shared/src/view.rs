use serde::{Deserialize, Serialize};

use crate::capabilities::{HEADING_FONT, TEXT_FONT};
use crate::catalog::CatalogBrowser;
use crate::model::{Environment, EnvironmentKey, FontsState, Model, Plant, Screen};
use crate::{AppError, ErrorSeverity};

pub const GREETING: &str = "Olá,";
pub const RETRY_LABEL: &str = "Tentar novamente";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderView {
    pub greeting: String,
    pub user_name: String,
    pub avatar: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentButtonView {
    pub key: EnvironmentKey,
    pub title: String,
    pub active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlantCardView {
    pub id: String,
    pub name: String,
    pub photo: String,
}

impl From<&Plant> for PlantCardView {
    fn from(plant: &Plant) -> Self {
        Self {
            id: plant.id.to_string(),
            name: plant.name.clone(),
            photo: plant.photo.clone(),
        }
    }
}

/// Font families the shell should use. `None` means the platform default.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FontFaces {
    pub heading: Option<String>,
    pub text: Option<String>,
}

impl FontFaces {
    #[must_use]
    pub fn for_state(state: FontsState) -> Self {
        match state {
            FontsState::Loaded => Self {
                heading: Some(HEADING_FONT.into()),
                text: Some(TEXT_FONT.into()),
            },
            FontsState::Pending | FontsState::Fallback => Self::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewState {
    Loading {
        message: Option<String>,
    },
    Welcome {
        title: String,
        subtitle: String,
    },
    UserIdentification {
        emoji: String,
        title: String,
        placeholder: String,
        name: String,
        can_submit: bool,
    },
    Confirmation {
        emoji: String,
        title: String,
        subtitle: String,
        button: String,
    },
    PlantSelect {
        header: HeaderView,
        title: String,
        subtitle: String,
        environments: Vec<EnvironmentButtonView>,
        plants: Vec<PlantCardView>,
        is_loading_more: bool,
        has_more: bool,
    },
    /// The first page never arrived. Retry is always offered; whether it is
    /// likely to help is in `ViewModel::error`.
    Error {
        title: String,
        message: String,
        retry_label: String,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub state: ViewState,
    pub error: Option<UserFacingError>,
    pub fonts: FontFaces,
}

#[must_use]
pub fn build(model: &Model) -> ViewModel {
    let fonts = FontFaces::for_state(model.fonts);

    // Nothing is drawn until the shell has answered the font request.
    if !model.fonts.is_resolved() {
        return ViewModel {
            state: ViewState::Loading { message: None },
            error: None,
            fonts,
        };
    }

    let (state, error) = match &model.screen {
        Screen::Welcome => (
            ViewState::Welcome {
                title: "Gerencie\nsuas plantas de\nforma fácil".into(),
                subtitle: "Não esqueça mais de regar suas plantas. \
                           Nós cuidamos de lembrar você sempre que precisar."
                    .into(),
            },
            None,
        ),
        Screen::UserIdentification => {
            let can_submit = crate::model::UserName::new(&model.name_draft).is_ok();
            (
                ViewState::UserIdentification {
                    emoji: if can_submit { "😄" } else { "😀" }.into(),
                    title: "Como podemos\nchamar você?".into(),
                    placeholder: "Digite um nome".into(),
                    name: model.name_draft.clone(),
                    can_submit,
                },
                None,
            )
        }
        Screen::Confirmation => (
            ViewState::Confirmation {
                emoji: "😄".into(),
                title: "Prontinho".into(),
                subtitle: "Agora vamos começar a cuidar das suas plantinhas com muito cuidado."
                    .into(),
                button: "Começar".into(),
            },
            None,
        ),
        Screen::PlantSelect(browser) => catalog_state(model, browser),
    };

    ViewModel {
        state,
        error,
        fonts,
    }
}

fn catalog_state(model: &Model, browser: &CatalogBrowser) -> (ViewState, Option<UserFacingError>) {
    if browser.loading_initial() {
        return (ViewState::Loading { message: None }, None);
    }

    if let Some(e) = browser.blocking_error() {
        let error = AppError::from(e.clone());
        return (
            ViewState::Error {
                title: "Ops!".into(),
                message: error.user_facing_message(),
                retry_label: RETRY_LABEL.into(),
            },
            Some(UserFacingError::from(&error)),
        );
    }

    let header = HeaderView {
        greeting: GREETING.into(),
        user_name: model
            .user_name
            .as_ref()
            .map(|n| n.as_str().to_string())
            .unwrap_or_default(),
        avatar: model.config.avatar.clone(),
    };

    let selected = browser.selected_environment();
    let environments = browser
        .environments()
        .iter()
        .map(|env: &Environment| EnvironmentButtonView {
            key: env.key.clone(),
            title: env.title.clone(),
            active: &env.key == selected,
        })
        .collect();

    let plants = browser
        .filtered_plants()
        .into_iter()
        .map(PlantCardView::from)
        .collect();

    let error = browser
        .banner_error()
        .map(|e| UserFacingError::from(&AppError::from(e.clone())));

    (
        ViewState::PlantSelect {
            header,
            title: "Em qual ambiente".into(),
            subtitle: "você quer colocar sua planta?".into(),
            environments,
            plants,
            is_loading_more: browser.loading_more(),
            has_more: !browser.exhausted(),
        },
        error,
    )
}
