use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Font faces the screens are designed around.
pub const TEXT_FONT: &str = "Jost_400Regular";
pub const HEADING_FONT: &str = "Jost_600SemiBold";

/// Asks the shell to make font assets available before anything is drawn.
/// The shell owns the actual loading and must answer within `timeout_ms`.
#[derive(crux_core::macros::Capability)]
pub struct Fonts<Ev> {
    context: CapabilityContext<FontOperation, Ev>,
}

impl<Ev> Fonts<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<FontOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn load<F>(&self, faces: Vec<String>, timeout_ms: u64, make_event: F)
    where
        F: FnOnce(FontResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(FontOperation::Load { faces, timeout_ms })
                .await;
            context.update_app(make_event(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FontOperation {
    Load { faces: Vec<String>, timeout_ms: u64 },
}

impl Operation for FontOperation {
    type Output = FontResult;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FontOutput {
    Loaded,
    TimedOut,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum FontError {
    #[error("font asset not found: {face}")]
    NotFound { face: String },

    #[error("font loading failed: {reason}")]
    Failed { reason: String },
}

pub type FontResult = Result<FontOutput, FontError>;

#[must_use]
pub fn required_faces() -> Vec<String> {
    vec![TEXT_FONT.to_string(), HEADING_FONT.to_string()]
}
