mod fonts;
mod http;

pub use self::fonts::{
    required_faces, FontError, FontOperation, FontOutput, FontResult, Fonts, HEADING_FONT,
    TEXT_FONT,
};
pub use self::http::{
    decode_body, decode_response, CatalogApi, FetchError, ENVIRONMENTS_PATH, PLANTS_PATH,
};

// Crux's built-in Render capability covers view updates; no wrapper needed.
pub use crux_core::render::Render;
pub use crux_http::Http;

#[allow(unused_imports)]
use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub fonts: Fonts<Event>,
}
