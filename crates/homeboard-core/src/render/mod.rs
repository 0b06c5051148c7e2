//! Pure per-domain renderers.
//!
//! `render(domain, payload)` turns a domain payload into the full
//! replacement view of that domain's widget. Same payload, same view: the
//! push path and the poll path both land here, and whichever resolves last
//! wins on the board.

mod feeds;
mod home;
mod status;

use homeboard_protocol::Domain;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::RenderError;

pub use feeds::render_notification_list;

/// Placeholder line for an empty payload.
pub const NO_DATA: &str = "no data";

/// Rendered content of one widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetView {
    pub widget: String,
    pub title: String,
    pub lines: Vec<String>,
    pub badge: Option<String>,
}

impl WidgetView {
    pub fn new(domain: Domain, lines: Vec<String>) -> Self {
        Self::for_widget(domain.slug(), domain.title(), lines)
    }

    pub fn for_widget(widget: &str, title: &str, lines: Vec<String>) -> Self {
        let lines = if lines.is_empty() {
            vec![NO_DATA.to_string()]
        } else {
            lines
        };
        Self {
            widget: widget.to_string(),
            title: title.to_string(),
            lines,
            badge: None,
        }
    }

    pub fn with_badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn is_placeholder(&self) -> bool {
        self.lines.len() == 1 && self.lines[0] == NO_DATA
    }
}

/// Render a domain payload as its widget view.
pub fn render(domain: Domain, payload: &Value) -> Result<WidgetView, RenderError> {
    match domain {
        Domain::Weather => feeds::weather(payload),
        Domain::Health => status::health(payload),
        Domain::Infra => status::infra(payload),
        Domain::Cameras => status::cameras(payload),
        Domain::Kanban => feeds::kanban(payload),
        Domain::Scenes => home::scenes(payload),
        Domain::Lights => home::lights(payload),
        Domain::Media => home::media(payload),
        Domain::Activities => feeds::activities(payload),
        Domain::News => feeds::news(payload),
        Domain::Topology => status::topology(payload),
        Domain::Speedtest => status::speedtest(payload),
        Domain::Notifications => feeds::notifications(payload),
        Domain::Calendar => feeds::calendar(payload),
        Domain::Chat => feeds::chat(payload),
    }
}

/// Deserialize a payload into the renderer's view of it. A `null` payload
/// counts as empty.
pub(crate) fn parse<T: DeserializeOwned + Default>(
    domain: Domain,
    payload: &Value,
) -> Result<T, RenderError> {
    if payload.is_null() {
        return Ok(T::default());
    }
    T::deserialize(payload).map_err(|e| RenderError::UnexpectedShape {
        domain,
        message: e.to_string(),
    })
}

/// Loosely typed scalar as display text: strings as-is, numbers printed,
/// anything else as `?`.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => "?".to_string(),
    }
}

/// Title of a loosely shaped list item: a bare string, or an object's
/// `title`, `text` or `name`.
fn item_title(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["title", "text", "name"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .unwrap_or("?")
            .to_string(),
        other => text(other),
    }
}
