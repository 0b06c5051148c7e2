//! Smart-home widgets: lights, scenes, media players.

use std::collections::BTreeMap;

use homeboard_protocol::Domain;
use serde::Deserialize;
use serde_json::Value;

use super::{WidgetView, parse};
use crate::errors::RenderError;

#[derive(Debug, Default, Deserialize)]
struct Room {
    #[serde(default)]
    lights: Vec<Light>,
    #[serde(default)]
    any_on: bool,
}

#[derive(Debug, Deserialize)]
struct Light {
    #[serde(default)]
    name: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    brightness: Option<f64>,
}

/// One line per room, sorted by room name.
pub(super) fn lights(payload: &Value) -> Result<WidgetView, RenderError> {
    let rooms: BTreeMap<String, Room> = parse(Domain::Lights, payload)?;

    let mut lit_rooms = 0;
    let lines = rooms
        .iter()
        .map(|(room, status)| {
            let on: Vec<&Light> = status.lights.iter().filter(|l| l.state == "on").collect();
            if status.any_on || !on.is_empty() {
                lit_rooms += 1;
            }
            let mut line = format!("{room}: {}/{} on", on.len(), status.lights.len());
            let names: Vec<String> = on
                .iter()
                .map(|l| match l.brightness {
                    // HA brightness is 0..=255.
                    Some(b) => format!("{} {}%", l.name, (b * 100.0 / 255.0).round() as u32),
                    None => l.name.clone(),
                })
                .collect();
            if !names.is_empty() {
                line.push_str(&format!(" ({})", names.join(", ")));
            }
            line
        })
        .collect();

    let view = WidgetView::new(Domain::Lights, lines);
    Ok(if rooms.is_empty() {
        view
    } else {
        view.with_badge(format!("{lit_rooms} lit"))
    })
}

#[derive(Debug, Deserialize)]
struct Scene {
    #[serde(default)]
    entity_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    icon: Option<String>,
}

pub(super) fn scenes(payload: &Value) -> Result<WidgetView, RenderError> {
    let scenes: Vec<Scene> = parse(Domain::Scenes, payload)?;
    let lines = scenes
        .iter()
        .map(|s| {
            let name = s.name.as_deref().unwrap_or(&s.entity_id);
            match s.icon.as_deref() {
                Some(icon) => format!("{icon} {name}"),
                None => name.to_string(),
            }
        })
        .collect();
    Ok(WidgetView::new(Domain::Scenes, lines))
}

#[derive(Debug, Deserialize)]
struct Player {
    #[serde(default)]
    entity_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    state: String,
    #[serde(default)]
    media_title: Option<String>,
    #[serde(default)]
    media_artist: Option<String>,
    #[serde(default)]
    app_name: Option<String>,
    #[serde(default)]
    volume_level: Option<Value>,
    #[serde(default)]
    is_volume_muted: bool,
}

impl Player {
    fn is_active(&self) -> bool {
        matches!(self.state.as_str(), "playing" | "paused" | "buffering")
    }
}

/// Active players first, then idle ones, each group in payload order.
pub(super) fn media(payload: &Value) -> Result<WidgetView, RenderError> {
    let players: Vec<Player> = parse(Domain::Media, payload)?;
    let (active, idle): (Vec<&Player>, Vec<&Player>) =
        players.iter().partition(|p| p.is_active());

    let mut lines = Vec::with_capacity(players.len());
    for p in &active {
        let name = p.name.as_deref().unwrap_or(&p.entity_id);
        let mut line = format!("{name}: {}", p.state);
        match (p.media_title.as_deref(), p.media_artist.as_deref()) {
            (Some(title), Some(artist)) => line.push_str(&format!(" - {title} / {artist}")),
            (Some(title), None) => line.push_str(&format!(" - {title}")),
            _ => {
                if let Some(app) = p.app_name.as_deref() {
                    line.push_str(&format!(" - {app}"));
                }
            }
        }
        if p.is_volume_muted {
            line.push_str(" [muted]");
        } else if let Some(volume) = p.volume_level.as_ref().and_then(Value::as_f64) {
            line.push_str(&format!(" [vol {}%]", (volume * 100.0).round() as i64));
        }
        lines.push(line);
    }
    for p in &idle {
        let name = p.name.as_deref().unwrap_or(&p.entity_id);
        lines.push(format!("{name}: {}", p.state));
    }

    let view = WidgetView::new(Domain::Media, lines);
    Ok(if active.is_empty() {
        view
    } else {
        view.with_badge(format!("{} playing", active.len()))
    })
}
