//! Information widgets: weather, task board, activities, news,
//! notifications, calendar, chat.

use std::collections::BTreeMap;

use homeboard_protocol::{Domain, NotificationList};
use serde::Deserialize;
use serde_json::Value;

use super::{WidgetView, item_title, parse, text};
use crate::errors::RenderError;

const MAX_CHAT_MESSAGES: usize = 10;

#[derive(Debug, Default, Deserialize)]
struct Weather {
    #[serde(default)]
    current: Option<Current>,
    #[serde(default)]
    today: Option<Today>,
    #[serde(default)]
    tomorrow: Option<Tomorrow>,
    #[serde(default)]
    suggestion: Vec<String>,
}

// wttr.in reports numbers as strings, so scalars stay loosely typed.
#[derive(Debug, Deserialize)]
struct Current {
    #[serde(default)]
    temp_f: Value,
    #[serde(default)]
    feels_like: Value,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    humidity: Value,
    #[serde(default)]
    wind_mph: Value,
    #[serde(default)]
    uv_index: Value,
}

#[derive(Debug, Deserialize)]
struct Today {
    #[serde(default)]
    high: Value,
    #[serde(default)]
    low: Value,
    #[serde(default)]
    sunrise: Option<String>,
    #[serde(default)]
    sunset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Tomorrow {
    #[serde(default)]
    high: Value,
    #[serde(default)]
    low: Value,
    #[serde(default)]
    desc: Option<String>,
}

pub(super) fn weather(payload: &Value) -> Result<WidgetView, RenderError> {
    let weather: Weather = parse(Domain::Weather, payload)?;
    let mut lines = Vec::new();

    if let Some(c) = &weather.current {
        lines.push(format!(
            "{}°F {} (feels {}°F)",
            text(&c.temp_f),
            c.description.as_deref().unwrap_or("?"),
            text(&c.feels_like)
        ));
        lines.push(format!(
            "Humidity {}% wind {} mph UV {}",
            text(&c.humidity),
            text(&c.wind_mph),
            text(&c.uv_index)
        ));
    }
    if let Some(t) = &weather.today {
        let mut line = format!("Today {}/{}°F", text(&t.high), text(&t.low));
        if let (Some(rise), Some(set)) = (t.sunrise.as_deref(), t.sunset.as_deref())
            && !rise.is_empty()
        {
            line.push_str(&format!(" sunrise {rise} sunset {set}"));
        }
        lines.push(line);
    }
    if let Some(t) = &weather.tomorrow {
        lines.push(format!(
            "Tomorrow {}/{}°F {}",
            text(&t.high),
            text(&t.low),
            t.desc.as_deref().unwrap_or("?")
        ));
    }
    lines.extend(weather.suggestion.iter().cloned());

    let view = WidgetView::new(Domain::Weather, lines);
    Ok(match &weather.current {
        Some(c) => view.with_badge(format!("{}°F", text(&c.temp_f))),
        None => view,
    })
}

#[derive(Debug, Default, Deserialize)]
struct Board {
    #[serde(default)]
    todo: Vec<Value>,
    #[serde(default)]
    in_progress: Vec<Value>,
    #[serde(default)]
    done: Vec<Value>,
}

pub(super) fn kanban(payload: &Value) -> Result<WidgetView, RenderError> {
    let board: Board = parse(Domain::Kanban, payload)?;
    let mut lines: Vec<String> = board
        .in_progress
        .iter()
        .map(|i| format!("doing: {}", item_title(i)))
        .chain(board.todo.iter().map(|i| format!("todo: {}", item_title(i))))
        .collect();
    if !board.done.is_empty() {
        lines.push(format!("done: {}", board.done.len()));
    }

    let open = board.todo.len() + board.in_progress.len();
    let view = WidgetView::new(Domain::Kanban, lines);
    Ok(if open == 0 {
        view
    } else {
        view.with_badge(format!("{open} open"))
    })
}

#[derive(Debug, Default, Deserialize)]
struct Activities {
    #[serde(default)]
    day: Option<String>,
    #[serde(default)]
    time_of_day: Option<String>,
    #[serde(default)]
    activities: Vec<Activity>,
}

#[derive(Debug, Deserialize)]
struct Activity {
    #[serde(default)]
    title: String,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

pub(super) fn activities(payload: &Value) -> Result<WidgetView, RenderError> {
    let suggestions: Activities = parse(Domain::Activities, payload)?;
    let lines = suggestions
        .activities
        .iter()
        .map(|a| {
            let mut line = match a.icon.as_deref() {
                Some(icon) => format!("{icon} {}", a.title),
                None => a.title.clone(),
            };
            if let Some(detail) = a.detail.as_deref().filter(|d| !d.is_empty()) {
                line.push_str(&format!(": {detail}"));
            }
            line
        })
        .collect();

    let view = WidgetView::new(Domain::Activities, lines);
    Ok(match (suggestions.day, suggestions.time_of_day) {
        (Some(day), Some(when)) => view.with_badge(format!("{day} {when}")),
        (Some(day), None) => view.with_badge(day),
        _ => view,
    })
}

#[derive(Debug, Default, Deserialize)]
struct News {
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    age: Option<String>,
}

pub(super) fn news(payload: &Value) -> Result<WidgetView, RenderError> {
    let news: News = parse(Domain::News, payload)?;
    let lines = news
        .articles
        .iter()
        .map(|a| {
            let meta: Vec<&str> = [a.source.as_deref(), a.age.as_deref()]
                .into_iter()
                .flatten()
                .filter(|s| !s.is_empty())
                .collect();
            if meta.is_empty() {
                a.title.clone()
            } else {
                format!("{} ({})", a.title, meta.join(", "))
            }
        })
        .collect();

    let view = WidgetView::new(Domain::News, lines);
    Ok(match news.topic {
        Some(topic) if !topic.is_empty() => view.with_badge(topic),
        _ => view,
    })
}

pub(super) fn notifications(payload: &Value) -> Result<WidgetView, RenderError> {
    let list: NotificationList = parse(Domain::Notifications, payload)?;
    Ok(render_notification_list(&list))
}

/// Notification widget view, newest first as held. Badge is the unread count.
pub fn render_notification_list(list: &NotificationList) -> WidgetView {
    let lines = list
        .notifications
        .iter()
        .map(|n| {
            let marker = if n.read { " " } else { "*" };
            if n.message.is_empty() {
                format!("{marker} {}", n.title)
            } else {
                format!("{marker} {}: {}", n.title, n.message)
            }
        })
        .collect();

    let unread = list.notifications.iter().filter(|n| !n.read).count();
    let view = WidgetView::new(Domain::Notifications, lines);
    if unread == 0 {
        view
    } else {
        view.with_badge(unread.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
struct Calendar {
    #[serde(default)]
    by_day: BTreeMap<String, Vec<CalendarEvent>>,
}

#[derive(Debug, Deserialize)]
struct CalendarEvent {
    #[serde(default)]
    title: String,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    all_day: bool,
    #[serde(default)]
    location: Option<String>,
}

impl CalendarEvent {
    /// `HH:MM` from an ISO start, or "all day".
    fn when(&self) -> String {
        if self.all_day {
            return "all day".to_string();
        }
        self.start
            .as_deref()
            .and_then(|s| s.get(11..16))
            .unwrap_or("?")
            .to_string()
    }
}

pub(super) fn calendar(payload: &Value) -> Result<WidgetView, RenderError> {
    let calendar: Calendar = parse(Domain::Calendar, payload)?;
    let mut lines = Vec::new();
    let mut total = 0;
    for (day, events) in &calendar.by_day {
        if events.is_empty() {
            continue;
        }
        lines.push(day.clone());
        for event in events {
            total += 1;
            let mut line = format!("  {} {}", event.when(), event.title);
            if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
                line.push_str(&format!(" @ {location}"));
            }
            lines.push(line);
        }
    }

    let view = WidgetView::new(Domain::Calendar, lines);
    Ok(if total == 0 {
        view
    } else {
        view.with_badge(total.to_string())
    })
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: String,
}

/// The last few user/assistant turns, oldest first.
pub(super) fn chat(payload: &Value) -> Result<WidgetView, RenderError> {
    let history: Vec<ChatMessage> = parse(Domain::Chat, payload)?;
    let turns: Vec<&ChatMessage> = history.iter().filter(|m| m.role != "system").collect();
    let skip = turns.len().saturating_sub(MAX_CHAT_MESSAGES);
    let lines = turns
        .into_iter()
        .skip(skip)
        .map(|m| {
            let who = if m.role == "user" { "you" } else { m.role.as_str() };
            format!("{who}: {}", m.content)
        })
        .collect();
    Ok(WidgetView::new(Domain::Chat, lines))
}
