//! Infrastructure widgets: health, infra, cameras, topology, speed tests.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use homeboard_protocol::Domain;
use serde::Deserialize;
use serde_json::Value;

use super::{WidgetView, parse, text};
use crate::errors::RenderError;

const MAX_CAMERA_EVENTS: usize = 10;
const MAX_SPEEDTESTS: usize = 5;

#[derive(Debug, Default, Deserialize)]
struct Health {
    #[serde(default)]
    uptime: Option<String>,
    #[serde(default)]
    memory: Option<Memory>,
}

#[derive(Debug, Deserialize)]
struct Memory {
    #[serde(default)]
    status: String,
}

pub(super) fn health(payload: &Value) -> Result<WidgetView, RenderError> {
    let health: Health = parse(Domain::Health, payload)?;
    let mut lines = Vec::new();
    if let Some(uptime) = &health.uptime {
        lines.push(format!("Uptime {uptime}"));
    }
    if let Some(memory) = &health.memory {
        lines.push(format!("Memory {}", memory.status));
    }

    let view = WidgetView::new(Domain::Health, lines);
    Ok(match health.memory {
        Some(memory) if memory.status != "healthy" => view.with_badge(memory.status),
        _ => view,
    })
}

#[derive(Debug, Deserialize)]
struct Service {
    #[serde(default)]
    status: String,
    #[serde(default)]
    ip: Option<String>,
    #[serde(default)]
    devices_online: Option<u64>,
    #[serde(default)]
    devices_total: Option<u64>,
    #[serde(default)]
    cpu_load: Option<Value>,
}

pub(super) fn infra(payload: &Value) -> Result<WidgetView, RenderError> {
    let services: BTreeMap<String, Service> = parse(Domain::Infra, payload)?;
    let online = services.values().filter(|s| s.status == "online").count();

    let lines = services
        .iter()
        .map(|(name, s)| {
            let mut line = format!("{name}: {}", s.status);
            if let Some(ip) = &s.ip {
                line.push_str(&format!(" ({ip})"));
            }
            if let (Some(up), Some(total)) = (s.devices_online, s.devices_total) {
                line.push_str(&format!(" {up}/{total} devices"));
            }
            if let Some(cpu) = &s.cpu_load {
                line.push_str(&format!(" cpu {}%", text(cpu)));
            }
            line
        })
        .collect();

    let view = WidgetView::new(Domain::Infra, lines);
    Ok(if services.is_empty() {
        view
    } else {
        view.with_badge(format!("{online}/{} online", services.len()))
    })
}

#[derive(Debug, Deserialize)]
struct CameraEvent {
    #[serde(default)]
    camera: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    /// Seconds since the epoch.
    #[serde(default)]
    start: Option<f64>,
}

fn clock_time(epoch_secs: f64) -> Option<String> {
    let dt = DateTime::from_timestamp(epoch_secs.trunc() as i64, 0)?;
    Some(dt.with_timezone(&Local).format("%H:%M").to_string())
}

/// Newest NVR events as delivered, capped.
pub(super) fn cameras(payload: &Value) -> Result<WidgetView, RenderError> {
    let events: Vec<CameraEvent> = parse(Domain::Cameras, payload)?;
    let lines = events
        .iter()
        .take(MAX_CAMERA_EVENTS)
        .map(|e| {
            let camera = e.camera.as_deref().unwrap_or("?");
            let label = e.label.as_deref().unwrap_or("object");
            let mut line = format!("{camera}: {label}");
            if let Some(score) = e.score {
                line.push_str(&format!(" {}%", (score * 100.0).round() as i64));
            }
            match e.start.and_then(clock_time) {
                Some(at) => format!("{at} {line}"),
                None => line,
            }
        })
        .collect();

    let view = WidgetView::new(Domain::Cameras, lines);
    Ok(if events.is_empty() {
        view
    } else {
        view.with_badge(events.len().to_string())
    })
}

#[derive(Debug, Default, Deserialize)]
struct Topology {
    #[serde(default)]
    router: Option<Router>,
    #[serde(default)]
    vlans: Vec<Value>,
    #[serde(default)]
    meraki_devices: Vec<MerakiDevice>,
    #[serde(default)]
    dhcp_leases: Vec<Value>,
    #[serde(default)]
    interfaces: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Router {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MerakiDevice {
    #[serde(default)]
    status: String,
}

pub(super) fn topology(payload: &Value) -> Result<WidgetView, RenderError> {
    let topo: Topology = parse(Domain::Topology, payload)?;
    let mut lines = Vec::new();

    if let Some(router) = &topo.router {
        let name = router.name.as_deref().unwrap_or("router");
        match router.version.as_deref() {
            Some(version) => lines.push(format!("Router {name} v{version}")),
            None => lines.push(format!("Router {name}")),
        }
    }
    if !topo.interfaces.is_empty() {
        lines.push(format!("Interfaces {}", topo.interfaces.len()));
    }
    if !topo.vlans.is_empty() {
        lines.push(format!("VLANs {}", topo.vlans.len()));
    }
    if !topo.meraki_devices.is_empty() {
        let online = topo
            .meraki_devices
            .iter()
            .filter(|d| d.status == "online")
            .count();
        lines.push(format!(
            "Meraki {online}/{} online",
            topo.meraki_devices.len()
        ));
    }
    if !topo.dhcp_leases.is_empty() {
        lines.push(format!("DHCP leases {}", topo.dhcp_leases.len()));
    }

    Ok(WidgetView::new(Domain::Topology, lines))
}

#[derive(Debug, Default, Deserialize)]
struct SpeedtestHistory {
    #[serde(default)]
    results: Vec<SpeedtestResult>,
}

#[derive(Debug, Deserialize)]
struct SpeedtestResult {
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    download_mbps: f64,
    #[serde(default)]
    upload_mbps: f64,
    #[serde(default)]
    ping_ms: f64,
    #[serde(default)]
    server: Option<Value>,
}

/// History is stored oldest first; show the newest few, newest first.
pub(super) fn speedtest(payload: &Value) -> Result<WidgetView, RenderError> {
    let history: SpeedtestHistory = parse(Domain::Speedtest, payload)?;
    let lines = history
        .results
        .iter()
        .rev()
        .take(MAX_SPEEDTESTS)
        .map(|r| {
            let when: String = r.timestamp.chars().take(16).collect::<String>().replace('T', " ");
            let mut line = format!(
                "{when} down {:.1} up {:.1} Mbps ping {:.1} ms",
                r.download_mbps, r.upload_mbps, r.ping_ms
            );
            if let Some(server) = &r.server {
                line.push_str(&format!(" ({})", text(server)));
            }
            line
        })
        .collect();

    let view = WidgetView::new(Domain::Speedtest, lines);
    Ok(match history.results.last() {
        Some(latest) => view.with_badge(format!("{:.1} Mbps", latest.download_mbps)),
        None => view,
    })
}
