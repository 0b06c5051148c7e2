//! Line commands typed into a running `watch`.

use homeboard_core::{Action, Domain};
use homeboard_protocol::{LightMode, MediaCommand};

pub(crate) const HELP: &str = "\
commands:
  scene <entity_id>             trigger a scene
  light <on|off|toggle> <room>  switch a room's lights
  media <entity_id> <command>   play_pause, next, volume_up, ...
  chat <message>                send a chat message
  read <notification_id>        mark a notification read
  speedtest                     run a speed test
  timer <minutes> [label]       start a countdown timer
  dismiss <timer_id>            remove a timer
  refresh <domain>              poll a domain now
  toggle <widget>               collapse or expand a widget
  help
  quit";

#[derive(Debug, PartialEq)]
pub(crate) enum Intent {
    Act(Action),
    StartTimer { minutes: String, label: String },
    Dismiss(u64),
    Refresh(Domain),
    Toggle(String),
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`; the error is a
/// message for the user.
pub(crate) fn parse_intent(line: &str) -> Result<Option<Intent>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let intent = match verb {
        "scene" => Intent::Act(Action::TriggerScene {
            entity_id: required(rest, "scene <entity_id>")?.to_string(),
        }),
        "light" => {
            let (mode, room) = rest
                .split_once(char::is_whitespace)
                .ok_or("usage: light <on|off|toggle> <room>")?;
            let mode: LightMode = mode.parse().map_err(|e| format!("{e}"))?;
            Intent::Act(Action::ToggleLights {
                room: room.trim().to_string(),
                mode,
            })
        }
        "media" => {
            let (entity_id, command) = rest
                .split_once(char::is_whitespace)
                .ok_or("usage: media <entity_id> <command>")?;
            let command: MediaCommand = command.trim().parse().map_err(|e| format!("{e}"))?;
            Intent::Act(Action::MediaControl {
                entity_id: entity_id.to_string(),
                command,
            })
        }
        // Blank chat text is left to action validation, which drops it silently.
        "chat" => Intent::Act(Action::SendChat {
            message: rest.to_string(),
        }),
        "read" => Intent::Act(Action::MarkNotificationRead {
            id: required(rest, "read <notification_id>")?.to_string(),
        }),
        "speedtest" => Intent::Act(Action::RunSpeedtest),
        "timer" => {
            let minutes = required(rest, "timer <minutes> [label]")?;
            let (minutes, label) = match minutes.split_once(char::is_whitespace) {
                Some((minutes, label)) => (minutes, label.trim()),
                None => (minutes, ""),
            };
            Intent::StartTimer {
                minutes: minutes.to_string(),
                label: label.to_string(),
            }
        }
        "dismiss" => {
            let id = required(rest, "dismiss <timer_id>")?;
            Intent::Dismiss(
                id.parse()
                    .map_err(|_| format!("'{id}' is not a timer id"))?,
            )
        }
        "refresh" => {
            let slug = required(rest, "refresh <domain>")?;
            Intent::Refresh(
                Domain::from_slug(slug).ok_or_else(|| format!("unknown domain '{slug}'"))?,
            )
        }
        "toggle" => Intent::Toggle(required(rest, "toggle <widget>")?.to_string()),
        "help" | "?" => Intent::Help,
        "quit" | "exit" => Intent::Quit,
        other => return Err(format!("unknown command '{other}', type 'help'")),
    };
    Ok(Some(intent))
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("usage: {usage}"))
    } else {
        Ok(rest)
    }
}
