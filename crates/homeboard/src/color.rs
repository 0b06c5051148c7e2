//! Terminal colors for dashboard output.
//!
//! Everything goes through `owo-colors`' `if_supports_color()`, so `NO_COLOR`,
//! `FORCE_COLOR` and TTY detection are honoured. `--no-color` sets an
//! in-process flag that skips styling entirely.

use std::sync::atomic::{AtomicBool, Ordering};

use owo_colors::OwoColorize;
use owo_colors::Stream::{self, Stderr, Stdout};

static NO_COLOR_FLAG: AtomicBool = AtomicBool::new(false);

/// Call once from main.rs when `--no-color` is passed.
pub fn set_no_color() {
    NO_COLOR_FLAG.store(true, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy)]
struct Rgb {
    r: u8,
    g: u8,
    b: u8,
}

impl Rgb {
    const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }
}

const LAMP: Rgb = Rgb::from_hex(0xE8C170); // Widget titles
const MOSS: Rgb = Rgb::from_hex(0x7FA66A); // Online
const DUSK: Rgb = Rgb::from_hex(0xD08850); // Badges, warnings
const BRICK: Rgb = Rgb::from_hex(0xC0584C); // Reconnecting, errors
const SLATE: Rgb = Rgb::from_hex(0x6A7280); // Secondary text

fn no_color() -> bool {
    NO_COLOR_FLAG.load(Ordering::Relaxed)
}

fn paint(text: &str, stream: Stream, rgb: Rgb) -> String {
    if no_color() {
        return text.to_string();
    }
    text.if_supports_color(stream, |t| t.truecolor(rgb.r, rgb.g, rgb.b))
        .to_string()
}

pub fn title(text: &str) -> String {
    paint(text, Stdout, LAMP)
}

pub fn online(text: &str) -> String {
    paint(text, Stdout, MOSS)
}

pub fn badge(text: &str) -> String {
    paint(text, Stdout, DUSK)
}

pub fn offline(text: &str) -> String {
    paint(text, Stdout, BRICK)
}

pub fn muted(text: &str) -> String {
    paint(text, Stdout, SLATE)
}

/// Error styling for stderr.
pub fn error(text: &str) -> String {
    paint(text, Stderr, BRICK)
}

/// Warning styling for stderr.
pub fn warning(text: &str) -> String {
    paint(text, Stderr, DUSK)
}

/// Hint styling for stderr.
pub fn hint(text: &str) -> String {
    paint(text, Stderr, SLATE)
}
