//! Heads-up display drawing for the Macroquad rendering backend.
//!
//! The HUD lives in screen space and ignores the world-to-screen scaling
//! applied to terrain and cities.

use macroquad::{color::BLACK, shapes::draw_rectangle, text::draw_text};
use traffic_manager_rendering::HudPresentation;

use crate::to_macroquad_color;

const FONT_SIZE: f32 = 20.0;
const LINE_SPACING: f32 = 4.0;
const PADDING: f32 = 12.0;

/// Draws the HUD panel and its label.
pub(crate) fn draw_hud(hud: &HudPresentation) {
    draw_rectangle(
        hud.origin.x,
        hud.origin.y,
        hud.size.x,
        hud.size.y,
        to_macroquad_color(hud.color),
    );

    for (line, baseline) in hud.label.lines().zip(line_baselines(hud)) {
        let _ = draw_text(line, hud.origin.x + PADDING, baseline, FONT_SIZE, BLACK);
    }
}

/// Baselines of the label lines that fit inside the panel, top to bottom.
fn line_baselines(hud: &HudPresentation) -> impl Iterator<Item = f32> {
    let top = hud.origin.y + PADDING + FONT_SIZE;
    let bottom = hud.origin.y + hud.size.y - PADDING;
    (0..)
        .map(move |line| top + line as f32 * (FONT_SIZE + LINE_SPACING))
        .take_while(move |baseline| *baseline <= bottom)
}
