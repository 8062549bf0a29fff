#![windows_subsystem = "windows"]

mod drag;
mod gpu;
mod metrics;
mod rows;
mod theme;
mod ui;

use std::sync::OnceLock;

use iced::{Point, Size};

use ui::Overlay;

/// Logical resolution of the primary monitor, captured while the window is
/// first being placed.
static SCREEN_BOUNDS: OnceLock<Size> = OnceLock::new();

/// Bounds used for corner snapping. Falls back to 1080p when the windowing
/// backend never reported a monitor resolution.
pub fn screen_bounds() -> Size {
    SCREEN_BOUNDS
        .get()
        .copied()
        .unwrap_or(Size::new(1920.0, 1080.0))
}

/// Initial placement: snapped into the top-right corner. This callback is
/// also the one place iced hands us the monitor resolution.
fn place_top_right(window: Size, monitor: Size) -> Point {
    let _ = SCREEN_BOUNDS.set(monitor);
    Point::new(monitor.width - window.width, 0.0)
}

fn main() -> iced::Result {
    let height =
        rows::window_height(rows::visible_rows(&metrics::Snapshot::default()).len());

    iced::application(Overlay::title, Overlay::update, Overlay::view)
        .subscription(Overlay::subscription)
        .theme(Overlay::theme)
        .window(iced::window::Settings {
            size: Size::new(rows::OVERLAY_WIDTH, height),
            position: iced::window::Position::SpecificWith(place_top_right),
            resizable: false,
            decorations: false,
            level: iced::window::Level::AlwaysOnTop,
            #[cfg(target_os = "linux")]
            platform_specific: iced::window::settings::PlatformSpecific {
                application_id: String::from("limpet"),
                ..Default::default()
            },
            ..Default::default()
        })
        .run_with(|| (Overlay::new(), iced::Task::none()))
}
