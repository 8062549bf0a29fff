use iced::Color;

/// Semantic colors for the overlay surface.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg: Color,
    pub text: Color,
    pub close_bg: Color,
    pub close_text: Color,
}

/// The overlay is a dark card on every platform; there is no light variant.
pub const fn palette() -> Palette {
    Palette {
        bg: hex(0x11, 0x11, 0x11),
        text: hex(0xee, 0xee, 0xee),
        close_bg: hex(0x88, 0x33, 0x33),
        close_text: hex(0xff, 0xff, 0xff),
    }
}

const fn hex(r: u8, g: u8, b: u8) -> Color {
    Color::from_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}
