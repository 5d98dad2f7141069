use ratatui::style::Color;

/// Catppuccin Mocha-inspired dark theme with 24-bit RGB colors
pub struct Theme {
    pub bg: Color,
    pub bg_surface: Color,
    pub fg: Color,
    pub fg_dim: Color,
    pub fg_muted: Color,

    pub blue: Color,
    pub green: Color,
    pub yellow: Color,
    pub red: Color,

    pub border: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,

    // Share-of-edges gradient (green -> yellow -> red)
    pub share_low: Color,
    pub share_medium: Color,
    pub share_high: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bg: Color::Rgb(30, 30, 46),         // Base
            bg_surface: Color::Rgb(49, 50, 68), // Surface0
            fg: Color::Rgb(205, 214, 244),      // Text
            fg_dim: Color::Rgb(166, 173, 200),  // Subtext0
            fg_muted: Color::Rgb(127, 132, 156), // Overlay0

            blue: Color::Rgb(137, 180, 250),   // Blue
            green: Color::Rgb(166, 227, 161),  // Green
            yellow: Color::Rgb(249, 226, 175), // Yellow
            red: Color::Rgb(243, 139, 168),    // Red

            border: Color::Rgb(88, 91, 112),         // Surface2
            selection_bg: Color::Rgb(137, 180, 250), // Blue
            selection_fg: Color::Rgb(30, 30, 46),    // Base

            share_low: Color::Rgb(166, 227, 161),
            share_medium: Color::Rgb(249, 226, 175),
            share_high: Color::Rgb(243, 139, 168),
        }
    }
}

impl Theme {
    /// Color for a library's share of all dependency edges (0-100).
    /// Even libc rarely exceeds a few percent, so the scale is compressed.
    pub fn share_color(&self, percentage: f64) -> Color {
        if percentage < 0.5 {
            self.share_low
        } else if percentage < 2.0 {
            let t = (percentage - 0.5) / 1.5;
            interpolate_color(self.share_low, self.share_medium, t)
        } else {
            let t = ((percentage - 2.0) / 6.0).min(1.0);
            interpolate_color(self.share_medium, self.share_high, t)
        }
    }
}

fn interpolate_color(from: Color, to: Color, t: f64) -> Color {
    match (from, to) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            Color::Rgb(lerp(r1, r2, t), lerp(g1, g2, t), lerp(b1, b2, t))
        }
        _ => to,
    }
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    let (a, b) = (a as f64, b as f64);
    (a + (b - a) * t).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_color_bounds() {
        let theme = Theme::default();
        assert_eq!(theme.share_color(0.0), theme.share_low);
        assert_eq!(theme.share_color(2.0), theme.share_medium);
        assert_eq!(theme.share_color(50.0), theme.share_high);
    }
}
