use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::filter::Category;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            hsl_to_color32(hue, 0.75, 0.55)
        })
        .collect()
}

fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Significance colours
// ---------------------------------------------------------------------------

/// Colour of a significance category in volcano / MA plots and the DEG table.
pub fn category_color(category: Category) -> Color32 {
    match category {
        Category::Up => hsl_to_color32(0.0, 0.75, 0.55),
        Category::Down => hsl_to_color32(215.0, 0.75, 0.55),
        Category::NotSignificant => Color32::GRAY,
        Category::NotEvaluated => Color32::from_gray(70),
    }
}

/// Legend entries (label → colour) for the UI.
pub fn legend_entries() -> Vec<(String, Color32)> {
    Category::ALL
        .iter()
        .map(|&c| (c.to_string(), category_color(c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colors() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(4);
        assert_eq!(p.len(), 4);
        for i in 0..p.len() {
            for j in i + 1..p.len() {
                assert_ne!(p[i], p[j]);
            }
        }
    }

    #[test]
    fn up_and_down_are_distinguishable() {
        assert_ne!(category_color(Category::Up), category_color(Category::Down));
        assert_eq!(legend_entries().len(), 4);
    }
}
