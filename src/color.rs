//! Color resolution utilities
//!
//! Resolves direct RGB, theme-slot (with tint), legacy indexed and automatic
//! color references into bare `RRGGBB` hex strings. Every lookup failure is
//! soft: the caller gets `None` and leaves the property unset.

use crate::types::{ColorRef, ThemePalette};

/// Legacy 64-entry indexed palette.
pub const INDEXED_COLORS: [&str; 64] = [
    "000000", "FFFFFF", "FF0000", "00FF00", "0000FF", "FFFF00", "FF00FF", "00FFFF",
    "000000", "FFFFFF", "FF0000", "00FF00", "0000FF", "FFFF00", "FF00FF", "00FFFF",
    "800000", "008000", "000080", "808000", "800080", "008080", "C0C0C0", "808080",
    "9999FF", "993366", "FFFFCC", "CCFFFF", "660066", "FF8080", "0066CC", "CCCCFF",
    "000080", "FF00FF", "FFFF00", "00FFFF", "800080", "800000", "008080", "0000FF",
    "00CCFF", "CCFFFF", "CCFFCC", "FFFF99", "99CCFF", "FF99CC", "CC99FF", "FFCC99",
    "3366FF", "33CCCC", "99CC00", "FFCC00", "FF9900", "FF6600", "666699", "969696",
    "003366", "339966", "003300", "333300", "993300", "993366", "333399", "333333",
];

/// Theme slot that a font color treats as "automatic text color".
pub const AUTOMATIC_FONT_THEME_SLOT: u32 = 1;

/// Resolve a color reference to `RRGGBB`.
///
/// `palette` is `None` when the package carries no theme; theme references
/// are then unresolved.
pub fn resolve_color(color: &ColorRef, palette: Option<&ThemePalette>) -> Option<String> {
    match color {
        ColorRef::Rgb(rgb) => Some(normalize_rgb(rgb)),
        ColorRef::Theme { index, tint } => {
            let base = palette?.slot(*index)?;
            let base = parse_rgb(base)?;
            let (r, g, b) = match tint {
                Some(t) => tint_rgb(base, *t),
                None => base,
            };
            Some(format!("{r:02X}{g:02X}{b:02X}"))
        }
        ColorRef::Indexed(64) => Some("000000".to_string()),
        ColorRef::Indexed(index) => usize::try_from(*index)
            .ok()
            .and_then(|i| INDEXED_COLORS.get(i))
            .map(|c| (*c).to_string()),
        ColorRef::Auto => None,
    }
}

/// Font colors on [`AUTOMATIC_FONT_THEME_SLOT`] mean "use the default text
/// color" and stay unset.
pub fn resolve_font_color(color: &ColorRef, palette: Option<&ThemePalette>) -> Option<String> {
    if let ColorRef::Theme { index, .. } = color {
        if *index == AUTOMATIC_FONT_THEME_SLOT {
            return None;
        }
    }
    resolve_color(color, palette)
}

/// Strip a leading `#` and the alpha pair of 8-digit ARGB values.
pub fn normalize_rgb(raw: &str) -> String {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() == 8 && hex.is_ascii() {
        return hex.get(2..).unwrap_or(hex).to_string();
    }
    hex.to_string()
}

/// Apply a tint to an `RRGGBB` value.
///
/// Negative tints darken each channel towards 0, positive tints lighten it
/// towards 255. Returns `None` for a malformed base color.
pub fn apply_tint(hex: &str, tint: f64) -> Option<String> {
    let (r, g, b) = tint_rgb(parse_rgb(hex)?, tint);
    Some(format!("{r:02X}{g:02X}{b:02X}"))
}

fn tint_rgb((r, g, b): (u8, u8, u8), tint: f64) -> (u8, u8, u8) {
    if !tint.is_finite() {
        return (r, g, b);
    }
    (tint_channel(r, tint), tint_channel(g, tint), tint_channel(b, tint))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn tint_channel(channel: u8, tint: f64) -> u8 {
    let c = f64::from(channel);
    let adjusted = if tint < 0.0 {
        (c * (1.0 + tint)).round()
    } else {
        (255.0 - c).mul_add(tint, c).round()
    };
    adjusted.clamp(0.0, 255.0) as u8
}

fn parse_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = normalize_rgb(hex);
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some((r, g, b))
}

/// Palette slot for a WordprocessingML `w:themeColor` name.
pub fn theme_slot_for_name(name: &str) -> Option<u32> {
    let slot = match name {
        "dark1" | "text1" => 0,
        "light1" | "background1" => 1,
        "dark2" | "text2" => 2,
        "light2" | "background2" => 3,
        "accent1" => 4,
        "accent2" => 5,
        "accent3" => 6,
        "accent4" => 7,
        "accent5" => 8,
        "accent6" => 9,
        "hyperlink" => 10,
        "followedHyperlink" => 11,
        _ => return None,
    };
    Some(slot)
}

/// Tint equivalent of `w:themeTint` / `w:themeShade` hex bytes.
///
/// A tint byte `t` lightens by `1 - t/255`; a shade byte `s` darkens by the
/// same amount. Tint wins when both are present.
pub fn word_theme_tint(theme_tint: Option<&str>, theme_shade: Option<&str>) -> Option<f64> {
    let byte = |s: &str| u8::from_str_radix(s.trim(), 16).ok().map(f64::from);
    if let Some(t) = theme_tint.and_then(byte) {
        return Some(1.0 - t / 255.0);
    }
    theme_shade.and_then(byte).map(|s| -(1.0 - s / 255.0))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn office_palette() -> ThemePalette {
        let colors = [
            "000000", "FFFFFF", "44546A", "E7E6E6", "4472C4", "ED7D31", "A5A5A5", "FFC000",
            "5B9BD5", "70AD47", "0563C1", "954F72",
        ];
        let mut palette = ThemePalette::default();
        for (slot, color) in palette.slots.iter_mut().zip(colors) {
            *slot = Some(color.to_string());
        }
        palette
    }

    fn theme(index: u32, tint: Option<f64>) -> ColorRef {
        ColorRef::Theme { index, tint }
    }

    // =========================================================================
    // Direct RGB
    // =========================================================================

    #[test_case("FF112233", "112233"; "argb drops alpha")]
    #[test_case("112233", "112233"; "rgb verbatim")]
    #[test_case("#00FF00", "00FF00"; "leading hash")]
    #[test_case("80FFFF00", "FFFF00"; "translucent alpha dropped")]
    fn test_rgb_normalization(input: &str, expected: &str) {
        let resolved = resolve_color(&ColorRef::Rgb(input.to_string()), None);
        assert_eq!(resolved.as_deref(), Some(expected));
    }

    // =========================================================================
    // Theme slots
    // =========================================================================

    #[test]
    fn test_zero_tint_returns_base_for_every_slot() {
        let palette = office_palette();
        for index in 0..12 {
            let base = palette.slot(index).unwrap().to_string();
            assert_eq!(resolve_color(&theme(index, Some(0.0)), Some(&palette)), Some(base.clone()));
            assert_eq!(resolve_color(&theme(index, None), Some(&palette)), Some(base));
        }
    }

    #[test]
    fn test_theme_out_of_range_or_missing_palette() {
        let palette = office_palette();
        assert_eq!(resolve_color(&theme(12, None), Some(&palette)), None);
        assert_eq!(resolve_color(&theme(4, None), None), None);

        let mut sparse = ThemePalette::default();
        sparse.slots[0] = Some("000000".to_string());
        assert_eq!(resolve_color(&theme(4, None), Some(&sparse)), None);
    }

    #[test]
    fn test_tint_formula() {
        // 0x44 = 68; 68 + (255 - 68) * 0.4 = 142.8 -> 143 = 0x8F
        assert_eq!(apply_tint("444444", 0.4).as_deref(), Some("8F8F8F"));
        // 200 * 0.75 = 150 = 0x96
        assert_eq!(apply_tint("C8C8C8", -0.25).as_deref(), Some("969696"));
        assert_eq!(apply_tint("000000", 0.5).as_deref(), Some("808080"));
        assert_eq!(apply_tint("FFFFFF", -0.5).as_deref(), Some("808080"));
    }

    #[test_case(1.0, "FFFFFF"; "full tint")]
    #[test_case(-1.0, "000000"; "full shade")]
    #[test_case(3.0, "FFFFFF"; "overshoot clamps high")]
    #[test_case(-3.0, "000000"; "overshoot clamps low")]
    fn test_tint_extremes_clamp(tint: f64, expected: &str) {
        let palette = office_palette();
        for index in 0..12 {
            assert_eq!(
                resolve_color(&theme(index, Some(tint)), Some(&palette)).as_deref(),
                Some(expected)
            );
        }
    }

    #[test]
    fn test_tint_on_malformed_base_is_unresolved() {
        assert_eq!(apply_tint("XYZ", 0.5), None);
        let mut palette = ThemePalette::default();
        palette.slots[4] = Some("nothex".to_string());
        assert_eq!(resolve_color(&theme(4, Some(0.2)), Some(&palette)), None);
    }

    // =========================================================================
    // Indexed / auto / font colors
    // =========================================================================

    #[test]
    fn test_indexed_and_auto() {
        assert_eq!(resolve_color(&ColorRef::Indexed(2), None).as_deref(), Some("FF0000"));
        assert_eq!(resolve_color(&ColorRef::Indexed(64), None).as_deref(), Some("000000"));
        assert_eq!(resolve_color(&ColorRef::Indexed(90), None), None);
        assert_eq!(resolve_color(&ColorRef::Auto, None), None);
    }

    #[test]
    fn test_font_color_skips_automatic_slot() {
        let palette = office_palette();
        assert_eq!(resolve_font_color(&theme(1, None), Some(&palette)), None);
        assert_eq!(
            resolve_font_color(&theme(4, None), Some(&palette)).as_deref(),
            Some("4472C4")
        );
        // Fills still resolve slot 1.
        assert_eq!(resolve_color(&theme(1, None), Some(&palette)).as_deref(), Some("FFFFFF"));
    }

    #[test]
    fn test_word_theme_names_and_tints() {
        assert_eq!(theme_slot_for_name("text1"), Some(0));
        assert_eq!(theme_slot_for_name("accent6"), Some(9));
        assert_eq!(theme_slot_for_name("followedHyperlink"), Some(11));
        assert_eq!(theme_slot_for_name("purple"), None);

        assert_eq!(word_theme_tint(Some("FF"), None), Some(0.0));
        assert_eq!(word_theme_tint(None, Some("00")), Some(-1.0));
        let tint = word_theme_tint(Some("99"), None).unwrap();
        assert!((tint - 0.4).abs() < 1e-9);
        assert_eq!(word_theme_tint(None, None), None);
    }
}
