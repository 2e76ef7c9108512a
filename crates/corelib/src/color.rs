//! Hex color strings: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.

use crate::error::ColorError;

/// Parses a hex color into normalized RGBA. Alpha defaults to 1.0.
pub fn parse_hex_color(tok: &str) -> Result<[f32; 4], ColorError> {
    let s = tok.trim();
    let hex = s.strip_prefix('#').ok_or(ColorError::MissingHash)?;
    if !hex.is_ascii() {
        return Err(ColorError::BadDigit(hex.to_string()));
    }

    let digits: Vec<u8> = match hex.len() {
        3 | 4 => hex
            .chars()
            .map(|c| parse_channel(&format!("{c}{c}")))
            .collect::<Result<_, _>>()?,
        6 | 8 => (0..hex.len())
            .step_by(2)
            .map(|i| parse_channel(&hex[i..i + 2]))
            .collect::<Result<_, _>>()?,
        n => return Err(ColorError::BadLength(n)),
    };

    let mut rgba = [1.0f32; 4];
    for (dst, v) in rgba.iter_mut().zip(digits) {
        *dst = v as f32 / 255.0;
    }
    Ok(rgba)
}

fn parse_channel(pair: &str) -> Result<u8, ColorError> {
    u8::from_str_radix(pair, 16).map_err(|_| ColorError::BadDigit(pair.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rgba(got: [f32; 4], want: [f32; 4]) {
        for (g, w) in got.iter().zip(want) {
            assert!((g - w).abs() < 1e-3, "{got:?} vs {want:?}");
        }
    }

    #[test]
    fn six_digit_color() {
        assert_rgba(parse_hex_color("#445566").unwrap(), [0.2667, 0.3333, 0.4, 1.0]);
    }

    #[test]
    fn short_forms_replicate_digits() {
        assert_rgba(parse_hex_color("#fff").unwrap(), [1.0, 1.0, 1.0, 1.0]);
        assert_rgba(parse_hex_color("#4568").unwrap(), parse_hex_color("#44556688").unwrap());
    }

    #[test]
    fn alpha_channel() {
        assert_rgba(parse_hex_color(" #00000080 ").unwrap(), [0.0, 0.0, 0.0, 0.502]);
    }

    #[test]
    fn malformed_colors() {
        assert_eq!(parse_hex_color("445566"), Err(ColorError::MissingHash));
        assert_eq!(parse_hex_color("#12345"), Err(ColorError::BadLength(5)));
        assert_eq!(parse_hex_color("#gg0000"), Err(ColorError::BadDigit("gg".into())));
        assert!(parse_hex_color("#é12").is_err());
    }
}
