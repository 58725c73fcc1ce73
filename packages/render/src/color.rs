//! Blue → green → red color ramp used for the choropleth and its legend.
//!
//! Higher values read as higher alarm: the low end of the range is pure
//! blue (`#0000ff`), the middle pure green (`#00ff00`) and the top pure
//! red (`#ff0000`).

/// Color returned when the range is degenerate or the value is not finite.
pub const FALLBACK_COLOR: &str = "#376e21";

/// Maps `value` within `[min, max]` to a hex RGB color.
///
/// Values outside the range are clamped to its ends. A zero-width range
/// yields [`FALLBACK_COLOR`].
#[must_use]
#[allow(clippy::float_cmp)]
pub fn color(value: f64, min: f64, max: f64) -> String {
    let span = max - min;
    if span == 0.0 || !span.is_finite() || !value.is_finite() {
        return FALLBACK_COLOR.to_string();
    }
    let t = ((value - min) / span).clamp(0.0, 1.0);
    let [r, g, b] = ramp(t);
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// `samples` colors evenly spaced from `min` to `max` inclusive.
#[must_use]
pub fn gradient(min: f64, max: f64, samples: usize) -> Vec<String> {
    match samples {
        0 => Vec::new(),
        1 => vec![color(min, min, max)],
        _ => {
            #[allow(clippy::cast_precision_loss)]
            let step = (max - min) / (samples - 1) as f64;
            (0..samples)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let value = if i + 1 == samples {
                        max
                    } else {
                        (i as f64).mul_add(step, min)
                    };
                    color(value, min, max)
                })
                .collect()
        }
    }
}

/// RGB channels at normalized position `t` in `[0, 1]`.
fn ramp(t: f64) -> [u8; 3] {
    if t < 0.5 {
        let s = 2.0 * t;
        [0, channel(s), channel(1.0 - s)]
    } else {
        let s = 2.0 * (t - 0.5);
        [channel(s), channel(1.0 - s), 0]
    }
}

/// Scales an intensity in `[0, 1]` to 0..=255, truncating.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(intensity: f64) -> u8 {
    (255.0 * intensity) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(hex: &str) -> [u8; 3] {
        let parse = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap();
        [parse(1), parse(3), parse(5)]
    }

    /// Position along the ramp: 0..=510 on the blue→green leg (green
    /// rising, blue falling), above 510 once red appears.
    fn ramp_position(hex: &str) -> i32 {
        let [r, g, b] = rgb(hex);
        if r == 0 {
            i32::from(g) - i32::from(b) + 255
        } else {
            510 + i32::from(r)
        }
    }

    #[test]
    fn ends_of_the_ramp() {
        assert_eq!(color(2.0, 2.0, 8.0), "#0000ff");
        assert_eq!(color(5.0, 2.0, 8.0), "#00ff00");
        assert_eq!(color(8.0, 2.0, 8.0), "#ff0000");
    }

    #[test]
    fn quarter_points_truncate_channels() {
        // t = 0.25: green 127.5 -> 127, blue 127.5 -> 127
        assert_eq!(color(1.0, 0.0, 4.0), "#007f7f");
        // t = 0.75: red 127, green 127
        assert_eq!(color(3.0, 0.0, 4.0), "#7f7f00");
    }

    #[test]
    fn output_is_zero_padded_lowercase_hex() {
        let c = color(0.01, 0.0, 1.0);
        assert_eq!(c.len(), 7);
        assert!(c.starts_with('#'));
        assert!(c[1..].chars().all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_uppercase()));
        assert_eq!(&c[1..3], "00");
    }

    #[test]
    fn degenerate_range_uses_fallback() {
        assert_eq!(color(3.0, 3.0, 3.0), FALLBACK_COLOR);
        assert_eq!(color(7.0, 3.0, 3.0), FALLBACK_COLOR);
        assert_eq!(color(f64::NAN, 0.0, 1.0), FALLBACK_COLOR);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(color(-10.0, 0.0, 1.0), "#0000ff");
        assert_eq!(color(10.0, 0.0, 1.0), "#ff0000");
    }

    #[test]
    fn ramp_is_monotonic() {
        let colors = gradient(0.0, 1.0, 1_000);
        for pair in colors.windows(2) {
            assert!(
                ramp_position(&pair[0]) <= ramp_position(&pair[1]),
                "{} came after {}",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn gradient_spans_the_range() {
        let colors = gradient(10.0, 20.0, 100);
        assert_eq!(colors.len(), 100);
        assert_eq!(colors[0], "#0000ff");
        assert_eq!(colors[99], "#ff0000");
        assert!(gradient(5.0, 5.0, 100).iter().all(|c| c == FALLBACK_COLOR));
        assert!(gradient(0.0, 1.0, 0).is_empty());
    }
}
