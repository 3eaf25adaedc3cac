//! PM2.5 to bulb color mapping
//!
//! Fixed step bands, evaluated top-down. A value selects the first band whose
//! threshold it strictly exceeds, so an exact threshold lands in the band below.

/// Color used when there is no valid PM2.5 value
pub const NO_DATA_COLOR: &str = "#D3D3D3";

/// One color band: values strictly greater than `threshold` select `hex`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorBand {
    pub threshold: f64,
    pub hex: &'static str,
}

/// Bands ordered from highest threshold to lowest
pub const COLOR_BANDS: [ColorBand; 11] = [
    ColorBand { threshold: 100.0, hex: "#640100" },
    ColorBand { threshold: 90.0, hex: "#9a0100" },
    ColorBand { threshold: 80.0, hex: "#cc0001" },
    ColorBand { threshold: 70.0, hex: "#fe0002" },
    ColorBand { threshold: 60.0, hex: "#fd6866" },
    ColorBand { threshold: 50.0, hex: "#ff9835" },
    ColorBand { threshold: 40.0, hex: "#ffcb00" },
    ColorBand { threshold: 30.0, hex: "#fffe03" },
    ColorBand { threshold: 20.0, hex: "#016797" },
    ColorBand { threshold: 10.0, hex: "#0099cb" },
    ColorBand { threshold: 0.0, hex: "#01cbff" },
];

/// Color for a corrected PM2.5 value. NaN and values <= 0 map to [`NO_DATA_COLOR`].
pub fn pm25_color(value: f64) -> &'static str {
    COLOR_BANDS
        .iter()
        .find(|band| value > band.threshold)
        .map(|band| band.hex)
        .unwrap_or(NO_DATA_COLOR)
}

/// Color for an optional value
pub fn color_for(value: Option<f64>) -> &'static str {
    value.map(pm25_color).unwrap_or(NO_DATA_COLOR)
}

/// Color for a textual value; anything that is not a number maps to [`NO_DATA_COLOR`]
pub fn color_for_str(value: &str) -> &'static str {
    color_for(value.trim().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_and_negative_are_grey() {
        assert_eq!(pm25_color(0.0), NO_DATA_COLOR);
        assert_eq!(pm25_color(-3.0), NO_DATA_COLOR);
    }

    #[test]
    fn test_exact_threshold_falls_to_lower_band() {
        assert_eq!(pm25_color(10.0), "#01cbff");
        assert_eq!(pm25_color(10.0001), "#0099cb");
        assert_eq!(pm25_color(20.0), "#0099cb");
        assert_eq!(pm25_color(100.0), "#9a0100");
    }

    #[test]
    fn test_top_band_is_open_ended() {
        assert_eq!(pm25_color(150.0), "#640100");
        assert_eq!(pm25_color(f64::INFINITY), "#640100");
    }

    #[test]
    fn test_invalid_inputs_are_grey() {
        assert_eq!(pm25_color(f64::NAN), NO_DATA_COLOR);
        assert_eq!(color_for(None), NO_DATA_COLOR);
        assert_eq!(color_for_str("NaN"), NO_DATA_COLOR);
        assert_eq!(color_for_str("n/a"), NO_DATA_COLOR);
        assert_eq!(color_for_str(" 35.5 "), "#fffe03");
    }

    #[test]
    fn test_bands_are_descending() {
        for pair in COLOR_BANDS.windows(2) {
            assert!(pair[0].threshold > pair[1].threshold);
        }
    }
}
