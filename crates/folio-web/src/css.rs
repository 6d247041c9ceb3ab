#![forbid(unsafe_code)]

//! Inline style values for an animated [`Style`].

use folio_core::animation::Style;

/// The properties [`HostCommand::ApplyStyle`] writes and
/// [`HostCommand::ClearStyle`] removes.
///
/// [`HostCommand::ApplyStyle`]: folio_core::HostCommand::ApplyStyle
/// [`HostCommand::ClearStyle`]: folio_core::HostCommand::ClearStyle
pub const PROPERTIES: [&str; 2] = ["opacity", "transform"];

/// `transform` value, e.g. `translate(0px, 50px) scale(0.9)`.
///
/// Identity components are omitted; a resting style yields `none`.
#[must_use]
pub fn transform(style: &Style) -> String {
    let mut parts = Vec::with_capacity(2);
    if style.x != 0.0 || style.y != 0.0 {
        parts.push(format!("translate({}px, {}px)", px(style.x), px(style.y)));
    }
    if style.scale != 1.0 {
        parts.push(format!("scale({})", number(style.scale)));
    }
    if parts.is_empty() {
        "none".to_owned()
    } else {
        parts.join(" ")
    }
}

#[must_use]
pub fn opacity(style: &Style) -> String {
    number(style.opacity.clamp(0.0, 1.0))
}

/// `(property, value)` pairs in [`PROPERTIES`] order.
#[must_use]
pub fn declarations(style: &Style) -> [(&'static str, String); 2] {
    [
        (PROPERTIES[0], opacity(style)),
        (PROPERTIES[1], transform(style)),
    ]
}

/// Round to 1/100 px; tween output is sub-pixel noise beyond that.
fn px(value: f32) -> String {
    number((value * 100.0).round() / 100.0)
}

fn number(value: f32) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    // Avoid "-0".
    if rounded == 0.0 {
        "0".to_owned()
    } else {
        rounded.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resting_style_has_no_transform() {
        assert_eq!(transform(&Style::RESTING), "none");
        assert_eq!(opacity(&Style::RESTING), "1");
    }

    #[test]
    fn hidden_offset_style() {
        let style = Style {
            opacity: 0.0,
            x: 0.0,
            y: 50.0,
            scale: 1.0,
        };
        assert_eq!(
            declarations(&style),
            [
                ("opacity", "0".to_owned()),
                ("transform", "translate(0px, 50px)".to_owned()),
            ]
        );
    }

    #[test]
    fn translate_and_scale_combine() {
        let style = Style {
            opacity: 0.5,
            x: -50.0,
            y: 0.0,
            scale: 0.9,
        };
        assert_eq!(transform(&style), "translate(-50px, 0px) scale(0.9)");
        assert_eq!(opacity(&style), "0.5");
    }

    #[test]
    fn sub_pixel_noise_is_rounded() {
        let style = Style {
            opacity: 0.333_333,
            x: 0.0,
            y: 12.345_678,
            scale: 1.0,
        };
        assert_eq!(transform(&style), "translate(0px, 12.35px)");
        assert_eq!(opacity(&style), "0.333");
    }

    #[test]
    fn negative_zero_prints_as_zero() {
        let style = Style {
            opacity: 1.0,
            x: -0.0001,
            y: 3.0,
            scale: 1.0,
        };
        assert_eq!(transform(&style), "translate(0px, 3px)");
    }
}
