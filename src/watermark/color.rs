use image::Rgba;

pub const DEFAULT_COLOR: &str = "#000000";

/// Parse `#RRGGBB` or `#RGB` into an opaque color.
///
/// Anything else comes back as opaque black; a bad hex digit counts as zero.
pub fn parse_hex_color(value: &str) -> Rgba<u8> {
    let Some(digits) = value.strip_prefix('#') else {
        return Rgba([0, 0, 0, 255]);
    };
    let digits = digits.as_bytes();

    match digits.len() {
        6 => Rgba([
            hex_value(digits[0]) << 4 | hex_value(digits[1]),
            hex_value(digits[2]) << 4 | hex_value(digits[3]),
            hex_value(digits[4]) << 4 | hex_value(digits[5]),
            255,
        ]),
        3 => Rgba([
            hex_value(digits[0]) * 17,
            hex_value(digits[1]) * 17,
            hex_value(digits[2]) * 17,
            255,
        ]),
        _ => Rgba([0, 0, 0, 255]),
    }
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}
