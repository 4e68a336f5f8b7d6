//! Encoded polyline algorithm, used for static map path overlays.
//!
//! Input is `[longitude, latitude]`; the encoding itself is latitude first.

use crate::types::Coordinates;

pub fn encode(coordinates: &[Coordinates], precision: u32) -> String {
    let factor = 10f64.powi(precision as i32);
    let mut output = String::new();
    let (mut prev_lat, mut prev_lng) = (0i64, 0i64);

    for [lng, lat] in coordinates {
        let lat = (lat * factor).round() as i64;
        let lng = (lng * factor).round() as i64;
        encode_value(lat - prev_lat, &mut output);
        encode_value(lng - prev_lng, &mut output);
        prev_lat = lat;
        prev_lng = lng;
    }
    output
}

fn encode_value(value: i64, output: &mut String) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= 0x20 {
        output.push(char::from((((v & 0x1f) | 0x20) + 63) as u8));
        v >>= 5;
    }
    output.push(char::from((v + 63) as u8));
}
