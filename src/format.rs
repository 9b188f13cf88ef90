//! Display helpers for offsets and coordinates.

/// Format a UTC offset in minutes as `±HH:MM`. Zero is rendered as `+00:00`.
pub fn utc_offset_to_string(offset_minutes: i32) -> String {
    let sign = if offset_minutes < 0 { '-' } else { '+' };
    let magnitude = offset_minutes.unsigned_abs();
    format!("{}{:02}:{:02}", sign, magnitude / 60, magnitude % 60)
}

/// Format coordinates as `59.3293°N, 18.0686°E`.
pub fn format_coords(lat: f64, lng: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lng >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}°{}, {:.4}°{}", lat.abs(), ns, lng.abs(), ew)
}
