/// Render a second count as `hh:mm:ss`.
///
/// Every field is padded to two digits. The hour field is not capped, so a
/// session longer than 99 hours widens it (`100:00:00`) instead of wrapping.
pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
