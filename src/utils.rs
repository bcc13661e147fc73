/// Generate a compact correlation ID (8 hex characters) from the first 4 bytes of a UUID v4.
///
/// Short enough to read in a log line, with ~4 billion values to keep
/// concurrent connections apart.
pub fn generate_correlation_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    let bytes = uuid.as_bytes();
    format!(
        "{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}

/// Render client-supplied text for a single log line: control characters
/// escaped, long input cut at `max` characters.
pub fn sanitize_for_log(input: &str, max: usize) -> String {
    let mut out: String = input.chars().take(max).flat_map(char::escape_default).collect();
    if input.chars().count() > max {
        out.push_str("...");
    }
    out
}
