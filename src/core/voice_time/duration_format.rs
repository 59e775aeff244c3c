/// Render a number of seconds as `"1h 2m 3s"`, skipping zero parts.
///
/// Zero renders as `"0s"` so callers never get an empty string.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remaining = seconds % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if remaining > 0 || parts.is_empty() {
        parts.push(format!("{}s", remaining));
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_never_empty() {
        assert_eq!(format_duration(0), "0s");
    }

    #[test]
    fn skips_zero_components() {
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(60), "1m");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3600), "1h");
        assert_eq!(format_duration(3605), "1h 5s");
        assert_eq!(format_duration(3661), "1h 1m 1s");
    }

    #[test]
    fn hours_are_not_rolled_into_days() {
        assert_eq!(format_duration(90_061), "25h 1m 1s");
    }

    #[test]
    fn components_decompose_back_to_input() {
        for seconds in [1u64, 61, 599, 3599, 7322, 86_399, 1_000_000] {
            let text = format_duration(seconds);
            assert!(!text.is_empty());

            let total: u64 = text
                .split(' ')
                .map(|part| {
                    let (value, unit) = part.split_at(part.len() - 1);
                    let value: u64 = value.parse().unwrap();
                    match unit {
                        "h" => value * 3600,
                        "m" => value * 60,
                        "s" => value,
                        other => panic!("unexpected unit {other}"),
                    }
                })
                .sum();
            assert_eq!(total, seconds, "{text}");
        }
    }
}
