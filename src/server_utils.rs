pub fn sanitize_name(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "Anonymous".to_string();
    }
    trimmed.chars().take(16).collect()
}

pub fn sanitize_chat_message(value: &str, max_chars: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max_chars).collect())
}

pub fn normalize_scoreboard_limit(value: Option<usize>) -> usize {
    value.unwrap_or(10).clamp(1, 100)
}

pub fn parse_scoreboard_limit(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|value| value.parse::<usize>().ok())
}

pub fn session_order_key(id: &str) -> u64 {
    id.rsplit('_')
        .next()
        .and_then(|suffix| suffix.parse::<u64>().ok())
        .unwrap_or(u64::MAX)
}
