use url::Url;

/// `S01E05` style tag used in titles and log lines.
pub fn episode_tag(season: u32, episode: u32) -> String {
    format!("S{:02}E{:02}", season, episode)
}

/// At most `max` characters of `text`, for log previews.
pub fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// `scheme://host[:port]` of `url`.
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Joins several `Cookie` header values into one, keeping the first value
/// seen for each cookie name.
pub fn merge_cookie_headers<'a, I>(headers: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: Vec<(&str, &str)> = Vec::new();

    for header in headers {
        for pair in header.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            if !seen.iter().any(|(existing, _)| *existing == name) {
                seen.push((name, value));
            }
        }
    }

    seen.iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}
