/// Split `line` into visual lines no wider than `max_width`.
///
/// A line that fits as a whole is kept. Otherwise words are added greedily, measuring
/// after each one; on overflow the previous fit is flushed and the overflowing word
/// starts the next line. A single word wider than `max_width` is emitted on its own,
/// unmodified. Results are trimmed and empty ones dropped. Without a `max_width` the
/// trimmed line is returned as is.
pub fn wrap_line(
    line: &str,
    max_width: Option<f64>,
    mut measure: impl FnMut(&str) -> f64,
) -> Vec<String> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }
    let Some(max_width) = max_width else {
        return vec![line.to_string()];
    };
    if measure(line) <= max_width {
        return vec![line.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure(&candidate) <= max_width {
            current = candidate;
        } else if current.is_empty() {
            lines.push(candidate);
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);

    lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
