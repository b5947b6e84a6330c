use url::Url;

const LINK_SCHEMES: [&str; 4] = ["http://", "https://", "ftp://", "file://"];

/// A run of text inside one visual line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Link { href: String, text: String },
}

impl Fragment {
    /// The text this fragment renders.
    pub fn text(&self) -> &str {
        match self {
            Fragment::Text(text) => text,
            Fragment::Link { text, .. } => text,
        }
    }
}

fn is_link(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    LINK_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) && Url::parse(token).is_ok()
}

/// Split `line` into text and link fragments. Whitespace is kept in the text
/// fragments, so concatenating every fragment's text gives back `line`.
pub fn parse_links(line: &str) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut text = String::new();

    let mut rest = line;
    while !rest.is_empty() {
        let leading_space = rest.starts_with(char::is_whitespace);
        let split = rest
            .find(|c: char| c.is_whitespace() != leading_space)
            .unwrap_or(rest.len());
        let (token, tail) = rest.split_at(split);
        rest = tail;

        if is_link(token) {
            if !text.is_empty() {
                fragments.push(Fragment::Text(std::mem::take(&mut text)));
            }
            fragments.push(Fragment::Link {
                href: token.to_string(),
                text: token.to_string(),
            });
        } else {
            text.push_str(token);
        }
    }
    if !text.is_empty() {
        fragments.push(Fragment::Text(text));
    }
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(fragments: &[Fragment]) -> String {
        fragments.iter().map(Fragment::text).collect()
    }

    #[test]
    fn single_link_round_trips() {
        let line = "see https://example.com/docs?page=2 for details";
        let fragments = parse_links(line);
        assert_eq!(
            fragments,
            vec![
                Fragment::Text("see ".into()),
                Fragment::Link {
                    href: "https://example.com/docs?page=2".into(),
                    text: "https://example.com/docs?page=2".into(),
                },
                Fragment::Text(" for details".into()),
            ]
        );
        assert_eq!(joined(&fragments), line);
    }

    #[test]
    fn plain_text_stays_whole() {
        let line = "nothing  to\tlink here: mailto:someone";
        assert_eq!(parse_links(line), vec![Fragment::Text(line.into())]);
    }

    #[test]
    fn schemes() {
        for line in ["ftp://files.example.org/a", "file:///tmp/report.txt", "HTTP://EXAMPLE.COM"] {
            assert!(matches!(parse_links(line).as_slice(), [Fragment::Link { .. }]), "{line}");
        }
        assert_eq!(
            parse_links("http://"),
            vec![Fragment::Text("http://".into())]
        );
    }

    #[test]
    fn adjacent_links() {
        let line = "http://a.example http://b.example";
        let fragments = parse_links(line);
        assert_eq!(fragments.len(), 3);
        assert_eq!(joined(&fragments), line);
    }
}
