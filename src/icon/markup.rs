//! Line transforms applied to tooltip section bodies.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::MarkupTokens;

/// Bracket link text shorter than this falls back to the raw URL.
const MIN_LINK_TEXT_LEN: usize = 3;

static LINK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://[^\s\[]+)\[([^\]]*)\](.*)$").expect("link regex is valid")
});

/// Rewrite one body line for the tooltip.
///
/// - `https://host/path[text]` becomes an anchor, labelled with `text` when it
///   is long enough, else with the URL
/// - a line starting with the warning prefix is wrapped in the warning
///   template, prefix removed
/// - a line starting with a skip prefix becomes empty
/// - anything else passes through
pub fn transform_line(line: &str, tokens: &MarkupTokens) -> String {
    if let Some(caps) = LINK_LINE.captures(line) {
        let url = &caps[1];
        let text = caps[2].trim();
        let label = if text.chars().count() >= MIN_LINK_TEXT_LEN {
            text
        } else {
            url
        };
        return format!("<a href=\"{url}\" target=\"_blank\">{label}</a>{}", &caps[3]);
    }

    if !tokens.warning_prefix.is_empty() {
        if let Some(rest) = line.strip_prefix(tokens.warning_prefix.as_str()) {
            return warning_html(rest.trim());
        }
    }

    if tokens
        .skip_prefixes
        .iter()
        .any(|prefix| !prefix.is_empty() && line.starts_with(prefix.as_str()))
    {
        return String::new();
    }

    line.to_string()
}

fn warning_html(text: &str) -> String {
    format!("<span style=\"color:#cc0000;font-weight:bold;\">&#9888; {text}</span>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> MarkupTokens {
        MarkupTokens::default()
    }

    #[test]
    fn link_uses_bracket_text() {
        let out = transform_line("https://example.com/docs[Read the docs]", &tokens());
        assert_eq!(
            out,
            "<a href=\"https://example.com/docs\" target=\"_blank\">Read the docs</a>"
        );
    }

    #[test]
    fn short_link_text_falls_back_to_url() {
        let out = transform_line("http://example.com[ab] tail", &tokens());
        assert_eq!(
            out,
            "<a href=\"http://example.com\" target=\"_blank\">http://example.com</a> tail"
        );
    }

    #[test]
    fn warning_prefix_is_stripped_and_wrapped() {
        let out = transform_line("WARNING: hot surface", &tokens());
        assert!(out.contains("hot surface"));
        assert!(!out.contains("WARNING:"));
        assert!(out.starts_with("<span"));
    }

    #[test]
    fn skip_prefixes_blank_the_line() {
        assert_eq!(transform_line("image::foo.png[]", &tokens()), "");
        assert_eq!(transform_line("____", &tokens()), "");
        assert_eq!(transform_line("[quote, someone]", &tokens()), "");
    }

    #[test]
    fn plain_lines_pass_through() {
        assert_eq!(transform_line("just text", &tokens()), "just text");
        assert_eq!(transform_line("see https://x.org", &tokens()), "see https://x.org");
    }
}
