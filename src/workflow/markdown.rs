//! Markdown image references inside block text.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// `![alt](url)` - alt and url may not span lines.
static IMAGE_MARKDOWN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]\n]*)\]\(([^)\n]+)\)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub markdown: String,
    pub alt: String,
    pub url: String,
}

/// First markdown image reference in `content`, if any. Later references
/// in the same block are left for future change events.
pub fn extract_first_image(content: &str) -> Option<ImageRef> {
    let captures = IMAGE_MARKDOWN_RE.captures(content)?;
    Some(ImageRef {
        markdown: captures.get(0)?.as_str().to_string(),
        alt: captures
            .get(1)
            .map_or_else(String::new, |m| m.as_str().to_string()),
        url: captures
            .get(2)
            .map_or_else(String::new, |m| m.as_str().to_string()),
    })
}

/// Rewrite the first image reference's URL, keeping its alt text.
pub fn replace_first_image_url(content: &str, new_url: &str) -> String {
    IMAGE_MARKDOWN_RE
        .replace(content, |captures: &Captures| {
            format!("![{}]({})", &captures[1], new_url)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_first_reference_only() {
        let content = "before ![cat](assets/img/cat.png) and ![dog](assets/img/dog.png)";
        let image = extract_first_image(content).unwrap();
        assert_eq!(image.alt, "cat");
        assert_eq!(image.url, "assets/img/cat.png");
        assert_eq!(image.markdown, "![cat](assets/img/cat.png)");
    }

    #[test]
    fn empty_alt_is_fine() {
        let image = extract_first_image("![](https://host/pic.jpg)").unwrap();
        assert_eq!(image.alt, "");
        assert_eq!(image.url, "https://host/pic.jpg");
    }

    #[test]
    fn plain_text_has_no_reference() {
        assert_eq!(extract_first_image("no images here"), None);
        assert_eq!(extract_first_image(""), None);
    }

    #[test]
    fn references_do_not_span_lines() {
        assert_eq!(extract_first_image("![alt\nmore](x.png)"), None);
        assert_eq!(extract_first_image("![alt](x\n.png)"), None);
    }

    #[test]
    fn rewrite_touches_only_the_first_url_and_keeps_alt() {
        let content = "![cat](assets/img/cat.png) ![dog](assets/img/dog.png)";
        let rewritten = replace_first_image_url(content, "../assets/img/cat.webp");
        assert_eq!(
            rewritten,
            "![cat](../assets/img/cat.webp) ![dog](assets/img/dog.png)"
        );
    }

    #[test]
    fn rewrite_without_a_reference_is_identity() {
        assert_eq!(replace_first_image_url("plain", "x"), "plain");
    }
}
