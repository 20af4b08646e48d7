//! HTML to plain text conversion for the web page adapter.

use std::sync::LazyLock;

use regex::Regex;

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<!--[\s\S]*?-->").expect("regex"));
static INVISIBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(script|style|noscript|template|svg|iframe)\b[^>]*>[\s\S]*?</\s*(script|style|noscript|template|svg|iframe)\s*>")
        .expect("regex")
});
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title[^>]*>([\s\S]*?)</title>").expect("regex"));
static BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body[^>]*>([\s\S]*?)(?:</body>|$)").expect("regex"));
static BLOCK_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</(p|div|section|article|header|footer|main|aside|nav|h[1-6]|li|tr|table|ul|ol|blockquote|pre)\s*>")
        .expect("regex")
});
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(br|hr)\s*/?>").expect("regex"));
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<li\b[^>]*>").expect("regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\x{A0}]+").expect("regex"));
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("regex"));

/// Convert an HTML document to readable plain text.
///
/// Scripts, styles and comments are dropped, block elements become line
/// breaks, entities are decoded, and the `<title>` (when present) is placed
/// on the first line.
pub fn html_to_text(html: &str) -> String {
    let html = COMMENT.replace_all(html, "");
    let html = INVISIBLE.replace_all(&html, "");

    let title = TITLE
        .captures(&html)
        .and_then(|c| c.get(1))
        .map(|m| strip_tags(m.as_str()))
        .map(|t| normalize_whitespace(&t))
        .unwrap_or_default();

    let body = BODY
        .captures(&html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| TITLE.replace_all(&html, "").into_owned());

    let body = LIST_ITEM.replace_all(&body, "\n- ");
    let body = BLOCK_END.replace_all(&body, "\n\n");
    let body = LINE_BREAK.replace_all(&body, "\n");
    let body = normalize_whitespace(&strip_tags(&body));

    match (title.is_empty(), body.is_empty()) {
        (true, _) => body,
        (false, true) => title,
        (false, false) => format!("{title}\n\n{body}"),
    }
}

/// Remove every tag and decode HTML entities.
pub(crate) fn strip_tags(text: &str) -> String {
    let text = TAG.replace_all(text, "");
    html_escape::decode_html_entities(&text).into_owned()
}

/// Collapse runs of spaces, trim lines, and keep at most one blank line.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = SPACES.replace_all(&text, " ");
    let text = text.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    BLANK_LINES.replace_all(&text, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_scripts_and_keeps_title() {
        let html = r#"<html><head><title>Asimov &amp; Cia</title>
            <style>body { color: red; }</style></head>
            <body><script>var x = "<p>no</p>";</script>
            <h1>Cursos</h1><p>Aprenda   Python&nbsp;hoje.</p><!-- escondido --></body></html>"#;
        let text = html_to_text(html);
        assert_eq!(text, "Asimov & Cia\n\nCursos\n\nAprenda Python hoje.");
    }

    #[test]
    fn list_items_and_breaks_become_lines() {
        let html = "<body><ul><li>um</li><li>dois</li></ul>linha<br/>outra</body>";
        let text = html_to_text(html);
        assert!(text.contains("- um\n"), "{text}");
        assert!(text.contains("- dois"), "{text}");
        assert!(text.ends_with("linha\noutra"), "{text}");
    }

    #[test]
    fn fragment_without_body_is_still_converted() {
        assert_eq!(html_to_text("<p>Olá <b>mundo</b></p>"), "Olá mundo");
    }

    #[test]
    fn normalize_collapses_blank_lines() {
        assert_eq!(normalize_whitespace("  a \t b\n\n\n\n c  "), "a b\n\nc");
    }
}
