use std::sync::Arc;

use ego_tree::NodeRef;
use htmd::HtmlToMarkdown;
use pagesift_core::error::PipelineError;
use pagesift_core::traits::Normalizer;
use scraper::{Html, Node};

/// Elements whose text must never reach the output.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript"];

/// Visible-text normalizer.
///
/// Parses the HTML, drops script/style subtrees, flattens the remaining
/// text nodes in document order, then splits on whitespace and rejoins the
/// surviving tokens with newlines. Pure: no I/O, same input → same output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Normalizer for TextNormalizer {
    fn normalize(&self, html: &str) -> Result<String, PipelineError> {
        let document = Html::parse_document(html);
        let mut raw = String::new();
        collect_text(document.tree.root(), &mut raw);
        Ok(raw.split_whitespace().collect::<Vec<_>>().join("\n"))
    }
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(&text.text);
                // Tag boundaries separate tokens even without whitespace
                // in the source.
                out.push(' ');
            }
            Node::Element(el) if !SKIPPED_ELEMENTS.contains(&el.name()) => {
                collect_text(child, out);
            }
            _ => {}
        }
    }
}

/// HTML-to-Markdown normalizer using htmd.
///
/// Alternative cleanup mode that keeps document structure (headings, lists,
/// links) while stripping non-content elements, for cases where the LLM
/// benefits from layout cues.
pub struct MarkdownNormalizer {
    converter: Arc<HtmlToMarkdown>,
}

impl Clone for MarkdownNormalizer {
    fn clone(&self) -> Self {
        Self {
            converter: Arc::clone(&self.converter),
        }
    }
}

impl MarkdownNormalizer {
    pub fn new() -> Self {
        let converter = HtmlToMarkdown::builder()
            .skip_tags(vec![
                "script", "style", "nav", "footer", "header", "aside", "noscript", "iframe", "svg",
            ])
            .build();

        Self {
            converter: Arc::new(converter),
        }
    }
}

impl Default for MarkdownNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for MarkdownNormalizer {
    fn normalize(&self, html: &str) -> Result<String, PipelineError> {
        self.converter
            .convert(html)
            .map_err(|e| PipelineError::Normalize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattens_visible_text() {
        let n = TextNormalizer::new();
        let html = "<html><body><h1>Market Cap</h1><p>1.2T</p></body></html>";
        assert_eq!(n.normalize(html).unwrap(), "Market\nCap\n1.2T");
    }

    #[test]
    fn test_never_emits_script_or_style_content() {
        let n = TextNormalizer::new();
        let html = r#"<html><head>
            <script>var secret = "leak_me";</script>
            <style>.hidden { color: red; }</style>
        </head><body><p>Visible</p><noscript>fallback</noscript></body></html>"#;
        let text = n.normalize(html).unwrap();
        assert_eq!(text, "Visible");
        assert!(!text.contains("secret"));
        assert!(!text.contains("hidden"));
        assert!(!text.contains("fallback"));
    }

    #[test]
    fn test_idempotent_on_normalized_text() {
        let n = TextNormalizer::new();
        let once = n
            .normalize("<body><p>alpha beta</p><p>gamma</p></body>")
            .unwrap();
        let twice = n.normalize(&once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, "alpha\nbeta\ngamma");
    }

    #[test]
    fn test_empty_html_yields_empty_string() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize("").unwrap(), "");
        assert_eq!(n.normalize("   \n\t  ").unwrap(), "");
        assert_eq!(n.normalize("<html><body></body></html>").unwrap(), "");
    }

    #[test]
    fn test_tag_boundaries_separate_tokens() {
        let n = TextNormalizer::new();
        // No whitespace between the spans in the source.
        let html = "<body><span>Revenue</span><span>300B</span></body>";
        assert_eq!(n.normalize(html).unwrap(), "Revenue\n300B");
    }

    #[test]
    fn test_preserves_document_order() {
        let n = TextNormalizer::new();
        let html = "<body><div>first</div><script>x=1</script><div>second</div></body>";
        assert_eq!(n.normalize(html).unwrap(), "first\nsecond");
    }

    #[test]
    fn test_markdown_keeps_layout_cues() {
        let n = MarkdownNormalizer::new();
        let md = n
            .normalize("<h1>Quarterly Report</h1><ul><li>Revenue 300B</li></ul>")
            .unwrap();
        assert!(md.contains("# Quarterly Report"));
        assert!(md.contains("Revenue 300B"));
    }

    #[test]
    fn test_markdown_skips_page_chrome() {
        // Only the main content should reach the extractor; navigation,
        // footer, and scripts are noise.
        let n = MarkdownNormalizer::new();
        let html = "<nav>Home Pricing About</nav>\
            <main><p>Market Cap 1.2T</p></main>\
            <footer>Terms of Service</footer>\
            <script>trackPageview()</script>";
        let md = n.normalize(html).unwrap();
        assert!(md.contains("Market Cap 1.2T"));
        assert!(!md.contains("Pricing"));
        assert!(!md.contains("Terms of Service"));
        assert!(!md.contains("trackPageview"));
    }

    #[test]
    fn test_markdown_escaping_can_expand_input() {
        // Markdown output is not guaranteed to be smaller than its input:
        // literal markdown metacharacters get backslash-escaped.
        let n = MarkdownNormalizer::new();
        let md = n.normalize("*").unwrap();
        assert!(md.contains("\\*"));
        assert!(md.len() > 1);
    }
}
