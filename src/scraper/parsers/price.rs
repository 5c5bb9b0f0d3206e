//! Price extraction from the rendered PlayerInfo page.

use anyhow::Result;
use scraper::{Html, Selector};

/// Parser for the DataCenter price element
pub struct PriceParser {
    selector: Selector,
}

impl PriceParser {
    /// Build a parser for the given CSS selector
    pub fn new(css: &str) -> Result<Self> {
        let selector = Selector::parse(css)
            .map_err(|e| anyhow::anyhow!("Invalid price selector {:?}: {}", css, e))?;
        Ok(Self { selector })
    }

    /// Text of the first matching element with a non-empty `title`.
    ///
    /// The page fills `title` once the market data has loaded; the text is
    /// the display price. Returns `None` when no such element exists.
    pub fn parse(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.selector)
            .find(|elem| {
                elem.value()
                    .attr("title")
                    .map(|t| !t.trim().is_empty())
                    .unwrap_or(false)
            })
            .map(|elem| elem.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
    }
}

/// JavaScript expression that is `true` once the price element is ready
pub fn readiness_script(css: &str) -> String {
    // serde_json gives a correctly escaped JS string literal
    let selector = serde_json::to_string(css).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "(() => {{ const el = document.querySelector({sel}); \
         const title = el && el.getAttribute('title'); \
         return !!(title && title.trim() !== ''); }})()",
        sel = selector
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const READY_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
<div class="info_wrap">
    <div class="txt"><strong title="123,400,000,000">1,234억</strong></div>
</div>
</body>
</html>"#;

    const LOADING_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
    <div class="txt"><strong title="">-</strong></div>
</body>
</html>"#;

    #[test]
    fn test_parse_ready_price() {
        let parser = PriceParser::new(".txt strong").unwrap();
        assert_eq!(parser.parse(READY_HTML), Some("1,234억".to_string()));
    }

    #[test]
    fn test_parse_ignores_element_without_title() {
        let parser = PriceParser::new(".txt strong").unwrap();
        assert_eq!(parser.parse(LOADING_HTML), None);
    }

    #[test]
    fn test_parse_missing_element() {
        let parser = PriceParser::new(".txt strong").unwrap();
        assert_eq!(parser.parse("<html><body><p>점검 중</p></body></html>"), None);
    }

    #[test]
    fn test_invalid_selector() {
        assert!(PriceParser::new("..[").is_err());
    }

    #[test]
    fn test_readiness_script_escapes_selector() {
        let script = readiness_script(".txt strong");
        assert!(script.contains(r#"document.querySelector(".txt strong")"#));
        assert!(script.contains("getAttribute('title')"));
    }
}
