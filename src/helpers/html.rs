//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape text content and turn line breaks into `<br/>`
pub fn text_with_breaks(s: &str) -> String {
    s.split('\n')
        .map(html_escape)
        .collect::<Vec<_>>()
        .join("<br/>")
}

/// Generate an anchor tag around already-rendered inner HTML
///
/// # Examples
/// ```ignore
/// link_to("https://example.com", "Example") // -> <a href="https://example.com">Example</a>
/// ```
pub fn link_to(href: &str, inner_html: &str) -> String {
    format!(r#"<a href="{}">{}</a>"#, html_escape(href), inner_html)
}

/// Wrap already-rendered inner HTML in an element
/// Whether `uri` is relative or uses a scheme that is safe to link to
pub fn uri_looks_safe(uri: &str) -> bool {
    let uri = uri.trim();
    if uri.starts_with('#') || uri.starts_with('/') {
        return true;
    }
    let Some(colon) = uri.find(':') else {
        return true;
    };
    let scheme = uri[..colon].to_ascii_lowercase();
    if SAFE_SCHEMES.contains(&scheme.as_str()) {
        return true;
    }
    // A colon after `?` or `#` belongs to the query or fragment
    uri.find(['?', '#']).is_some_and(|i| i < colon)
}

const SAFE_SCHEMES: [&str; 4] = ["http", "https", "mailto", "tel"];

pub fn wrap(tag: &str, inner_html: &str) -> String {
    format!("<{tag}>{inner_html}</{tag}>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_text_with_breaks() {
        assert_eq!(text_with_breaks("a<b\nc"), "a&lt;b<br/>c");
    }

    #[test]
    fn test_uri_looks_safe() {
        assert!(uri_looks_safe("https://example.com"));
        assert!(uri_looks_safe("MAILTO:me@example.com"));
        assert!(uri_looks_safe("tel:+15550100"));
        assert!(uri_looks_safe("/posts/hello"));
        assert!(uri_looks_safe("#top"));
        assert!(uri_looks_safe("relative/path"));
        assert!(uri_looks_safe("page?at=10:30"));
        assert!(!uri_looks_safe("javascript:alert(1)"));
        assert!(!uri_looks_safe("  JavaScript:alert(1)"));
        assert!(!uri_looks_safe("data:text/html;base64,PHNjcmlwdD4="));
        assert!(!uri_looks_safe("vbscript:msgbox"));
    }

    #[test]
    fn test_link_to_escapes_href() {
        assert_eq!(
            link_to("/search?a=1&b=\"2\"", "go"),
            r#"<a href="/search?a=1&amp;b=&quot;2&quot;">go</a>"#
        );
    }
}
