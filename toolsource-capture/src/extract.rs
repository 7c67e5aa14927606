//! Lightweight extraction over captured markup.
//!
//! The "view source" page renders the tool definition inside a highlighted
//! `<code class="language-xml">` block; [`extract_code_block`] recovers the
//! raw text of that block. This is a regex scan, not a DOM parse: it handles
//! the markup such pages produce (nested highlight spans, entity-escaped
//! text) and nothing more.

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn code_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<code\b([^>]*)>(.*?)</code\s*>"#).expect("valid code block regex")
    })
}

fn class_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
            .expect("valid class regex")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"))
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid entity regex")
    })
}

/// Lowercase hex blake3 digest of the captured markup.
pub fn checksum(html: &str) -> String {
    blake3::hash(html.as_bytes()).to_hex().to_string()
}

/// Text of the first `<code>` element whose class list contains `class`.
pub fn extract_code_block(html: &str, class: &str) -> Option<String> {
    code_block_re()
        .captures_iter(html)
        .find(|caps| has_class(&caps[1], class))
        .map(|caps| {
            let text = tag_re().replace_all(&caps[2], "");
            decode_entities(&text).trim().to_string()
        })
}

fn has_class(attrs: &str, class: &str) -> bool {
    class_attr_re()
        .captures(attrs)
        .and_then(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
        .is_some_and(|m| m.as_str().split_whitespace().any(|c| c == class))
}

/// Decode the named entities highlighters emit plus numeric references.
/// Unknown entities are left untouched.
pub fn decode_entities(text: &str) -> String {
    entity_re()
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = match body {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => numeric_reference(body),
            };
            match decoded {
                Some(ch) => ch.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn numeric_reference(body: &str) -> Option<char> {
    let digits = body.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW_SOURCE_PAGE: &str = r#"<html><body>
<div class="tool-dropdown"><button>Options</button></div>
<pre class="line-numbers"><code class="hljs language-xml"><span class="hljs-tag">&lt;<span class="hljs-name">tool</span> <span class="hljs-attr">id</span>=<span class="hljs-string">&quot;humann&quot;</span>&gt;</span>
  &lt;description&gt;HUMAnN &amp;amp; friends&lt;/description&gt;
&lt;/tool&gt;</code></pre>
</body></html>"#;

    #[test]
    fn extracts_highlighted_xml() {
        let xml = extract_code_block(VIEW_SOURCE_PAGE, "language-xml").expect("xml block");
        assert!(xml.starts_with(r#"<tool id="humann">"#));
        assert!(xml.contains("<description>HUMAnN &amp; friends</description>"));
        assert!(xml.ends_with("</tool>"));
    }

    #[test]
    fn class_must_match_a_whole_token() {
        let html = r#"<code class="language-xml-ish">no</code><code class='language-xml'>yes</code>"#;
        assert_eq!(
            extract_code_block(html, "language-xml").as_deref(),
            Some("yes")
        );
    }

    #[test]
    fn missing_block_is_none() {
        assert_eq!(extract_code_block("<pre>plain</pre>", "language-xml"), None);
    }

    #[test]
    fn decodes_numeric_and_unknown_entities() {
        assert_eq!(decode_entities("&#60;a&#x3E; &#39;b&#39;"), "<a> 'b'");
        assert_eq!(decode_entities("&copy; &bogus;"), "&copy; &bogus;");
        assert_eq!(decode_entities("&#xZZ;"), "&#xZZ;");
    }

    #[test]
    fn checksum_is_stable_hex() {
        let a = checksum("<html>SOURCE-OK</html>");
        assert_eq!(a, checksum("<html>SOURCE-OK</html>"));
        assert_ne!(a, checksum("<html>SOURCE-KO</html>"));
        assert_eq!(a.len(), 64);
    }
}
