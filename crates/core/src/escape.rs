//! XML escaping for rendered page markup.
//!
//! A substituted property value can land as element text or inside a quoted
//! attribute; one escape covers both contexts, so a quote in a plain value
//! can never terminate an attribute early.

/// Escape a value for insertion into markup, as element text or inside an
/// attribute.
pub fn escape_markup(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_chars_are_escaped() {
        assert_eq!(
            escape_markup("<b>a & b</b>"),
            "&lt;b&gt;a &amp; b&lt;/b&gt;"
        );
    }

    #[test]
    fn both_quote_kinds_are_escaped() {
        assert_eq!(
            escape_markup(r#"x="1" y='2'"#),
            "x=&quot;1&quot; y=&#39;2&#39;"
        );
    }

    #[test]
    fn plain_value_is_untouched() {
        assert_eq!(escape_markup("H:mm"), "H:mm");
    }
}
