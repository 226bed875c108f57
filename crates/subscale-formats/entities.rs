//! Deep HTML/XML entity unescaping.
//!
//! Caption files in the wild arrive double-escaped (`&amp;nbsp;`) and use
//! whitespace entities XML unescaping does not know. Unescape repeatedly
//! until the text stops changing, resolving the whitespace entities on each
//! round.

use quick_xml::escape::unescape;

const NAMED: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&NewLine;", "\n"),
    ("&thinsp;", " "),
    ("&ensp;", " "),
    ("&emsp;", " "),
    ("&ZeroWidthSpace;", ""),
];

fn replace_named(s: &str) -> String {
    let mut out = s.to_string();
    for (entity, replacement) in NAMED {
        if out.contains(entity) {
            out = out.replace(entity, replacement);
        }
    }
    out
}

/// Unescape until a fixed point. Text that fails XML unescaping (stray `&`)
/// is kept as-is rather than rejected.
pub(crate) fn deep_unescape(s: &str) -> String {
    let mut current = replace_named(s);
    loop {
        let unescaped = match unescape(&current) {
            Ok(next) if next != current.as_str() => next.into_owned(),
            _ => return current,
        };
        current = replace_named(&unescaped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_unchanged() {
        assert_eq!(deep_unescape("hello world"), "hello world");
    }

    #[test]
    fn standard_entities() {
        assert_eq!(deep_unescape("a &lt;b&gt; &amp; c"), "a <b> & c");
    }

    #[test]
    fn double_escaped_entities() {
        assert_eq!(deep_unescape("&amp;lt;i&amp;gt;"), "<i>");
        assert_eq!(deep_unescape("&amp;nbsp;x"), " x");
    }

    #[test]
    fn whitespace_entities() {
        assert_eq!(deep_unescape("a&nbsp;b&ZeroWidthSpace;c"), "a bc");
        assert_eq!(deep_unescape("a&NewLine;b"), "a\nb");
    }

    #[test]
    fn stray_ampersand_is_kept() {
        assert_eq!(deep_unescape("Tom & Jerry"), "Tom & Jerry");
    }
}
