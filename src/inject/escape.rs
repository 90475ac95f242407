//! HTML attribute escaping.

/// Escape `s` for use inside a quoted HTML attribute (or as element text).
///
/// ```
/// use tts_field_helper::inject::escape_attr;
///
/// assert_eq!(escape_attr(r#"<b class="x">Tom & 'Jerry'</b>"#),
///            "&lt;b class=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/b&gt;");
/// ```
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
