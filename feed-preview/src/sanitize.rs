use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// 反转义的实体，按顺序逐个替换
const ENTITIES: [(&str, &str); 8] = [
    ("&nbsp;", " "),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&#x27;", "'"),
    ("&#x2F;", "/"),
];

/// 把摘要 HTML 变成纯文本
///
/// 先去标签再反转义，所以 `&lt;script&gt;` 会变成字面的 `<script>` 并保留下来。
/// 结果不能再当作标记使用。
pub fn sanitize_text(html: &str) -> String {
    let stripped = TAG_RE.replace_all(html, "");

    let mut text = stripped.into_owned();
    for (entity, replacement) in ENTITIES {
        if text.contains(entity) {
            text = text.replace(entity, replacement);
        }
    }

    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let html = "<p>Hello <b>brave</b>\n\n   new <a href=\"x\">world</a></p>";
        assert_eq!(sanitize_text(html), "Hello brave new world");
    }

    #[test]
    fn unescapes_the_fixed_entity_set() {
        let html = "Fish&nbsp;&amp;&nbsp;Chips &lt;3 &quot;quoted&quot; it&#39;s it&#x27;s a&#x2F;b";
        assert_eq!(sanitize_text(html), "Fish & Chips <3 \"quoted\" it's it's a/b");
    }

    #[test]
    fn escaped_markup_is_not_stripped_again() {
        assert_eq!(sanitize_text("&lt;script&gt;alert(1)&lt;/script&gt;"), "<script>alert(1)</script>");
    }

    #[test]
    fn clean_text_only_loses_extra_whitespace() {
        assert_eq!(sanitize_text("plain text"), "plain text");
        assert_eq!(sanitize_text("  plain \t\n text  "), "plain text");
    }

    #[test]
    fn other_entities_are_left_alone() {
        assert_eq!(sanitize_text("caf&eacute; &#8217;"), "caf&eacute; &#8217;");
    }
}
