use tracing::debug;

use crate::document::{parse_document, Element};
use crate::image::discover_image;
use crate::models::{PreviewArticle, PreviewError, MAX_PREVIEW_ARTICLES};
use crate::sanitize::sanitize_text;

/// 文档方言
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Rss,
    Atom,
}

impl Dialect {
    /// 有 item 就按 RSS 处理，否则有 entry 按 Atom 处理
    pub fn detect(root: &Element) -> Option<Dialect> {
        if root.find("item").is_some() {
            Some(Dialect::Rss)
        } else if root.find("entry").is_some() {
            Some(Dialect::Atom)
        } else {
            None
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// RSS item → 预览文章
fn rss_article(item: &Element) -> PreviewArticle {
    let author = non_empty(item.child_text("author")).or_else(|| non_empty(item.child_text("dc:creator")));

    PreviewArticle {
        title: item.child_text("title"),
        link: item.child_text("link"),
        description: sanitize_text(&item.child_text("description")),
        pub_date: item.child_text("pubDate"),
        author,
        image: discover_image(item),
    }
}

/// Atom entry → 预览文章，不查找配图
fn atom_article(entry: &Element) -> PreviewArticle {
    let links = entry.descendants("link");
    let link = links
        .iter()
        .find(|l| matches!(l.attr("rel"), None | Some("alternate")))
        .or_else(|| links.first())
        .and_then(|l| l.attr("href"))
        .map(|href| href.trim().to_string())
        .unwrap_or_default();

    let summary = match entry.find("summary") {
        Some(summary) => summary.text_content().trim().to_string(),
        None => entry.child_text("content"),
    };

    let pub_date = non_empty(entry.child_text("published")).unwrap_or_else(|| entry.child_text("updated"));

    let author = entry
        .find("author")
        .and_then(|author| non_empty(author.child_text("name")));

    PreviewArticle {
        title: entry.child_text("title"),
        link,
        description: sanitize_text(&summary),
        pub_date,
        author,
        image: None,
    }
}

/// 解析文档，出错时返回错误
pub fn try_parse_feed(xml: &str) -> Result<Vec<PreviewArticle>, PreviewError> {
    let root = parse_document(xml)?;

    let articles: Vec<PreviewArticle> = match Dialect::detect(&root) {
        Some(Dialect::Rss) => root
            .descendants("item")
            .into_iter()
            .take(MAX_PREVIEW_ARTICLES)
            .map(rss_article)
            .collect(),
        Some(Dialect::Atom) => root
            .descendants("entry")
            .into_iter()
            .take(MAX_PREVIEW_ARTICLES)
            .map(atom_article)
            .collect(),
        None => Vec::new(),
    };

    debug!("订阅源预览解析完成，文章数量: {}", articles.len());
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rss_fields_and_author_fallback() {
        let xml = r#"<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
          <channel>
            <item>
              <title> First post </title>
              <link>https://blog.example/1</link>
              <description>&lt;p&gt;Hello &amp;amp; welcome&lt;/p&gt;</description>
              <pubDate>Mon, 02 Jan 2023 10:00:00 GMT</pubDate>
              <dc:creator>Ada</dc:creator>
            </item>
            <item>
              <title>Second</title>
              <author>grace@example.com (Grace)</author>
              <dc:creator>Ignored</dc:creator>
            </item>
          </channel>
        </rss>"#;

        let articles = try_parse_feed(xml).unwrap();
        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.title, "First post");
        assert_eq!(first.link, "https://blog.example/1");
        assert_eq!(first.description, "Hello & welcome");
        assert_eq!(first.pub_date, "Mon, 02 Jan 2023 10:00:00 GMT");
        assert_eq!(first.author.as_deref(), Some("Ada"));
        assert_eq!(first.image, None);

        let second = &articles[1];
        assert_eq!(second.author.as_deref(), Some("grace@example.com (Grace)"));
        assert_eq!(second.link, "");
        assert_eq!(second.description, "");
    }

    #[test]
    fn escaped_markup_is_stripped_next_to_html_entities() {
        let xml = "<rss><channel><item>\
            <title>Tom &amp; Jerry&nbsp;</title>\
            <description>&lt;p&gt;Hello&nbsp;world&lt;/p&gt;</description>\
            </item></channel></rss>";

        let articles = try_parse_feed(xml).unwrap();
        assert_eq!(articles[0].title, "Tom & Jerry&nbsp;");
        assert_eq!(articles[0].description, "Hello world");
    }

    #[test]
    fn atom_fields_with_fallbacks() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
          <entry>
            <title>Atom one</title>
            <link rel="self" href="https://a.example/self"/>
            <link href="https://a.example/one"/>
            <summary type="html">&lt;b&gt;Short&lt;/b&gt; summary</summary>
            <published>2024-05-01T08:00:00Z</published>
            <updated>2024-05-02T08:00:00Z</updated>
            <author><name> Lin </name><email>lin@example.com</email></author>
          </entry>
          <entry>
            <title>Atom two</title>
            <link rel="enclosure" href="https://a.example/two.mp3"/>
            <content type="html">&lt;p&gt;Full content&lt;/p&gt;</content>
            <updated>2024-06-01T08:00:00Z</updated>
          </entry>
        </feed>"#;

        let articles = try_parse_feed(xml).unwrap();
        assert_eq!(articles.len(), 2);

        let one = &articles[0];
        assert_eq!(one.link, "https://a.example/one");
        assert_eq!(one.description, "Short summary");
        assert_eq!(one.pub_date, "2024-05-01T08:00:00Z");
        assert_eq!(one.author.as_deref(), Some("Lin"));

        let two = &articles[1];
        assert_eq!(two.link, "https://a.example/two.mp3");
        assert_eq!(two.description, "Full content");
        assert_eq!(two.pub_date, "2024-06-01T08:00:00Z");
        assert_eq!(two.author, None);
        assert_eq!(two.image, None);
    }

    #[test]
    fn atom_entries_never_get_images() {
        let xml = r#"<feed><entry><title>t</title>
            <content type="html">&lt;img src="https://a.example/pic.png"&gt;</content>
        </entry></feed>"#;
        let articles = try_parse_feed(xml).unwrap();
        assert_eq!(articles[0].image, None);
    }

    #[test]
    fn item_wins_over_entry() {
        let xml = r#"<root>
            <entry><title>e1</title></entry>
            <item><title>i1</title></item>
            <entry><title>e2</title></entry>
            <item><title>i2</title></item>
            <item><title>i3</title></item>
        </root>"#;
        assert_eq!(Dialect::detect(&parse_document(xml).unwrap()), Some(Dialect::Rss));

        let titles: Vec<String> = try_parse_feed(xml).unwrap().into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["i1", "i2", "i3"]);
    }

    #[test]
    fn only_first_ten_items_are_converted() {
        let items: String = (0..15)
            .map(|i| format!("<item><title>n{}</title></item>", i))
            .collect();
        let xml = format!("<rss><channel>{}</channel></rss>", items);

        let articles = try_parse_feed(&xml).unwrap();
        assert_eq!(articles.len(), MAX_PREVIEW_ARTICLES);
        assert_eq!(articles[9].title, "n9");
    }

    #[test]
    fn documents_without_items_or_entries_are_empty() {
        assert!(try_parse_feed("<html><body>not a feed</body></html>").unwrap().is_empty());
    }
}
