use wasm_bindgen::prelude::*;
use tracing::warn;

pub mod document;
pub mod image;
pub mod models;
pub mod parser;
pub mod sanitize;

pub use models::{PreviewArticle, PreviewError, MAX_PREVIEW_ARTICLES};
pub use parser::{try_parse_feed, Dialect};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// 初始化函数 - 设置错误处理
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// 把订阅源文档解析为最多 10 篇预览文章
///
/// 文档无法解析时返回空列表，不向调用方报错。
pub fn parse_feed(xml: &str) -> Vec<PreviewArticle> {
    match try_parse_feed(xml) {
        Ok(articles) => articles,
        Err(e) => {
            warn!("订阅源文档解析失败，返回空列表: {}", e);
            Vec::new()
        }
    }
}

/// WASM入口点 - 解析订阅源预览，解析失败时同样返回空数组
#[wasm_bindgen(js_name = parseFeedPreview)]
pub fn parse_feed_preview(xml: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&parse_feed(xml))
        .map_err(|e| JsValue::from_str(&format!("序列化预览文章失败: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_documents_degrade_to_empty() {
        assert!(parse_feed("<rss><channel><item><title>x</title></channel></rss>").is_empty());
        assert!(parse_feed("").is_empty());
        assert!(parse_feed("just some text").is_empty());
    }

    #[test]
    fn rss_preview_with_inline_image_serializes_camel_case() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <rss version="2.0"
             xmlns:content="http://purl.org/rss/1.0/modules/content/"
             xmlns:media="http://search.yahoo.com/mrss/">
          <channel>
            <title>Example</title>
            <item>
              <title>With picture</title>
              <link>https://news.example/a</link>
              <description><![CDATA[<p>Lead&nbsp;paragraph</p>]]></description>
              <content:encoded><![CDATA[<figure><img src="https://news.example/a.jpg" alt=""></figure><p>Body</p>]]></content:encoded>
              <media:content url="https://news.example/a-media.jpg" medium="image"/>
              <pubDate>Tue, 03 Jan 2023 09:30:00 GMT</pubDate>
            </item>
          </channel>
        </rss>"#;

        let articles = parse_feed(xml);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].description, "Lead paragraph");
        assert_eq!(articles[0].image.as_deref(), Some("https://news.example/a.jpg"));

        let json = serde_json::to_value(&articles[0]).unwrap();
        assert_eq!(json["pubDate"], "Tue, 03 Jan 2023 09:30:00 GMT");
        assert_eq!(json["author"], serde_json::Value::Null);
    }
}
