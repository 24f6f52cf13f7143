use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::Element;

static IMG_SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src\s*=\s*["']([^"'>]+)["']"#).expect("img pattern"));

/// 配图来源，按优先级排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStrategy {
    /// content:encoded（没有时用 description）中的第一个 `<img src>`
    InlineImage,
    /// media:content 的 url 属性
    MediaContent,
    /// type 以 image 开头的 enclosure 的 url 属性
    ImageEnclosure,
}

/// 依次尝试的策略，第一个命中的为准
pub const IMAGE_STRATEGIES: [ImageStrategy; 3] = [
    ImageStrategy::InlineImage,
    ImageStrategy::MediaContent,
    ImageStrategy::ImageEnclosure,
];

impl ImageStrategy {
    pub fn extract(self, item: &Element) -> Option<String> {
        let url = match self {
            ImageStrategy::InlineImage => {
                let html = item
                    .find("content:encoded")
                    .or_else(|| item.find("description"))?
                    .text_content();
                first_img_src(&html)
            }
            ImageStrategy::MediaContent => item
                .descendants("media:content")
                .into_iter()
                .find_map(|media| media.attr("url"))
                .map(str::to_string),
            ImageStrategy::ImageEnclosure => item
                .descendants("enclosure")
                .into_iter()
                .filter(|e| e.attr("type").is_some_and(|t| t.starts_with("image")))
                .find_map(|e| e.attr("url"))
                .map(str::to_string),
        }?;

        let url = url.trim();
        (!url.is_empty()).then(|| url.to_string())
    }
}

/// 找 RSS 条目的配图
pub fn discover_image(item: &Element) -> Option<String> {
    IMAGE_STRATEGIES.iter().find_map(|strategy| strategy.extract(item))
}

fn first_img_src(html: &str) -> Option<String> {
    IMG_SRC_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
