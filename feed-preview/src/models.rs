use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 每次解析最多转换的条目数
pub const MAX_PREVIEW_ARTICLES: usize = 10;

/// 预览文章 - 从订阅源文档中提取，只用于订阅前展示
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewArticle {
    /// 标题
    pub title: String,
    /// 原文链接
    pub link: String,
    /// 去掉标记后的摘要
    pub description: String,
    /// 发布时间原文
    pub pub_date: String,
    /// 作者
    pub author: Option<String>,
    /// 配图地址
    pub image: Option<String>,
}

/// 文档解析错误，只在解析器内部使用
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("XML 解析失败: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("结束标签多于开始标签")]
    Unbalanced,

    #[error("元素未闭合: <{0}>")]
    Unclosed(String),
}
