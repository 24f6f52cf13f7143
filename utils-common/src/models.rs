use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 订阅源类型 - 固定枚举
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeedType {
    Blog,
    News,
    Podcast,
    Video,
    Newsletter,
    Forum,
    Magazine,
}

impl FeedType {
    /// 所有类型，按声明顺序
    pub const ALL: [FeedType; 7] = [
        FeedType::Blog,
        FeedType::News,
        FeedType::Podcast,
        FeedType::Video,
        FeedType::Newsletter,
        FeedType::Forum,
        FeedType::Magazine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedType::Blog => "Blog",
            FeedType::News => "News",
            FeedType::Podcast => "Podcast",
            FeedType::Video => "Video",
            FeedType::Newsletter => "Newsletter",
            FeedType::Forum => "Forum",
            FeedType::Magazine => "Magazine",
        }
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeedType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("未知的订阅源类型: {}", s))
    }
}

/// 订阅源记录 - 目录中的一条数据，加载后不可变
///
/// 四个分类层级彼此独立：一条记录可以同时属于多个 domain / subdomain /
/// area / topic，这些集合不构成单一路径。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    /// 唯一标识符
    pub id: String,
    /// 标题
    pub title: String,
    /// 订阅地址
    pub url: String,
    /// 图标地址
    #[serde(default)]
    pub logo: Option<String>,
    /// 一级分类
    #[serde(default)]
    pub domain: Vec<String>,
    /// 二级分类
    #[serde(default)]
    pub subdomain: Vec<String>,
    /// 三级分类
    #[serde(default)]
    pub area: Vec<String>,
    /// 四级分类
    #[serde(default)]
    pub topic: Vec<String>,
    /// 自由标签
    #[serde(default)]
    pub tags: Vec<String>,
    /// 订阅源类型
    #[serde(rename = "type")]
    pub feed_type: FeedType,
    /// 创建时间
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// 简介
    #[serde(default)]
    pub summary: Option<String>,
    /// 评分 [0, 5]，半分粒度
    #[serde(default)]
    pub rating: Option<f64>,
}

impl FeedRecord {
    /// 创建只有必填字段的记录
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>, feed_type: FeedType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            logo: None,
            domain: Vec::new(),
            subdomain: Vec::new(),
            area: Vec::new(),
            topic: Vec::new(),
            tags: Vec::new(),
            feed_type,
            created_at: None,
            summary: None,
            rating: None,
        }
    }

    /// 缺失评分按 0 处理
    pub fn rating_or_default(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    /// 缺失创建时间按 epoch 0 处理，返回毫秒时间戳
    pub fn created_millis(&self) -> i64 {
        self.created_at.map(|d| d.timestamp_millis()).unwrap_or(0)
    }

    /// 第一个一级分类，没有时为空串
    pub fn first_domain(&self) -> &str {
        self.domain.first().map(String::as_str).unwrap_or("")
    }

    /// 第一个标签，没有时为空串
    pub fn first_tag(&self) -> &str {
        self.tags.first().map(String::as_str).unwrap_or("")
    }
}
