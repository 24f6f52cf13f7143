use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use utils_common::models::{FeedRecord, FeedType};

/// 浏览器存储中保存筛选状态使用的键
pub const FILTER_STATE_STORAGE_KEY: &str = "feed-catalog:filter-state";

/// 默认每页条数
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// 界面提供的每页条数选项
pub const PAGE_SIZE_PRESETS: [usize; 4] = [10, 20, 50, 100];

/// 分类路径 - 四个层级中任意几个的稀疏选择
///
/// 四个字段全部相等（包括同时缺省）时两条路径相等。
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CategoryPath {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

impl CategoryPath {
    pub fn in_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            ..Self::default()
        }
    }

    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = Some(subdomain.into());
        self
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// 四个字段都未填写
    pub fn is_empty(&self) -> bool {
        self.domain.is_none() && self.subdomain.is_none() && self.area.is_none() && self.topic.is_none()
    }

    /// 每个已填写的字段都必须出现在记录对应的分类集合中
    pub fn matches(&self, record: &FeedRecord) -> bool {
        fn level_matches(selected: &Option<String>, values: &[String]) -> bool {
            selected.as_ref().map_or(true, |v| values.contains(v))
        }

        level_matches(&self.domain, &record.domain)
            && level_matches(&self.subdomain, &record.subdomain)
            && level_matches(&self.area, &record.area)
            && level_matches(&self.topic, &record.topic)
    }
}

/// 筛选状态 - 所有字段默认为空
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FilterState {
    /// 全文查询
    pub query: String,
    /// 已选订阅源类型
    pub types: BTreeSet<FeedType>,
    /// 已选分类路径（按相等规则去重）
    pub paths: Vec<CategoryPath>,
    /// 已选标签
    pub tags: BTreeSet<String>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty() && self.types.is_empty() && self.paths.is_empty() && self.tags.is_empty()
    }

    /// 切换类型，返回切换后是否处于选中状态
    pub fn toggle_type(&mut self, feed_type: FeedType) -> bool {
        if self.types.remove(&feed_type) {
            false
        } else {
            self.types.insert(feed_type);
            true
        }
    }

    /// 切换分类路径，返回切换后是否处于选中状态
    pub fn toggle_path(&mut self, path: CategoryPath) -> bool {
        if let Some(pos) = self.paths.iter().position(|p| *p == path) {
            self.paths.remove(pos);
            false
        } else {
            self.paths.push(path);
            true
        }
    }

    /// 切换标签，返回切换后是否处于选中状态
    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        if self.tags.remove(tag) {
            false
        } else {
            self.tags.insert(tag.to_string());
            true
        }
    }

    /// 序列化为持久化用的 JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// 把持久化的 JSON 浅合并到默认状态上
    ///
    /// 逐字段读取：能解析的字段覆盖默认值，缺失或无法解析的字段保持默认。
    /// 整体不是合法 JSON 对象时返回默认状态。
    pub fn merge_persisted(json: &str) -> FilterState {
        let mut state = FilterState::default();

        let value: serde_json::Value = match serde_json::from_str(json) {
            Ok(v) => v,
            Err(e) => {
                warn!("持久化的筛选状态无法解析，使用默认值: {}", e);
                return state;
            }
        };
        let Some(fields) = value.as_object() else {
            warn!("持久化的筛选状态不是对象，使用默认值");
            return state;
        };

        if let Some(query) = take_field::<String>(fields, "query") {
            state.query = query;
        }
        if let Some(types) = take_field::<BTreeSet<FeedType>>(fields, "types") {
            state.types = types;
        }
        if let Some(paths) = take_field::<Vec<CategoryPath>>(fields, "paths") {
            for path in paths {
                if !state.paths.contains(&path) {
                    state.paths.push(path);
                }
            }
        }
        if let Some(tags) = take_field::<BTreeSet<String>>(fields, "tags") {
            state.tags = tags;
        }

        state
    }
}

fn take_field<T: DeserializeOwned>(fields: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<T> {
    let value = fields.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("筛选状态字段 {} 无法解析，保持默认: {}", key, e);
            None
        }
    }
}

/// 排序方式 - 12 种
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    TitleAsc,
    TitleDesc,
    TypeAsc,
    TypeDesc,
    RatingAsc,
    RatingDesc,
    TagsAsc,
    TagsDesc,
    DateAsc,
    DateDesc,
    DomainAsc,
    TagAsc,
}

impl SortKey {
    pub const ALL: [SortKey; 12] = [
        SortKey::TitleAsc,
        SortKey::TitleDesc,
        SortKey::TypeAsc,
        SortKey::TypeDesc,
        SortKey::RatingAsc,
        SortKey::RatingDesc,
        SortKey::TagsAsc,
        SortKey::TagsDesc,
        SortKey::DateAsc,
        SortKey::DateDesc,
        SortKey::DomainAsc,
        SortKey::TagAsc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::TitleAsc => "title_asc",
            SortKey::TitleDesc => "title_desc",
            SortKey::TypeAsc => "type_asc",
            SortKey::TypeDesc => "type_desc",
            SortKey::RatingAsc => "rating_asc",
            SortKey::RatingDesc => "rating_desc",
            SortKey::TagsAsc => "tags_asc",
            SortKey::TagsDesc => "tags_desc",
            SortKey::DateAsc => "date_asc",
            SortKey::DateDesc => "date_desc",
            SortKey::DomainAsc => "domain_asc",
            SortKey::TagAsc => "tag_asc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("未知的排序方式: {}", s))
    }
}

/// 单个筛选维度上的一个取值，用于计数
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Facet {
    Type(FeedType),
    Tag(String),
    Path(CategoryPath),
}

impl Facet {
    /// 从 JS 传入的 (kind, value) 解析；path 的 value 是 JSON
    pub fn parse(kind: &str, value: &str) -> Result<Facet, String> {
        match kind {
            "type" => value.parse().map(Facet::Type),
            "tag" => Ok(Facet::Tag(value.to_string())),
            "path" => serde_json::from_str(value)
                .map(Facet::Path)
                .map_err(|e| format!("解析分类路径失败: {}", e)),
            other => Err(format!("未知的筛选维度: {}", other)),
        }
    }

    pub fn matches(&self, record: &FeedRecord) -> bool {
        match self {
            Facet::Type(t) => record.feed_type == *t,
            Facet::Tag(tag) => record.tags.iter().any(|t| t == tag),
            Facet::Path(path) => path.matches(record),
        }
    }
}

/// 全目录上每个类型、每个标签的出现次数
#[derive(Serialize, Debug, Default, PartialEq)]
pub struct FacetCounts {
    pub types: BTreeMap<FeedType, usize>,
    pub tags: BTreeMap<String, usize>,
}

/// 筛选结果 - 当前页的数据和分页信息
#[derive(Serialize, Debug, Clone)]
pub struct ResultView {
    /// 当前页的订阅源
    pub items: Vec<FeedRecord>,
    /// 筛选结果总数
    pub total: usize,
    /// 当前页码
    pub page: usize,
    /// 每页条数
    pub page_size: usize,
    /// 总页数
    pub total_pages: usize,
}
