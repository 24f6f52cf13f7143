use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::Range;
use tracing::debug;
use utils_common::models::{FeedRecord, FeedType};

use crate::catalog::Catalog;
use crate::index::CategoryIndex;
use crate::models::{CategoryPath, Facet, FacetCounts, FilterState, ResultView, SortKey, DEFAULT_PAGE_SIZE};

/// 全文查询：标题、地址、四级分类和标签拼接后做不区分大小写的子串匹配
///
/// 字段之间插入一个空格再拼接，相邻字段的首尾不会直接连成匹配（如 "blogrust"）。
fn matches_query(record: &FeedRecord, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    let haystack = [record.title.as_str(), record.url.as_str()]
        .into_iter()
        .chain(record.domain.iter().map(String::as_str))
        .chain(record.subdomain.iter().map(String::as_str))
        .chain(record.area.iter().map(String::as_str))
        .chain(record.topic.iter().map(String::as_str))
        .chain(record.tags.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    haystack.contains(&needle)
}

/// 单条记录是否满足筛选条件
///
/// 各维度之间为 AND；路径和标签维度内部为 OR；空维度视为满足。
pub fn matches_filter(state: &FilterState, record: &FeedRecord) -> bool {
    matches_query(record, &state.query)
        && (state.types.is_empty() || state.types.contains(&record.feed_type))
        && (state.paths.is_empty() || state.paths.iter().any(|p| p.matches(record)))
        && (state.tags.is_empty() || record.tags.iter().any(|t| state.tags.contains(t)))
}

/// 按目录顺序返回满足条件的记录下标
pub fn filter_indices(records: &[FeedRecord], state: &FilterState) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| matches_filter(state, record))
        .map(|(i, _)| i)
        .collect()
}

fn compare_by_key(a: &FeedRecord, b: &FeedRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::TitleAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::TitleDesc => b.title.to_lowercase().cmp(&a.title.to_lowercase()),
        SortKey::TypeAsc => a.feed_type.as_str().cmp(b.feed_type.as_str()),
        SortKey::TypeDesc => b.feed_type.as_str().cmp(a.feed_type.as_str()),
        SortKey::RatingAsc => a.rating_or_default().total_cmp(&b.rating_or_default()),
        SortKey::RatingDesc => b.rating_or_default().total_cmp(&a.rating_or_default()),
        SortKey::TagsAsc => a.tags.len().cmp(&b.tags.len()),
        SortKey::TagsDesc => b.tags.len().cmp(&a.tags.len()),
        SortKey::DateAsc => a.created_millis().cmp(&b.created_millis()),
        SortKey::DateDesc => b.created_millis().cmp(&a.created_millis()),
        SortKey::DomainAsc => a.first_domain().cmp(b.first_domain()),
        SortKey::TagAsc => a.first_tag().cmp(b.first_tag()),
    }
}

/// 排序记录下标；相等时按目录顺序，与输入的先后无关
pub fn sort_indices(records: &[FeedRecord], indices: &mut [usize], key: SortKey) {
    indices.sort_by(|&a, &b| compare_by_key(&records[a], &records[b], key).then(a.cmp(&b)));
}

/// 当前页在结果中的区间，越界时为空区间
pub fn page_range(total: usize, page: usize, page_size: usize) -> Range<usize> {
    let start = page.saturating_sub(1).saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    start..end
}

/// 总页数 = ceil(total / page_size)
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// 筛选排序引擎 - 持有目录、分类索引和全部界面状态
pub struct FilterEngine {
    catalog: Catalog,
    index: CategoryIndex,
    state: FilterState,
    sort: SortKey,
    page: usize,
    page_size: usize,
    /// 缓存的筛选结果（已按当前排序），筛选条件变化时失效
    matched: Option<Vec<usize>>,
}

impl FilterEngine {
    pub fn new(catalog: Catalog) -> Self {
        let index = CategoryIndex::build(catalog.records());
        debug!(
            "分类索引构建完成，一级分类: {}, topic 条目: {}",
            index.domains.len(),
            index.topic_count()
        );

        Self {
            catalog,
            index,
            state: FilterState::default(),
            sort: SortKey::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            matched: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn category_index(&self) -> &CategoryIndex {
        &self.index
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.state
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn invalidate(&mut self) {
        self.matched = None;
        self.page = 1;
    }

    pub fn set_query(&mut self, text: &str) {
        self.state.query = text.to_string();
        self.invalidate();
    }

    pub fn toggle_type(&mut self, feed_type: FeedType) -> bool {
        let selected = self.state.toggle_type(feed_type);
        self.invalidate();
        selected
    }

    pub fn toggle_path(&mut self, path: CategoryPath) -> bool {
        let selected = self.state.toggle_path(path);
        self.invalidate();
        selected
    }

    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        let selected = self.state.toggle_tag(tag);
        self.invalidate();
        selected
    }

    /// 修改排序，不重置页码，也不重新筛选
    pub fn set_sort(&mut self, key: SortKey) {
        self.sort = key;
        if let Some(matched) = self.matched.as_mut() {
            sort_indices(self.catalog.records(), matched, key);
        }
    }

    pub fn clear_all(&mut self) {
        self.state = FilterState::default();
        self.invalidate();
    }

    /// 用恢复的筛选状态替换当前状态
    pub fn restore_state(&mut self, state: FilterState) {
        self.state = state;
        self.invalidate();
    }

    /// 页码从 1 开始，0 按 1 处理；超出范围时 evaluate 返回空页
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// 修改每页条数并回到第一页
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    fn matched(&mut self) -> &[usize] {
        if self.matched.is_none() {
            let mut indices = filter_indices(self.catalog.records(), &self.state);
            sort_indices(self.catalog.records(), &mut indices, self.sort);
            debug!("重新筛选，结果数量: {} / {}", indices.len(), self.catalog.len());
            self.matched = Some(indices);
        }
        self.matched.as_deref().unwrap_or(&[])
    }

    /// 筛选结果总数
    pub fn total(&mut self) -> usize {
        self.matched().len()
    }

    pub fn total_pages(&mut self) -> usize {
        let total = self.total();
        page_count(total, self.page_size)
    }

    /// 按当前筛选、排序和分页计算结果
    pub fn evaluate(&mut self) -> ResultView {
        let (page, page_size) = (self.page, self.page_size);
        let matched = self.matched();
        let total = matched.len();
        let range = page_range(total, page, page_size);
        let window = matched[range].to_vec();

        let items = window
            .into_iter()
            .filter_map(|i| self.catalog.get(i).cloned())
            .collect();

        ResultView {
            items,
            total,
            page,
            page_size,
            total_pages: page_count(total, page_size),
        }
    }

    /// 单个维度取值在整个目录上的匹配数量，与当前筛选状态无关
    pub fn count_for(&self, facet: &Facet) -> usize {
        self.catalog.records().iter().filter(|r| facet.matches(r)).count()
    }

    /// 全目录上所有类型和标签的出现次数
    pub fn facet_counts(&self) -> FacetCounts {
        let mut counts = FacetCounts::default();
        for record in self.catalog.records() {
            *counts.types.entry(record.feed_type).or_insert(0) += 1;
            let unique: BTreeSet<&String> = record.tags.iter().collect();
            for tag in unique {
                *counts.tags.entry(tag.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// 目录中出现过的全部标签，排序去重
    pub fn all_tags(&self) -> Vec<String> {
        self.catalog
            .records()
            .iter()
            .flat_map(|r| r.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
