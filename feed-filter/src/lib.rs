use wasm_bindgen::prelude::*;
use serde::Serialize;
use web_sys::console;
use utils_common::models::FeedType;

// 导出模块
pub mod builder;
pub mod catalog;
pub mod engine;
pub mod index;
pub mod models;

pub use catalog::{Catalog, CatalogError};
pub use engine::FilterEngine;
pub use index::CategoryIndex;
pub use models::{CategoryPath, Facet, FacetCounts, FilterState, ResultView, SortKey};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// 初始化函数 - 设置错误处理
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// 版本信息
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// 序列化为普通 JS 对象（map 输出为 object 而不是 Map）
fn to_js<T: Serialize>(value: &T, what: &str) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("序列化{}失败: {}", what, e)))
}

fn js_error(context: &str, message: impl std::fmt::Display) -> JsValue {
    let text = format!("{}: {}", context, message);
    console::log_1(&JsValue::from_str(&text));
    JsValue::from_str(&text)
}

/// 订阅源筛选器 JS 接口 - 每个实例独立持有目录和筛选状态
#[wasm_bindgen]
pub struct FeedFilterJS {
    engine: FilterEngine,
}

#[wasm_bindgen]
impl FeedFilterJS {
    /// 从 JSON 数组创建筛选器
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(catalog_json: &str) -> Result<FeedFilterJS, JsValue> {
        let catalog = Catalog::from_json(catalog_json).map_err(|e| js_error("加载目录失败", e))?;
        Ok(FeedFilterJS {
            engine: FilterEngine::new(catalog),
        })
    }

    /// 从压缩 bundle 创建筛选器
    #[wasm_bindgen(js_name = fromBundle)]
    pub fn from_bundle(data: &[u8]) -> Result<FeedFilterJS, JsValue> {
        let catalog = Catalog::from_bundle(data).map_err(|e| js_error("加载目录 bundle 失败", e))?;
        Ok(FeedFilterJS {
            engine: FilterEngine::new(catalog),
        })
    }

    #[wasm_bindgen(js_name = setQuery)]
    pub fn set_query(&mut self, text: &str) {
        self.engine.set_query(text);
    }

    #[wasm_bindgen(js_name = toggleType)]
    pub fn toggle_type(&mut self, type_name: &str) -> Result<bool, JsValue> {
        let feed_type: FeedType = type_name.parse().map_err(|e| js_error("切换类型失败", e))?;
        Ok(self.engine.toggle_type(feed_type))
    }

    /// path_json 形如 {"domain": "...", "subdomain": "..."}
    #[wasm_bindgen(js_name = togglePath)]
    pub fn toggle_path(&mut self, path_json: &str) -> Result<bool, JsValue> {
        let path: CategoryPath = serde_json::from_str(path_json).map_err(|e| js_error("解析分类路径失败", e))?;
        Ok(self.engine.toggle_path(path))
    }

    #[wasm_bindgen(js_name = toggleTag)]
    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        self.engine.toggle_tag(tag)
    }

    #[wasm_bindgen(js_name = setSort)]
    pub fn set_sort(&mut self, key: &str) -> Result<(), JsValue> {
        let key: SortKey = key.parse().map_err(|e| js_error("设置排序失败", e))?;
        self.engine.set_sort(key);
        Ok(())
    }

    #[wasm_bindgen(js_name = setPage)]
    pub fn set_page(&mut self, page: usize) {
        self.engine.set_page(page);
    }

    #[wasm_bindgen(js_name = setPageSize)]
    pub fn set_page_size(&mut self, page_size: usize) {
        self.engine.set_page_size(page_size);
    }

    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&mut self) {
        self.engine.clear_all();
    }

    /// 计算当前页
    pub fn evaluate(&mut self) -> Result<JsValue, JsValue> {
        let view = self.engine.evaluate();
        to_js(&view, "筛选结果")
    }

    #[wasm_bindgen(js_name = totalPages)]
    pub fn total_pages(&mut self) -> usize {
        self.engine.total_pages()
    }

    /// kind 为 "type" | "tag" | "path"，path 的 value 是 JSON
    #[wasm_bindgen(js_name = countFor)]
    pub fn count_for(&self, kind: &str, value: &str) -> Result<usize, JsValue> {
        let facet = Facet::parse(kind, value).map_err(|e| js_error("解析筛选维度失败", e))?;
        Ok(self.engine.count_for(&facet))
    }

    #[wasm_bindgen(js_name = facetCounts)]
    pub fn facet_counts(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.facet_counts(), "计数")
    }

    #[wasm_bindgen(js_name = categoryIndex)]
    pub fn category_index(&self) -> Result<JsValue, JsValue> {
        to_js(self.engine.category_index(), "分类索引")
    }

    #[wasm_bindgen(js_name = allTags)]
    pub fn all_tags(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.all_tags(), "标签")
    }

    /// 持久化用的存储键
    #[wasm_bindgen(js_name = storageKey)]
    pub fn storage_key() -> String {
        models::FILTER_STATE_STORAGE_KEY.to_string()
    }

    /// 界面可选的每页条数
    #[wasm_bindgen(js_name = pageSizePresets)]
    pub fn page_size_presets() -> Vec<u32> {
        models::PAGE_SIZE_PRESETS.iter().map(|&size| size as u32).collect()
    }

    /// 导出当前筛选状态 JSON
    #[wasm_bindgen(js_name = saveState)]
    pub fn save_state(&self) -> Result<String, JsValue> {
        self.engine
            .filter_state()
            .to_json()
            .map_err(|e| js_error("序列化筛选状态失败", e))
    }

    /// 合并存储中的筛选状态，无法读取的字段保持默认
    #[wasm_bindgen(js_name = restoreState)]
    pub fn restore_state(&mut self, json: &str) {
        self.engine.restore_state(FilterState::merge_persisted(json));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {"id": "a", "title": "A", "url": "https://a.example", "type": "Blog", "tags": ["x"]},
        {"id": "b", "title": "B", "url": "https://b.example", "type": "News"}
    ]"#;

    #[test]
    fn page_size_presets_include_the_default() {
        let presets = FeedFilterJS::page_size_presets();
        assert_eq!(presets, [10, 20, 50, 100]);
        assert!(presets.contains(&(models::DEFAULT_PAGE_SIZE as u32)));
    }

    #[test]
    fn saved_state_restores_into_a_fresh_filter() {
        let mut filter = FeedFilterJS::from_json(CATALOG).unwrap_or_else(|_| panic!("catalog"));
        filter.toggle_tag("x");
        let saved = filter.save_state().unwrap_or_else(|_| panic!("save"));

        let mut restored = FeedFilterJS::from_json(CATALOG).unwrap_or_else(|_| panic!("catalog"));
        restored.restore_state(&saved);
        assert_eq!(restored.engine.total(), 1);
        assert_eq!(FeedFilterJS::storage_key(), "feed-catalog:filter-state");
    }
}
