use std::fs;
use std::path::Path;
use tracing::info;
use utils_common::models::FeedRecord;

use crate::catalog::{Catalog, CatalogError};
use crate::index::CategoryIndex;

/// 目录 bundle 构建器 - 供命令行工具汇总多个目录文件
#[derive(Default)]
pub struct CatalogBuilder {
    records: Vec<FeedRecord>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前收集的记录数量
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn add_record(&mut self, record: FeedRecord) {
        self.records.push(record);
    }

    /// 解析一个 JSON 数组并追加其中的记录，返回追加的数量
    pub fn add_json(&mut self, json: &str) -> Result<usize, CatalogError> {
        let records: Vec<FeedRecord> = serde_json::from_str(json)?;
        let count = records.len();
        self.records.extend(records);
        Ok(count)
    }

    /// 校验并生成目录
    pub fn build_catalog(&self) -> Result<Catalog, CatalogError> {
        if self.records.is_empty() {
            return Err(CatalogError::Empty);
        }
        Catalog::new(self.records.clone())
    }

    /// 写出压缩 bundle 和分类索引 JSON，返回构建出的目录
    pub fn save(&self, bundle_path: &Path, index_path: &Path) -> Result<Catalog, CatalogError> {
        let catalog = self.build_catalog()?;

        let bundle = catalog.to_bundle()?;
        fs::write(bundle_path, &bundle)?;
        info!("目录 bundle 已写入: {}，大小: {} 字节", bundle_path.display(), bundle.len());

        let index = CategoryIndex::build(catalog.records());
        let index_json = serde_json::to_string_pretty(&index)?;
        fs::write(index_path, index_json)?;
        info!(
            "分类索引已写入: {}，一级分类: {}，topic 条目: {}",
            index_path.display(),
            index.domains.len(),
            index.topic_count()
        );

        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utils_common::models::FeedType;

    #[test]
    fn empty_builder_refuses_to_build() {
        assert!(matches!(CatalogBuilder::new().build_catalog(), Err(CatalogError::Empty)));
    }

    #[test]
    fn collects_records_from_several_json_arrays() {
        let mut builder = CatalogBuilder::new();
        let first = r#"[{"id": "a", "title": "A", "url": "https://a.example", "type": "Blog"}]"#;
        let second = r#"[
            {"id": "b", "title": "B", "url": "https://b.example", "type": "News"},
            {"id": "c", "title": "C", "url": "https://c.example", "type": "Video"}
        ]"#;

        assert_eq!(builder.add_json(first).unwrap(), 1);
        assert_eq!(builder.add_json(second).unwrap(), 2);
        assert_eq!(builder.build_catalog().unwrap().len(), 3);
    }

    #[test]
    fn single_records_are_validated_with_the_rest() {
        let mut builder = CatalogBuilder::new();
        builder.add_record(FeedRecord::new("a", "A", "https://a.example", FeedType::Blog));
        let mut bad = FeedRecord::new("b", "B", "https://b.example", FeedType::News);
        bad.rating = Some(4.3);
        builder.add_record(bad);

        assert_eq!(builder.record_count(), 2);
        assert!(matches!(builder.build_catalog(), Err(CatalogError::InvalidRating { .. })));
    }

    #[test]
    fn duplicate_across_files_is_caught_at_build() {
        let mut builder = CatalogBuilder::new();
        let json = r#"[{"id": "a", "title": "A", "url": "https://a.example", "type": "Blog"}]"#;
        builder.add_json(json).unwrap();
        builder.add_json(json).unwrap();
        assert!(matches!(builder.build_catalog(), Err(CatalogError::DuplicateId(_))));
    }
}
