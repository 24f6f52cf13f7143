use std::collections::HashSet;
use thiserror::Error;
use tracing::info;
use utils_common::compression::{from_compressed_with_max_version, to_compressed};
use utils_common::models::FeedRecord;

/// bundle 容器版本
pub const BUNDLE_VERSION: [u8; 2] = [1, 0];

/// 目录加载错误
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("解析目录 JSON 失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("目录 bundle 读写失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("目录为空")]
    Empty,

    #[error("订阅源 {id} 的评分无效: {rating}")]
    InvalidRating { id: String, rating: f64 },

    #[error("重复的订阅源标识: {0}")]
    DuplicateId(String),
}

/// 订阅源目录 - 启动时加载一次，之后不再修改
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<FeedRecord>,
}

impl Catalog {
    /// 校验记录并创建目录
    pub fn new(records: Vec<FeedRecord>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id.as_str()) {
                return Err(CatalogError::DuplicateId(record.id.clone()));
            }
            if let Some(rating) = record.rating {
                if !is_valid_rating(rating) {
                    return Err(CatalogError::InvalidRating {
                        id: record.id.clone(),
                        rating,
                    });
                }
            }
        }

        info!("目录加载完成，订阅源数量: {}", records.len());
        Ok(Self { records })
    }

    /// 从 JSON 数组加载
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<FeedRecord> = serde_json::from_str(json)?;
        Self::new(records)
    }

    /// 从压缩 bundle 加载
    pub fn from_bundle(data: &[u8]) -> Result<Self, CatalogError> {
        let records: Vec<FeedRecord> = from_compressed_with_max_version(data, BUNDLE_VERSION[0])?;
        Self::new(records)
    }

    /// 编码为压缩 bundle
    pub fn to_bundle(&self) -> Result<Vec<u8>, CatalogError> {
        Ok(to_compressed(&self.records, BUNDLE_VERSION)?)
    }

    pub fn records(&self) -> &[FeedRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&FeedRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// [0, 5] 区间内的半分值
fn is_valid_rating(rating: f64) -> bool {
    (0.0..=5.0).contains(&rating) && (rating * 2.0).fract() == 0.0
}
