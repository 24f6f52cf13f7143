use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utils_common::models::FeedRecord;

use crate::models::CategoryPath;

/// 三级分类节点 - 保存去重后的四级分类
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AreaNode {
    pub topics: Vec<String>,
}

/// 二级分类节点
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SubdomainNode {
    pub areas: BTreeMap<String, AreaNode>,
}

/// 一级分类节点
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DomainNode {
    pub subdomains: BTreeMap<String, SubdomainNode>,
}

/// 分类索引 - domain → subdomain → area → topics
///
/// 完全由目录派生。每条记录按自身四个分类集合的笛卡尔积写入，
/// 所以 domains {A, B} × subdomains {X, Y} 会得到 A→X、A→Y、B→X、B→Y
/// 四条路径，即使数据本意只有 A→X 与 B→Y。
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CategoryIndex {
    pub domains: BTreeMap<String, DomainNode>,
}

impl CategoryIndex {
    /// 从全部记录构建索引
    pub fn build(records: &[FeedRecord]) -> Self {
        let mut index = Self::default();
        for record in records {
            for domain in &record.domain {
                for subdomain in &record.subdomain {
                    for area in &record.area {
                        for topic in &record.topic {
                            index.insert(domain, subdomain, area, topic);
                        }
                    }
                }
            }
        }
        index
    }

    fn insert(&mut self, domain: &str, subdomain: &str, area: &str, topic: &str) {
        let topics = &mut self
            .domains
            .entry(domain.to_string())
            .or_default()
            .subdomains
            .entry(subdomain.to_string())
            .or_default()
            .areas
            .entry(area.to_string())
            .or_default()
            .topics;

        if !topics.iter().any(|t| t == topic) {
            topics.push(topic.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    pub fn subdomains(&self, domain: &str) -> Vec<&str> {
        self.domains
            .get(domain)
            .map(|d| d.subdomains.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn areas(&self, domain: &str, subdomain: &str) -> Vec<&str> {
        self.subdomain_node(domain, subdomain)
            .map(|s| s.areas.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn topics(&self, domain: &str, subdomain: &str, area: &str) -> &[String] {
        self.subdomain_node(domain, subdomain)
            .and_then(|s| s.areas.get(area))
            .map(|a| a.topics.as_slice())
            .unwrap_or(&[])
    }

    /// 路径是否在索引中可达
    ///
    /// 只检查连续填写的前缀；跳级的路径（例如只填 domain 和 area）
    /// 不对应树上的某个节点，返回 false。
    pub fn contains(&self, path: &CategoryPath) -> bool {
        let Some(domain) = path.domain.as_deref() else {
            return path.is_empty();
        };
        let Some(domain_node) = self.domains.get(domain) else {
            return false;
        };

        let Some(subdomain) = path.subdomain.as_deref() else {
            return path.area.is_none() && path.topic.is_none();
        };
        let Some(subdomain_node) = domain_node.subdomains.get(subdomain) else {
            return false;
        };

        let Some(area) = path.area.as_deref() else {
            return path.topic.is_none();
        };
        let Some(area_node) = subdomain_node.areas.get(area) else {
            return false;
        };

        match path.topic.as_deref() {
            Some(topic) => area_node.topics.iter().any(|t| t == topic),
            None => true,
        }
    }

    /// 索引中的 topic 条目总数
    pub fn topic_count(&self) -> usize {
        self.domains
            .values()
            .flat_map(|d| d.subdomains.values())
            .flat_map(|s| s.areas.values())
            .map(|a| a.topics.len())
            .sum()
    }

    fn subdomain_node(&self, domain: &str, subdomain: &str) -> Option<&SubdomainNode> {
        self.domains.get(domain)?.subdomains.get(subdomain)
    }
}
