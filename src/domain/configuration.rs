// ==========================================
// 整车配置规划 - 运行期配置选择
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 一次配置选择: 类别ID → 至多一个已选特征值ID
///
/// 未选择的类别不出现在映射中 (不是 null)。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(BTreeMap<String, String>);

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式构造,便于测试与 CLI 使用
    pub fn with(mut self, class_id: &str, characteristic_id: &str) -> Self {
        self.select(class_id, characteristic_id);
        self
    }

    /// 选择特征值;空字符串视为未选择
    pub fn select(&mut self, class_id: &str, characteristic_id: &str) {
        if characteristic_id.trim().is_empty() {
            self.0.remove(class_id);
        } else {
            self.0
                .insert(class_id.to_string(), characteristic_id.to_string());
        }
    }

    pub fn clear(&mut self, class_id: &str) {
        self.0.remove(class_id);
    }

    /// 已选特征值 (反序列化进来的空字符串同样视为未选择)
    pub fn selected(&self, class_id: &str) -> Option<&str> {
        self.0
            .get(class_id)
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut cfg = Configuration::new();
        for (class_id, characteristic_id) in iter {
            cfg.select(&class_id, &characteristic_id);
        }
        cfg
    }
}
