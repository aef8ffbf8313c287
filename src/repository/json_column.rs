// ==========================================
// JSON 文本列读写
// ==========================================
// 条件/结果/分布/禁售等嵌套字段以 JSON 文本存储,
// 在 row 闭包内解析,错误以 rusqlite::Error 形式返回
// ==========================================

use rusqlite::types::Type;
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// 编码为 JSON 文本
pub fn encode<T: Serialize + ?Sized>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// 从指定列解析 JSON
pub fn decode<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
