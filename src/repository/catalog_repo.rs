// ==========================================
// 整车配置规划 - 产品目录仓储
// ==========================================
// 职责: product / feature_class / characteristic / region 表的 CRUD
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::catalog::{Characteristic, FeatureClass, Product, Region};
use crate::domain::types::ClassKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::json_column;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock(conn: &Arc<Mutex<Connection>>) -> RepositoryResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| RepositoryError::LockError(e.to_string()))
}

fn not_found(entity: &str, id: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity: entity.to_string(),
        id: id.to_string(),
    }
}

fn next_seq(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!("SELECT COALESCE(MAX(seq), 0) + 1 FROM {}", table),
        [],
        |row| row.get(0),
    )
}

// ==========================================
// 行映射 / 语句 (供批量导入、版本恢复在事务内复用)
// ==========================================

fn map_product(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        base_volume: row.get::<_, Option<i64>>(3)?.map(|v| v.max(0) as u64),
    })
}

fn map_class(row: &Row<'_>) -> rusqlite::Result<FeatureClass> {
    let kind_raw: String = row.get(3)?;
    let kind = kind_raw
        .parse::<ClassKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;
    Ok(FeatureClass {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        kind,
        required: row.get::<_, i64>(4)? != 0,
        product_id: row.get(5)?,
        characteristics: Vec::new(),
    })
}

fn map_characteristic(row: &Row<'_>) -> rusqlite::Result<Characteristic> {
    Ok(Characteristic {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        active: row.get::<_, i64>(3)? != 0,
        base_probability: row.get(4)?,
    })
}

fn map_region(row: &Row<'_>) -> rusqlite::Result<Region> {
    Ok(Region {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        steering_value: row.get(3)?,
        volume_share: row.get(4)?,
        excluded_characteristics: json_column::decode(row, 5)?,
    })
}

const PRODUCT_COLUMNS: &str = "id, name, description, base_volume";
const CLASS_COLUMNS: &str = "id, name, color, kind, required, product_id";
const CHARACTERISTIC_COLUMNS: &str = "id, name, code, active, base_probability";
const REGION_COLUMNS: &str = "id, name, code, steering_value, volume_share, excluded_characteristics";

pub(crate) fn load_products(conn: &Connection) -> rusqlite::Result<Vec<Product>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM product ORDER BY seq, id", PRODUCT_COLUMNS))?;
    let rows = stmt.query_map([], map_product)?;
    rows.collect()
}

pub(crate) fn insert_product(conn: &Connection, product: &Product) -> rusqlite::Result<()> {
    let seq = next_seq(conn, "product")?;
    conn.execute(
        "INSERT INTO product (id, name, description, base_volume, seq) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            product.id,
            product.name,
            product.description,
            product.base_volume.map(|v| v as i64),
            seq
        ],
    )?;
    Ok(())
}

fn load_characteristics(conn: &Connection, class_id: &str) -> rusqlite::Result<Vec<Characteristic>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM characteristic WHERE class_id = ?1 ORDER BY seq, id",
        CHARACTERISTIC_COLUMNS
    ))?;
    let rows = stmt.query_map(params![class_id], map_characteristic)?;
    rows.collect()
}

fn insert_characteristics(
    conn: &Connection,
    class_id: &str,
    characteristics: &[Characteristic],
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO characteristic (id, class_id, name, code, active, base_probability, seq)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for (seq, ch) in characteristics.iter().enumerate() {
        stmt.execute(params![
            ch.id,
            class_id,
            ch.name,
            ch.code,
            ch.active as i64,
            ch.base_probability,
            seq as i64
        ])?;
    }
    Ok(())
}

/// 读取类别 (含特征值);product_id 为 None 时返回全部
pub(crate) fn load_classes(conn: &Connection, product_id: Option<&str>) -> rusqlite::Result<Vec<FeatureClass>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM feature_class
         WHERE ?1 IS NULL OR product_id IS NULL OR product_id = ?1
         ORDER BY seq, id",
        CLASS_COLUMNS
    ))?;
    let rows = stmt.query_map(params![product_id], map_class)?;
    let mut classes: Vec<FeatureClass> = rows.collect::<rusqlite::Result<_>>()?;

    for cls in classes.iter_mut() {
        cls.characteristics = load_characteristics(conn, &cls.id)?;
    }
    Ok(classes)
}

pub(crate) fn insert_class(conn: &Connection, cls: &FeatureClass) -> rusqlite::Result<()> {
    let seq = next_seq(conn, "feature_class")?;
    conn.execute(
        "INSERT INTO feature_class (id, name, color, kind, required, product_id, seq)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            cls.id,
            cls.name,
            cls.color,
            cls.kind.as_str(),
            cls.required as i64,
            cls.product_id,
            seq
        ],
    )?;
    insert_characteristics(conn, &cls.id, &cls.characteristics)
}

pub(crate) fn load_regions(conn: &Connection) -> rusqlite::Result<Vec<Region>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM region ORDER BY seq, id", REGION_COLUMNS))?;
    let rows = stmt.query_map([], map_region)?;
    rows.collect()
}

pub(crate) fn insert_region(conn: &Connection, region: &Region) -> rusqlite::Result<()> {
    let seq = next_seq(conn, "region")?;
    conn.execute(
        "INSERT INTO region (id, name, code, steering_value, volume_share, excluded_characteristics, seq)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            region.id,
            region.name,
            region.code,
            region.steering_value,
            region.volume_share,
            json_column::encode(&region.excluded_characteristics)?,
            seq
        ],
    )?;
    Ok(())
}

/// 清空目录表 (特征值随类别级联删除)
pub(crate) fn clear_catalog(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "DELETE FROM feature_class;
         DELETE FROM region;
         DELETE FROM product;",
    )
}

// ==========================================
// ProductRepository - 产品仓储
// ==========================================
pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn list(&self) -> RepositoryResult<Vec<Product>> {
        let conn = lock(&self.conn)?;
        Ok(load_products(&conn)?)
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Product>> {
        let conn = lock(&self.conn)?;
        let product = conn
            .query_row(
                &format!("SELECT {} FROM product WHERE id = ?1", PRODUCT_COLUMNS),
                params![id],
                map_product,
            )
            .optional()?;
        Ok(product)
    }

    pub fn insert(&self, product: &Product) -> RepositoryResult<()> {
        let conn = lock(&self.conn)?;
        insert_product(&conn, product)?;
        Ok(())
    }

    pub fn update(&self, product: &Product) -> RepositoryResult<()> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE product SET name = ?2, description = ?3, base_volume = ?4 WHERE id = ?1",
            params![
                product.id,
                product.name,
                product.description,
                product.base_volume.map(|v| v as i64)
            ],
        )?;
        if affected == 0 {
            return Err(not_found("Product", &product.id));
        }
        Ok(())
    }

    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = lock(&self.conn)?;
        if conn.execute("DELETE FROM product WHERE id = ?1", params![id])? == 0 {
            return Err(not_found("Product", id));
        }
        Ok(())
    }
}

// ==========================================
// FeatureClassRepository - 特征类别仓储 (含特征值)
// ==========================================
pub struct FeatureClassRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FeatureClassRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 查询类别;传入产品时同时返回未标注产品的共享类别
    pub fn list(&self, product_id: Option<&str>) -> RepositoryResult<Vec<FeatureClass>> {
        let conn = lock(&self.conn)?;
        Ok(load_classes(&conn, product_id)?)
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<FeatureClass>> {
        let conn = lock(&self.conn)?;
        let cls = conn
            .query_row(
                &format!("SELECT {} FROM feature_class WHERE id = ?1", CLASS_COLUMNS),
                params![id],
                map_class,
            )
            .optional()?;
        match cls {
            Some(mut cls) => {
                cls.characteristics = load_characteristics(&conn, &cls.id)?;
                Ok(Some(cls))
            }
            None => Ok(None),
        }
    }

    pub fn insert(&self, cls: &FeatureClass) -> RepositoryResult<()> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        insert_class(&tx, cls)?;
        tx.commit()?;
        Ok(())
    }

    /// 更新类别属性并整体替换其特征值
    pub fn update(&self, cls: &FeatureClass) -> RepositoryResult<()> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        let affected = tx.execute(
            "UPDATE feature_class SET name = ?2, color = ?3, kind = ?4, required = ?5, product_id = ?6
             WHERE id = ?1",
            params![
                cls.id,
                cls.name,
                cls.color,
                cls.kind.as_str(),
                cls.required as i64,
                cls.product_id
            ],
        )?;
        if affected == 0 {
            return Err(not_found("FeatureClass", &cls.id));
        }
        tx.execute("DELETE FROM characteristic WHERE class_id = ?1", params![cls.id])?;
        insert_characteristics(&tx, &cls.id, &cls.characteristics)?;
        tx.commit()?;
        Ok(())
    }

    /// 删除类别,特征值级联删除
    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = lock(&self.conn)?;
        if conn.execute("DELETE FROM feature_class WHERE id = ?1", params![id])? == 0 {
            return Err(not_found("FeatureClass", id));
        }
        Ok(())
    }

    /// 新增或更新单个特征值
    pub fn upsert_characteristic(&self, class_id: &str, ch: &Characteristic) -> RepositoryResult<()> {
        let conn = lock(&self.conn)?;
        let seq: i64 = conn.query_row(
            "SELECT COALESCE(MAX(seq), -1) + 1 FROM characteristic WHERE class_id = ?1",
            params![class_id],
            |row| row.get(0),
        )?;
        conn.execute(
            "INSERT INTO characteristic (id, class_id, name, code, active, base_probability, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(class_id, id) DO UPDATE SET
                name = ?3, code = ?4, active = ?5, base_probability = ?6",
            params![
                ch.id,
                class_id,
                ch.name,
                ch.code,
                ch.active as i64,
                ch.base_probability,
                seq
            ],
        )?;
        Ok(())
    }

    pub fn delete_characteristic(&self, class_id: &str, characteristic_id: &str) -> RepositoryResult<()> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "DELETE FROM characteristic WHERE class_id = ?1 AND id = ?2",
            params![class_id, characteristic_id],
        )?;
        if affected == 0 {
            return Err(not_found("Characteristic", characteristic_id));
        }
        Ok(())
    }
}

// ==========================================
// RegionRepository - 销售区域仓储
// ==========================================
pub struct RegionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RegionRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn list(&self) -> RepositoryResult<Vec<Region>> {
        let conn = lock(&self.conn)?;
        Ok(load_regions(&conn)?)
    }

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<Region>> {
        let conn = lock(&self.conn)?;
        let region = conn
            .query_row(
                &format!("SELECT {} FROM region WHERE id = ?1", REGION_COLUMNS),
                params![id],
                map_region,
            )
            .optional()?;
        Ok(region)
    }

    pub fn insert(&self, region: &Region) -> RepositoryResult<()> {
        let conn = lock(&self.conn)?;
        insert_region(&conn, region)?;
        Ok(())
    }

    pub fn update(&self, region: &Region) -> RepositoryResult<()> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "UPDATE region SET name = ?2, code = ?3, steering_value = ?4, volume_share = ?5,
                excluded_characteristics = ?6
             WHERE id = ?1",
            params![
                region.id,
                region.name,
                region.code,
                region.steering_value,
                region.volume_share,
                json_column::encode(&region.excluded_characteristics)?
            ],
        )?;
        if affected == 0 {
            return Err(not_found("Region", &region.id));
        }
        Ok(())
    }

    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = lock(&self.conn)?;
        if conn.execute("DELETE FROM region WHERE id = ?1", params![id])? == 0 {
            return Err(not_found("Region", id));
        }
        Ok(())
    }
}
