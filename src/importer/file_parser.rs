// ==========================================
// 整车配置规划 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls, 读取全部工作表) / CSV (.csv, 单表或目录)
// 输出: 表名 → 行记录 (列名 → 值)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::{ReaderBuilder, WriterBuilder};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

/// 单行原始记录 (列名 → 已 trim 的文本)
pub type RawRow = HashMap<String, String>;

/// 表名 → 行记录
pub type SheetRows = BTreeMap<String, Vec<RawRow>>;

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    /// 解析文件为按表分组的原始行记录
    fn parse_sheets(&self, file_path: &Path) -> ImportResult<SheetRows>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// 表名取文件名 (不含扩展名)
fn sheet_name_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string()
}

/// 按表头组装行;完全空白的行跳过
fn collect_row<I, S>(headers: &[String], cells: I) -> Option<RawRow>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut row_map = RawRow::new();
    for (col_idx, value) in cells.into_iter().enumerate() {
        if let Some(header) = headers.get(col_idx) {
            if header.is_empty() {
                continue;
            }
            row_map.insert(header.clone(), value.as_ref().trim().to_string());
        }
    }

    if row_map.values().all(|v| v.is_empty()) {
        None
    } else {
        Some(row_map)
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 读取单个 CSV 文件的行记录
    pub fn parse_rows(&self, path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(path)?;

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            if let Some(row) = collect_row(&headers, record.iter()) {
                records.push(row);
            }
        }

        Ok(records)
    }

    /// 写出单个 CSV 文件
    pub fn write_rows(&self, path: &Path, headers: &[&str], rows: &[Vec<String>]) -> ImportResult<()> {
        let file = File::create(path).map_err(|e| ImportError::FileWriteError(e.to_string()))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer
            .flush()
            .map_err(|e| ImportError::FileWriteError(e.to_string()))?;
        Ok(())
    }
}

impl FileParser for CsvParser {
    /// 单个文件: 表名取文件名;目录: 每个 .csv 文件为一张表
    fn parse_sheets(&self, file_path: &Path) -> ImportResult<SheetRows> {
        ensure_exists(file_path)?;

        let mut sheets = SheetRows::new();
        if file_path.is_dir() {
            for entry in std::fs::read_dir(file_path)? {
                let path = entry?.path();
                if path.is_file() && extension_of(&path) == "csv" {
                    sheets.insert(sheet_name_of(&path), self.parse_rows(&path)?);
                }
            }
        } else {
            let ext = extension_of(file_path);
            if ext != "csv" {
                return Err(ImportError::UnsupportedFormat(ext));
            }
            sheets.insert(sheet_name_of(file_path), self.parse_rows(file_path)?);
        }

        Ok(sheets)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    /// 读取全部工作表;首行为表头
    fn parse_sheets(&self, file_path: &Path) -> ImportResult<SheetRows> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;
        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError("Excel 文件无工作表".to_string()));
        }

        let mut sheets = SheetRows::new();
        for sheet_name in sheet_names {
            let range = workbook.worksheet_range(&sheet_name)?;

            let mut rows = range.rows();
            let headers: Vec<String> = match rows.next() {
                Some(header_row) => header_row
                    .iter()
                    .map(|cell| cell.to_string().trim().to_string())
                    .collect(),
                // 空表
                None => {
                    sheets.insert(sheet_name, Vec::new());
                    continue;
                }
            };

            let records: Vec<RawRow> = rows
                .filter_map(|data_row| collect_row(&headers, data_row.iter().map(|c| c.to_string())))
                .collect();
            sheets.insert(sheet_name, records);
        }

        Ok(sheets)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<SheetRows> {
        let path = file_path.as_ref();
        if path.is_dir() {
            return CsvParser.parse_sheets(path);
        }

        match extension_of(path).as_str() {
            "csv" => CsvParser.parse_sheets(path),
            "xlsx" | "xls" => ExcelParser.parse_sheets(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, TempDir};

    #[test]
    fn test_csv_parser_uses_file_stem_as_sheet() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Regions.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "id,name,steering,volumeShare").unwrap();
        writeln!(file, "EU,European Union,STR_LHD,0.30").unwrap();
        writeln!(file, " US , United States ,STR_LHD,0.25").unwrap();

        let sheets = CsvParser.parse_sheets(&path).unwrap();
        let rows = &sheets["Regions"];
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("id"), Some(&"US".to_string()));
        assert_eq!(rows[1].get("name"), Some(&"United States".to_string()));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "id,name").unwrap();
        writeln!(temp_file, "ENGINE,Engine").unwrap();
        writeln!(temp_file, ",").unwrap();
        writeln!(temp_file, "PACKAGE,Package").unwrap();

        let rows = CsvParser.parse_rows(temp_file.path()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_directory_reads_every_csv() {
        let dir = TempDir::new().unwrap();
        for name in ["Products", "Classes"] {
            let mut file = File::create(dir.path().join(format!("{}.csv", name))).unwrap();
            writeln!(file, "id,name").unwrap();
            writeln!(file, "X,Y").unwrap();
        }
        File::create(dir.path().join("notes.txt")).unwrap();

        let sheets = UniversalFileParser.parse(dir.path()).unwrap();
        assert_eq!(sheets.keys().collect::<Vec<_>>(), vec!["Classes", "Products"]);
    }

    #[test]
    fn test_missing_file_and_unknown_extension() {
        assert!(matches!(
            UniversalFileParser.parse("does_not_exist.csv"),
            Err(ImportError::FileNotFound(_))
        ));

        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(matches!(
            UniversalFileParser.parse(temp_file.path()),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }
}
