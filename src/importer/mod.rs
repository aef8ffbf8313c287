// ==========================================
// 整车配置规划 - 导入层
// ==========================================
// 职责: 外部目录数据导入/导出
// 支持: Excel, CSV (单表/目录), JSON 数据包
// ==========================================

// 模块声明
pub mod catalog_importer;
pub mod catalog_mapper;
pub mod error;
pub mod file_parser;

// 重导出核心类型
pub use catalog_importer::{CatalogImporter, CatalogImporterImpl, ImportSummary};
pub use catalog_mapper::{CatalogMapper, SheetTable};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, UniversalFileParser};
