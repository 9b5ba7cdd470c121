// ==========================================
// TreeTracker Ingest - Núcleo de ingesta
// ==========================================
// Carga de libros, resolución de columnas, normalización de celdas,
// emisión de sentencias y agregación de resultados.
// ==========================================

pub mod engine;
pub mod error;
pub mod normalizer;
pub mod resolver;
pub mod result;
pub mod statement;
pub mod workbook;

pub use engine::{IngestContext, IngestEngine};
pub use error::{IngestError, IngestResult};
pub use resolver::{FieldRule, HeaderPredicate, LogicalField, LogicalFieldMap, ResolvedRow};
pub use result::ProcessingResult;
pub use statement::{InsertBuilder, SqlValue, StatementDescriptor};
pub use workbook::{CellValue, Sheet, Workbook};
