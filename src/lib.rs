// ==========================================
// TreeTracker Ingest - Biblioteca principal
// ==========================================
// Motor de ingesta y normalización de reportes tabulares forestales.
// Convierte exportaciones Excel/CSV heterogéneas en registros
// canónicos y sentencias INSERT para recepciones y ventas.
// ==========================================

// ==========================================
// Declaración de módulos
// ==========================================

// Núcleo de ingesta - libro, columnas, normalización, resultado
pub mod ingest;

// Variantes de reporte - reglas por cliente y operación
pub mod variants;

// Sistema de logs
pub mod logging;

// ==========================================
// Reexportación de tipos centrales
// ==========================================

pub use ingest::{
    CellValue, IngestContext, IngestEngine, IngestError, IngestResult, InsertBuilder,
    LogicalField, ProcessingResult, Sheet, SqlValue, StatementDescriptor, Workbook,
};
pub use variants::registry::{operaciones, VariantRegistry, TENANT_FORESTAL};
pub use variants::{ReportVariant, RowContext, RowOutcome};

/// Versión de la biblioteca
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Nombre de la aplicación
pub const APP_NAME: &str = "TreeTracker Ingest";
