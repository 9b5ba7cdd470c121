// ==========================================
// TreeTracker Ingest - Errores del motor de ingesta
// ==========================================
// Herramienta: macro derive de thiserror
// ==========================================

use thiserror::Error;

/// Errores del motor de ingesta.
///
/// Solo dos familias son fatales para una solicitud completa:
/// la lectura del libro (ambos intentos fallidos) y la resolución
/// de variante. Todo lo demás se degrada a errores blandos dentro
/// de `ProcessingResult`.
#[derive(Error, Debug)]
pub enum IngestError {
    // ===== Errores de archivo =====
    #[error("Archivo no encontrado: {0}")]
    FileNotFound(String),

    #[error("Formato de archivo no soportado: {0} (solo .xlsx/.xls/.ods/.csv)")]
    UnsupportedFormat(String),

    #[error("Error de lectura del archivo: {0}")]
    FileReadError(String),

    #[error("No se pudo leer el libro Excel: {0}")]
    WorkbookRead(String),

    #[error("No se pudo leer el archivo CSV: {0}")]
    CsvRead(String),

    // ===== Errores de datos =====
    #[error("Fecha numérica inválida: se esperaba YYYYMMDD, se recibió {0}")]
    InvalidDateNumber(i64),

    // ===== Errores de despacho =====
    #[error("No hay variante registrada para el usuario {tenant} y la operación {operation}")]
    UnknownVariant { tenant: String, operation: String },

    // ===== Error genérico =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        IngestError::CsvRead(err.to_string())
    }
}

impl From<calamine::Error> for IngestError {
    fn from(err: calamine::Error) -> Self {
        IngestError::WorkbookRead(err.to_string())
    }
}

impl From<calamine::XlsxError> for IngestError {
    fn from(err: calamine::XlsxError) -> Self {
        IngestError::WorkbookRead(err.to_string())
    }
}

/// Alias de Result para el motor de ingesta.
pub type IngestResult<T> = Result<T, IngestError>;
