// ==========================================
// TreeTracker Ingest - Normalizador de filas
// ==========================================
// Responsabilidad: coerción de tipos y saneamiento de celdas
// Política: la fila malformada se salta, nunca aborta el lote
// ==========================================

use crate::ingest::error::{IngestError, IngestResult};
use crate::ingest::workbook::CellValue;
use chrono::{NaiveDate, NaiveDateTime};

/// Valores que las librerías de planilla entregan como texto real
/// cuando la celda en origen estaba vacía. Se tratan como ausentes.
pub const NULL_SENTINELS: &[&str] = &["nan", "None", ""];

fn is_null_sentinel(value: &str) -> bool {
    NULL_SENTINELS.contains(&value)
}

/// Renderiza un número al estilo del reporte de origen:
/// los enteros conservan un decimal ("15.0"), el resto usa la
/// representación más corta ("2.54").
pub fn render_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Texto recortado de una celda, con los centinelas nulos filtrados.
pub fn text_value(cell: Option<&CellValue>) -> Option<String> {
    match cell? {
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if is_null_sentinel(trimmed) {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        CellValue::Number(n) => Some(render_number(*n)),
        CellValue::DateTime(dt) => Some(format_timestamp(dt)),
        CellValue::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        CellValue::Empty => None,
    }
}

/// Valor flotante de una celda numérica o textual.
pub fn float_value(cell: Option<&CellValue>) -> Option<f64> {
    match cell? {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if is_null_sentinel(trimmed) {
                None
            } else {
                trimmed.parse::<f64>().ok()
            }
        }
        _ => None,
    }
}

/// Identificador numérico truncado a entero y convertido a texto.
///
/// Las guías/facturas llegan como flotantes por el auto-tipado de la
/// planilla (12345.0); el truncado elimina el ruido decimal. Devuelve
/// `None` si la celda no es coercible a número.
pub fn integer_identifier(cell: Option<&CellValue>) -> Option<String> {
    let value = float_value(cell)?;
    if !value.is_finite() {
        return None;
    }
    Some(format!("{}", value.trunc() as i64))
}

/// Identificador con respaldo textual: si la coerción numérica falla,
/// se conserva la cadena recortada (política, no error).
pub fn identifier_or_text(cell: Option<&CellValue>) -> Option<String> {
    integer_identifier(cell).or_else(|| text_value(cell))
}

/// Entero crudo de la celda (truncando decimales), para fechas YYYYMMDD.
pub fn digit_number(cell: Option<&CellValue>) -> Option<i64> {
    let value = float_value(cell)?;
    if !value.is_finite() {
        return None;
    }
    Some(value.trunc() as i64)
}

/// Decodifica un entero de 8 dígitos en forma año-mes-día
/// (20250728 → 2025-07-28 00:00:00).
pub fn yyyymmdd_datetime(date_number: i64) -> IngestResult<NaiveDateTime> {
    if !(10_000_000..=99_999_999).contains(&date_number) {
        return Err(IngestError::InvalidDateNumber(date_number));
    }
    let year = (date_number / 10_000) as i32;
    let month = ((date_number / 100) % 100) as u32;
    let day = (date_number % 100) as u32;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or(IngestError::InvalidDateNumber(date_number))
}

const TEXT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

const TEXT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y%m%d"];

/// Interpretación genérica de fecha: celda tipada como fecha, número
/// de 8 dígitos YYYYMMDD, o texto en los formatos habituales de los
/// reportes chilenos.
pub fn parse_datetime(cell: Option<&CellValue>) -> Option<NaiveDateTime> {
    match cell? {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Number(n) => {
            if !n.is_finite() {
                return None;
            }
            yyyymmdd_datetime(n.trunc() as i64).ok()
        }
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if is_null_sentinel(trimmed) {
                return None;
            }
            for fmt in TEXT_DATETIME_FORMATS {
                if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                    return Some(dt);
                }
            }
            for fmt in TEXT_DATE_FORMATS {
                if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
                    return d.and_hms_opt(0, 0, 0);
                }
            }
            None
        }
        _ => None,
    }
}

/// Marca de tiempo en el formato del artefacto persistido
/// (ISO sin zona, truncado a segundos para que el resultado sea
/// reproducible entre corridas).
pub fn format_timestamp(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}
