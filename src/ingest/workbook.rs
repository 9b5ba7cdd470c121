// ==========================================
// TreeTracker Ingest - Cargador de libros
// ==========================================
// Soporta: Excel (.xlsx/.xls/.ods) vía calamine, CSV vía csv
// Estrategia: lector explícito Xlsx primero, autodetección como respaldo
// ==========================================

use crate::ingest::error::{IngestError, IngestResult};
use calamine::{open_workbook, open_workbook_auto, Data, Reader, Xlsx};
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

/// Valor de una celda ya desacoplado del tipo del parser.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(CellValue::DateTime)
                .unwrap_or(CellValue::Empty),
            Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .map(CellValue::DateTime)
                .unwrap_or_else(|_| CellValue::Text(s.clone())),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            // Celdas con error de fórmula se tratan como vacías
            Data::Error(_) => CellValue::Empty,
        }
    }
}

/// Una hoja materializada: encabezados recortados + filas de celdas.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Sheet {
            name: name.into(),
            headers: headers.into_iter().map(|h| h.trim().to_string()).collect(),
            rows,
        }
    }
}

/// Libro completo: colección ordenada de hojas con nombre.
/// Se materializa una sola vez por solicitud y es de solo lectura.
#[derive(Debug, Clone)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Workbook { sheets }
    }

    pub fn total_sheets(&self) -> usize {
        self.sheets.len()
    }

    /// Carga un libro desde disco según la extensión del archivo.
    ///
    /// Para `.xlsx` intenta primero el lector explícito; si falla,
    /// reintenta una vez con el lector autodetectado. Si ambos
    /// intentos fallan la solicitud completa aborta con
    /// `IngestError::WorkbookRead`.
    pub fn load(path: &Path) -> IngestResult<Workbook> {
        if !path.exists() {
            return Err(IngestError::FileNotFound(path.display().to_string()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xlsx" => match open_workbook::<Xlsx<_>, _>(path) {
                Ok(mut reader) => read_all_sheets(&mut reader),
                Err(primary_err) => {
                    tracing::warn!(
                        error = %primary_err,
                        "Lector Xlsx falló, reintentando con autodetección"
                    );
                    let mut reader = open_workbook_auto(path).map_err(|fallback_err| {
                        IngestError::WorkbookRead(format!(
                            "{} (respaldo: {})",
                            primary_err, fallback_err
                        ))
                    })?;
                    read_all_sheets(&mut reader)
                }
            },
            "xls" | "ods" => {
                let mut reader = open_workbook_auto(path)?;
                read_all_sheets(&mut reader)
            }
            "csv" => load_csv(path),
            _ => Err(IngestError::UnsupportedFormat(ext)),
        }
    }
}

/// Materializa todas las hojas de un lector calamine.
/// La primera fila de cada hoja son los encabezados.
fn read_all_sheets<RS, R>(reader: &mut R) -> IngestResult<Workbook>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let names = reader.sheet_names().to_owned();
    let mut sheets = Vec::with_capacity(names.len());

    for name in names {
        let range = reader
            .worksheet_range(&name)
            .map_err(|e| IngestError::WorkbookRead(e.to_string()))?;

        let mut rows_iter = range.rows();
        let headers: Vec<String> = match rows_iter.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect(),
            // Hoja sin filas: se conserva vacía para el conteo total
            None => Vec::new(),
        };

        let mut rows = Vec::new();
        for data_row in rows_iter {
            let cells: Vec<CellValue> = data_row.iter().map(CellValue::from).collect();
            // Saltar filas completamente vacías
            if cells.iter().all(is_blank_cell) {
                continue;
            }
            rows.push(cells);
        }

        tracing::debug!(hoja = %name, filas = rows.len(), "Hoja materializada");
        sheets.push(Sheet::new(name, headers, rows));
    }

    Ok(Workbook::from_sheets(sheets))
}

fn is_blank_cell(cell: &CellValue) -> bool {
    match cell {
        CellValue::Empty => true,
        CellValue::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Carga un CSV como libro de una sola hoja (nombrada por el archivo).
fn load_csv(path: &Path) -> IngestResult<Workbook> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cells: Vec<CellValue> = record
            .iter()
            .map(|v| {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(trimmed.to_string())
                }
            })
            .collect();
        if cells.iter().all(is_blank_cell) {
            continue;
        }
        rows.push(cells);
    }

    let sheet_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("csv")
        .to_string();

    Ok(Workbook::from_sheets(vec![Sheet::new(
        sheet_name, headers, rows,
    )]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_missing_file() {
        let result = Workbook::load(Path::new("no_existe.xlsx"));
        assert!(matches!(result, Err(IngestError::FileNotFound(_))));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let temp = NamedTempFile::with_suffix(".pdf").unwrap();
        let result = Workbook::load(temp.path());
        assert!(matches!(result, Err(IngestError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_corrupt_xlsx_fails_both_attempts() {
        let mut temp = NamedTempFile::with_suffix(".xlsx").unwrap();
        temp.write_all(b"esto no es un zip").unwrap();
        let result = Workbook::load(temp.path());
        assert!(matches!(result, Err(IngestError::WorkbookRead(_))));
    }

    #[test]
    fn test_load_csv_single_sheet() {
        let mut temp = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(temp, "NOMBRE PROVEEDOR,VOLUMEN M3").unwrap();
        writeln!(temp, "Forestal Sur,120.5").unwrap();
        writeln!(temp, ",").unwrap();
        writeln!(temp, "Aserradero Norte,80").unwrap();

        let wb = Workbook::load(temp.path()).unwrap();
        assert_eq!(wb.total_sheets(), 1);
        let sheet = &wb.sheets[0];
        assert_eq!(sheet.headers, vec!["NOMBRE PROVEEDOR", "VOLUMEN M3"]);
        // La fila vacía se descarta
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(
            sheet.rows[0][0],
            CellValue::Text("Forestal Sur".to_string())
        );
    }

    #[test]
    fn test_cell_value_from_calamine() {
        assert_eq!(CellValue::from(&Data::Empty), CellValue::Empty);
        assert_eq!(CellValue::from(&Data::Int(12345)), CellValue::Number(12345.0));
        assert_eq!(
            CellValue::from(&Data::String("  Acme ".to_string())),
            CellValue::Text("  Acme ".to_string())
        );
    }
}
