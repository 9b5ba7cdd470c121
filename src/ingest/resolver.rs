// ==========================================
// TreeTracker Ingest - Resolutor de columnas
// ==========================================
// Responsabilidad: mapear campos lógicos a encabezados reales
// Regla: tabla declarativa ordenada, gana el primer predicado que calza
// ==========================================

use crate::ingest::workbook::{CellValue, Sheet};
use std::collections::HashMap;

/// Campo lógico independiente del texto literal del encabezado.
///
/// Los nombres siguen el vocabulario de las tablas destino; `key()`
/// es la forma que aparece en los mensajes de error por hoja.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    NumGuia,
    Proveedor,
    FechaRecepcion,
    VolumenM3,
    Rol,
    Origen,
    Comuna,
    FechaContabiliz,
    GuiaFlete,
    DescripcionMaterial,
    FechaVenta,
    NumFactura,
    ProductoCodigo,
    CodAdicional,
    Certificacion,
}

impl LogicalField {
    pub fn key(&self) -> &'static str {
        match self {
            LogicalField::NumGuia => "num_guia",
            LogicalField::Proveedor => "proveedor",
            LogicalField::FechaRecepcion => "fecha_recepcion",
            LogicalField::VolumenM3 => "volumen_m3",
            LogicalField::Rol => "rol",
            LogicalField::Origen => "origen",
            LogicalField::Comuna => "comuna",
            LogicalField::FechaContabiliz => "fecha_contabiliz",
            LogicalField::GuiaFlete => "guia_flete",
            LogicalField::DescripcionMaterial => "descripcion_material",
            LogicalField::FechaVenta => "fecha_venta",
            LogicalField::NumFactura => "num_factura",
            LogicalField::ProductoCodigo => "producto_codigo",
            LogicalField::CodAdicional => "cod_adicional",
            LogicalField::Certificacion => "certificacion",
        }
    }
}

/// Predicado sobre un encabezado normalizado.
///
/// La forma "compacta" además elimina `_`, espacios y `/`, porque
/// los reportes de origen traen el mismo encabezado escrito con y
/// sin separadores (NUM_GUIA_SERIE_C, "Num Guia Serie C", ...).
#[derive(Debug, Clone, Copy)]
pub enum HeaderPredicate {
    /// Todas las palabras clave presentes.
    ContainsAll(&'static [&'static str]),
    /// Alguna de las palabras presentes.
    ContainsAny(&'static [&'static str]),
    /// Palabras requeridas presentes y ninguna de las excluidas.
    /// Evita emparejar, por ejemplo, RUT_PROVEEDOR con el campo proveedor.
    ContainsAllExcept {
        all: &'static [&'static str],
        none: &'static [&'static str],
    },
    /// Alguna de las palabras presente en la forma compacta.
    CompactAny(&'static [&'static str]),
}

/// Regla de resolución: un campo lógico con sus predicados en orden
/// de prioridad. Las variantes definen sus reglas como datos estáticos.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: LogicalField,
    pub predicates: &'static [HeaderPredicate],
}

/// Encabezado normalizado: mayúsculas, recortado, vocales sin acento.
#[derive(Debug, Clone)]
struct NormalizedHeader {
    full: String,
    compact: String,
}

/// Colapsa las variantes acentuadas conocidas a su forma base.
/// Los mismos encabezados llegan con acentos inconsistentes según
/// la herramienta que exportó el reporte.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_uppercase()
        .chars()
        .map(|c| match c {
            'Á' => 'A',
            'É' => 'E',
            'Í' => 'I',
            'Ó' => 'O',
            'Ú' => 'U',
            other => other,
        })
        .collect()
}

fn compact_header(normalized: &str) -> String {
    normalized
        .chars()
        .filter(|c| !matches!(c, '_' | ' ' | '/'))
        .collect()
}

impl HeaderPredicate {
    fn matches(&self, header: &NormalizedHeader) -> bool {
        match self {
            HeaderPredicate::ContainsAll(words) => {
                words.iter().all(|w| header.full.contains(w))
            }
            HeaderPredicate::ContainsAny(words) => {
                words.iter().any(|w| header.full.contains(w))
            }
            HeaderPredicate::ContainsAllExcept { all, none } => {
                all.iter().all(|w| header.full.contains(w))
                    && none.iter().all(|w| !header.full.contains(w))
            }
            HeaderPredicate::CompactAny(words) => {
                words.iter().any(|w| header.compact.contains(w))
            }
        }
    }
}

/// Mapa de campos lógicos resueltos para una hoja concreta.
/// Se construye una vez por hoja, antes de iterar filas.
#[derive(Debug, Default)]
pub struct LogicalFieldMap {
    columns: HashMap<LogicalField, usize>,
    headers: HashMap<LogicalField, String>,
}

impl LogicalFieldMap {
    pub fn contains(&self, field: LogicalField) -> bool {
        self.columns.contains_key(&field)
    }

    pub fn column(&self, field: LogicalField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Encabezado original resuelto (para logs y diagnóstico).
    pub fn header(&self, field: LogicalField) -> Option<&str> {
        self.headers.get(&field).map(|s| s.as_str())
    }

    /// Campos requeridos que quedaron sin resolver, en el orden dado.
    pub fn missing(&self, required: &[LogicalField]) -> Vec<LogicalField> {
        required
            .iter()
            .copied()
            .filter(|f| !self.contains(*f))
            .collect()
    }
}

/// Resuelve la tabla de reglas contra los encabezados de una hoja.
///
/// Para cada campo se prueban los predicados en orden de prioridad;
/// el primer encabezado que satisface un predicado gana. La resolución
/// es independiente por campo: un encabezado puede servir a más de un
/// campo lógico salvo que los predicados lo excluyan por construcción.
pub fn resolve_columns(sheet: &Sheet, rules: &[FieldRule]) -> LogicalFieldMap {
    let normalized: Vec<NormalizedHeader> = sheet
        .headers
        .iter()
        .map(|h| {
            let full = normalize_header(h);
            let compact = compact_header(&full);
            NormalizedHeader { full, compact }
        })
        .collect();

    let mut map = LogicalFieldMap::default();

    for rule in rules {
        'predicates: for predicate in rule.predicates {
            for (idx, header) in normalized.iter().enumerate() {
                if predicate.matches(header) {
                    tracing::debug!(
                        campo = rule.field.key(),
                        columna = %sheet.headers[idx],
                        "Columna resuelta"
                    );
                    map.columns.insert(rule.field, idx);
                    map.headers.insert(rule.field, sheet.headers[idx].clone());
                    break 'predicates;
                }
            }
        }
    }

    map
}

/// Vista de una fila con el mapa de columnas ya resuelto.
pub struct ResolvedRow<'a> {
    map: &'a LogicalFieldMap,
    cells: &'a [CellValue],
}

impl<'a> ResolvedRow<'a> {
    pub fn new(map: &'a LogicalFieldMap, cells: &'a [CellValue]) -> Self {
        ResolvedRow { map, cells }
    }

    /// Celda del campo lógico, o `None` si la columna no se resolvió
    /// o la fila es más corta que el índice resuelto.
    pub fn get(&self, field: LogicalField) -> Option<&'a CellValue> {
        self.map.column(field).and_then(|idx| self.cells.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_with_headers(headers: &[&str]) -> Sheet {
        Sheet::new(
            "PRUEBA",
            headers.iter().map(|h| h.to_string()).collect(),
            vec![],
        )
    }

    const RULES_PROVEEDOR: &[FieldRule] = &[FieldRule {
        field: LogicalField::Proveedor,
        predicates: &[
            HeaderPredicate::CompactAny(&["NOMBREPROVEEDOR"]),
            HeaderPredicate::ContainsAllExcept {
                all: &["PROVEEDOR"],
                none: &["RUT", "NOMBRE"],
            },
        ],
    }];

    #[test]
    fn test_normalize_header_accents() {
        assert_eq!(normalize_header("  Guía Flete "), "GUIA FLETE");
        assert_eq!(normalize_header("Fecha contabiliz."), "FECHA CONTABILIZ.");
        assert_eq!(normalize_header("Descripción Material"), "DESCRIPCION MATERIAL");
    }

    #[test]
    fn test_specific_predicate_wins_over_fallback() {
        // RUT_PROVEEDOR aparece antes en la hoja, pero el predicado
        // específico debe elegir NOMBRE_PROVEEDOR.
        let sheet = sheet_with_headers(&["RUT_PROVEEDOR", "NOMBRE_PROVEEDOR"]);
        let map = resolve_columns(&sheet, RULES_PROVEEDOR);
        assert_eq!(map.column(LogicalField::Proveedor), Some(1));
    }

    #[test]
    fn test_fallback_predicate_excludes_rut() {
        let sheet = sheet_with_headers(&["RUT_PROVEEDOR", "PROVEEDOR MADERA"]);
        let map = resolve_columns(&sheet, RULES_PROVEEDOR);
        assert_eq!(map.column(LogicalField::Proveedor), Some(1));
    }

    #[test]
    fn test_compact_predicate_matches_spaced_header() {
        let sheet = sheet_with_headers(&["Nombre Proveedor"]);
        let map = resolve_columns(&sheet, RULES_PROVEEDOR);
        assert_eq!(map.column(LogicalField::Proveedor), Some(0));
        assert_eq!(map.header(LogicalField::Proveedor), Some("Nombre Proveedor"));
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let sheet = sheet_with_headers(&["CUALQUIER COSA"]);
        let map = resolve_columns(&sheet, RULES_PROVEEDOR);
        let missing = map.missing(&[LogicalField::Proveedor, LogicalField::VolumenM3]);
        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].key(), "proveedor");
        assert_eq!(missing[1].key(), "volumen_m3");
    }
}
