// ==========================================
// TreeTracker Ingest - Variante Proforma ARAUCO
// ==========================================
// Proforma de recepción ARAUCO: encabezados con guion bajo fijos,
// producto derivado de un código adicional cerrado, volumen sin
// conversión y precio unitario siempre NULL.
// ==========================================

use crate::ingest::normalizer::{
    float_value, format_timestamp, identifier_or_text, parse_datetime, text_value,
};
use crate::ingest::resolver::{FieldRule, HeaderPredicate, LogicalField, ResolvedRow};
use crate::ingest::statement::InsertBuilder;
use crate::variants::{
    ReportVariant, RowContext, RowOutcome, CERTIFICACION_DEFAULT, CLIENTE_ARAUCO, CODIGO_ASERRIN,
};

/// Código adicional del reporte → código de producto.
/// Un código no reconocido cae al aserrín por defecto.
static CODIGOS_PRODUCTO: &[(&str, &str)] = &[("ASCM", "W3.2"), ("ASTI", "W3.1")];

static FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        field: LogicalField::FechaVenta,
        predicates: &[HeaderPredicate::CompactAny(&["FCHRECEPCION"])],
    },
    FieldRule {
        field: LogicalField::NumFactura,
        predicates: &[HeaderPredicate::CompactAny(&["NUMGUIASERIEC"])],
    },
    FieldRule {
        field: LogicalField::VolumenM3,
        predicates: &[HeaderPredicate::CompactAny(&["VOLUMENM3RECEPCION"])],
    },
    FieldRule {
        field: LogicalField::CodAdicional,
        predicates: &[HeaderPredicate::CompactAny(&["CODADICIONAL"])],
    },
];

static REQUIRED: &[LogicalField] = &[
    LogicalField::FechaVenta,
    LogicalField::NumFactura,
    LogicalField::VolumenM3,
    LogicalField::CodAdicional,
];

pub struct VentasAraucoVariant;

impl ReportVariant for VentasAraucoVariant {
    fn name(&self) -> &'static str {
        "ventas_arauco"
    }

    fn table(&self) -> &'static str {
        "ventas"
    }

    fn field_rules(&self) -> &'static [FieldRule] {
        FIELD_RULES
    }

    fn required_fields(&self) -> &'static [LogicalField] {
        REQUIRED
    }

    fn records_row_errors(&self) -> bool {
        true
    }

    fn process_row(&self, row: &ResolvedRow<'_>, ctx: &RowContext<'_>) -> RowOutcome {
        // Fecha de recepción con interpretación genérica; en esta
        // variante una fecha no interpretable salta la fila, no usa
        // la hora de procesamiento.
        let fecha_venta = match parse_datetime(row.get(LogicalField::FechaVenta)) {
            Some(f) => f,
            None => {
                tracing::debug!(
                    fila = ctx.row_index,
                    "Saltando fila: fecha de recepción vacía o inválida"
                );
                return RowOutcome::Skip;
            }
        };

        let num_factura = match identifier_or_text(row.get(LogicalField::NumFactura)) {
            Some(n) => n,
            None => {
                tracing::debug!(fila = ctx.row_index, "Saltando fila: número de guía vacío");
                return RowOutcome::Skip;
            }
        };

        let volumen = match float_value(row.get(LogicalField::VolumenM3)) {
            Some(v) => v,
            None => {
                tracing::debug!(fila = ctx.row_index, "Saltando fila: volumen vacío");
                return RowOutcome::Skip;
            }
        };
        if volumen <= 0.0 {
            tracing::debug!(
                fila = ctx.row_index,
                volumen,
                "Saltando fila: volumen cero o negativo"
            );
            return RowOutcome::Skip;
        }

        // Código adicional por fila: ausente o no reconocido → aserrín
        let producto_codigo = match text_value(row.get(LogicalField::CodAdicional)) {
            Some(cod) => {
                let cod_upper = cod.to_uppercase();
                match CODIGOS_PRODUCTO.iter().find(|(c, _)| *c == cod_upper) {
                    Some((_, producto)) => *producto,
                    None => {
                        tracing::warn!(
                            fila = ctx.row_index,
                            codigo = %cod_upper,
                            "Código adicional no reconocido, usando aserrín por defecto"
                        );
                        CODIGO_ASERRIN
                    }
                }
            }
            None => CODIGO_ASERRIN,
        };

        tracing::debug!(
            fila = ctx.row_index,
            producto = producto_codigo,
            num_factura = %num_factura,
            volumen,
            "Venta ARAUCO aceptada"
        );

        RowOutcome::Accepted(
            InsertBuilder::new(self.table())
                .text("fecha_venta", format_timestamp(&fecha_venta))
                .text("producto_codigo", producto_codigo)
                .text("cliente", CLIENTE_ARAUCO)
                .text("num_factura", num_factura)
                .number("volumen_m3", volumen)
                .text("certificacion", CERTIFICACION_DEFAULT)
                .null("precio_unitario")
                .text("user_id", ctx.owner_id)
                .build(),
        )
    }

    fn message_prefix(&self) -> &'static str {
        "¡Procesamiento de proforma ARAUCO completado!"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::resolver::{resolve_columns, LogicalFieldMap};
    use crate::ingest::statement::SqlValue;
    use crate::ingest::workbook::{CellValue, Sheet};
    use chrono::NaiveDate;

    fn resolver_map() -> LogicalFieldMap {
        let sheet = Sheet::new(
            "PROFORMA",
            vec![
                "FCH_RECEPCION".to_string(),
                "NUM_GUIA_SERIE_C".to_string(),
                "VOLUMEN_M3_RECEPCION".to_string(),
                "COD_ADICIONAL".to_string(),
            ],
            vec![],
        );
        resolve_columns(&sheet, FIELD_RULES)
    }

    fn ctx() -> RowContext<'static> {
        RowContext {
            owner_id: "user-1",
            now: NaiveDate::from_ymd_opt(2025, 1, 15)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            sheet_name: "PROFORMA",
            row_index: 0,
        }
    }

    fn base_cells(cod: &str) -> Vec<CellValue> {
        vec![
            CellValue::Text("2025-04-02".to_string()),
            CellValue::Number(880011.0),
            CellValue::Number(34.7),
            CellValue::Text(cod.to_string()),
        ]
    }

    #[test]
    fn test_known_code_maps_to_chip() {
        let map = resolver_map();
        let cells = base_cells("ASTI");
        let row = ResolvedRow::new(&map, &cells);
        let stmt = match VentasAraucoVariant.process_row(&row, &ctx()) {
            RowOutcome::Accepted(s) => s,
            _ => panic!("fila debía aceptarse"),
        };
        assert_eq!(stmt.values()[1], SqlValue::Text("W3.1".to_string()));
        // Volumen sin conversión
        assert_eq!(stmt.values()[4], SqlValue::Number(34.7));
        assert_eq!(stmt.values()[2], SqlValue::Text("ARAUCO".to_string()));
    }

    #[test]
    fn test_unknown_code_defaults_to_sawdust() {
        let map = resolver_map();
        let cells = base_cells("XYZ");
        let row = ResolvedRow::new(&map, &cells);
        let stmt = match VentasAraucoVariant.process_row(&row, &ctx()) {
            RowOutcome::Accepted(s) => s,
            _ => panic!("fila debía aceptarse"),
        };
        assert_eq!(stmt.values()[1], SqlValue::Text("W3.2".to_string()));
    }

    #[test]
    fn test_lowercase_code_is_normalized() {
        let map = resolver_map();
        let cells = base_cells(" ascm ");
        let row = ResolvedRow::new(&map, &cells);
        let stmt = match VentasAraucoVariant.process_row(&row, &ctx()) {
            RowOutcome::Accepted(s) => s,
            _ => panic!("fila debía aceptarse"),
        };
        assert_eq!(stmt.values()[1], SqlValue::Text("W3.2".to_string()));
    }

    #[test]
    fn test_unparseable_date_skips_row() {
        let map = resolver_map();
        let mut cells = base_cells("ASTI");
        cells[0] = CellValue::Text("no es fecha".to_string());
        let row = ResolvedRow::new(&map, &cells);
        assert!(matches!(
            VentasAraucoVariant.process_row(&row, &ctx()),
            RowOutcome::Skip
        ));
    }

    #[test]
    fn test_guide_number_strips_decimals() {
        let map = resolver_map();
        let mut cells = base_cells("ASTI");
        cells[1] = CellValue::Text("880011.0".to_string());
        let row = ResolvedRow::new(&map, &cells);
        let stmt = match VentasAraucoVariant.process_row(&row, &ctx()) {
            RowOutcome::Accepted(s) => s,
            _ => panic!("fila debía aceptarse"),
        };
        assert_eq!(stmt.values()[3], SqlValue::Text("880011".to_string()));
    }
}
