// ==========================================
// TreeTracker Ingest - Variante Ventas Generales MASISA
// ==========================================
// Reporte de ventas con esquema laxo: la fecha se busca en varios
// encabezados, la factura puede faltar (se autogenera) y el código
// de producto explícito pisa al derivado de la descripción.
// ==========================================

use crate::ingest::normalizer::{
    digit_number, float_value, format_timestamp, identifier_or_text, parse_datetime, text_value,
    yyyymmdd_datetime,
};
use crate::ingest::resolver::{FieldRule, HeaderPredicate, LogicalField, ResolvedRow};
use crate::ingest::statement::InsertBuilder;
use crate::variants::{
    nombre_producto, ReportVariant, RowContext, RowOutcome, CERTIFICACION_DEFAULT,
    CLIENTE_MASISA, CODIGO_ASERRIN, CODIGO_ASTILLA,
};

/// Marcador textual que identifica astilla en la descripción.
const MARCADOR_ASTILLA: &str = "ASTILLA VERDE (TS)";

/// Factor adicional de la astilla sobre el volumen ya dividido.
const FACTOR_ASTILLA: f64 = 2.54;

/// Divisor aplicado siempre al volumen registrado.
const DIVISOR_VOLUMEN: f64 = 1000.0;

static FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        field: LogicalField::FechaVenta,
        predicates: &[
            HeaderPredicate::ContainsAll(&["FECHA", "CONTABIL"]),
            HeaderPredicate::ContainsAll(&["FECHA", "VENTA"]),
            HeaderPredicate::ContainsAll(&["FECHA", "FACTURA"]),
            HeaderPredicate::ContainsAll(&["FECHA"]),
        ],
    },
    FieldRule {
        field: LogicalField::NumFactura,
        predicates: &[
            HeaderPredicate::ContainsAll(&["NUM", "FACTURA"]),
            HeaderPredicate::ContainsAll(&["NUM", "GUIA"]),
            HeaderPredicate::ContainsAll(&["NUMERO"]),
            HeaderPredicate::ContainsAny(&["FACTURA", "GUIA"]),
        ],
    },
    FieldRule {
        field: LogicalField::DescripcionMaterial,
        predicates: &[HeaderPredicate::ContainsAll(&["DESCRIPC", "MATERIAL"])],
    },
    FieldRule {
        field: LogicalField::ProductoCodigo,
        predicates: &[
            HeaderPredicate::ContainsAll(&["PRODUCTO", "CODIGO"]),
            HeaderPredicate::CompactAny(&["CODPRODUCTO"]),
        ],
    },
    FieldRule {
        field: LogicalField::VolumenM3,
        predicates: &[
            HeaderPredicate::ContainsAll(&["VOLUMEN", "M3"]),
            HeaderPredicate::ContainsAny(&["M3", "RECEPCION"]),
            HeaderPredicate::ContainsAny(&["VOLUMEN", "CANTIDAD"]),
        ],
    },
];

static REQUIRED: &[LogicalField] = &[LogicalField::FechaVenta, LogicalField::VolumenM3];

pub struct VentasMasisaVariant;

impl ReportVariant for VentasMasisaVariant {
    fn name(&self) -> &'static str {
        "ventas_masisa"
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
        let fecha_cell = row.get(LogicalField::FechaVenta);

        // Primero entero YYYYMMDD, después interpretación genérica.
        // Una celda presente pero no interpretable sí se registra como
        // error de fila (comportamiento observado de este reporte).
        let fecha_venta = match digit_number(fecha_cell)
            .and_then(|n| yyyymmdd_datetime(n).ok())
            .or_else(|| parse_datetime(fecha_cell))
        {
            Some(f) => f,
            None => {
                return match fecha_cell {
                    Some(cell) if !cell.is_empty() => RowOutcome::Fail(
                        "no se pudo interpretar la fecha de venta".to_string(),
                    ),
                    _ => {
                        tracing::debug!(fila = ctx.row_index, "Saltando fila: fecha venta vacía");
                        RowOutcome::Skip
                    }
                };
            }
        };

        // Factura opcional: autogenerada en secuencia si falta
        let num_factura = identifier_or_text(row.get(LogicalField::NumFactura))
            .unwrap_or_else(|| format!("AUTO-{:04}", ctx.row_index + 1));

        // Producto por descripción, con override del código explícito
        let descripcion = text_value(row.get(LogicalField::DescripcionMaterial));
        let es_astilla = descripcion
            .as_deref()
            .map(|d| d.to_uppercase().contains(MARCADOR_ASTILLA))
            .unwrap_or(false);

        let mut producto_codigo = if es_astilla {
            CODIGO_ASTILLA.to_string()
        } else {
            CODIGO_ASERRIN.to_string()
        };
        if let Some(explicito) = text_value(row.get(LogicalField::ProductoCodigo)) {
            tracing::debug!(
                fila = ctx.row_index,
                codigo = %explicito,
                "Override de código de producto"
            );
            producto_codigo = explicito;
        }

        let volumen_original = match float_value(row.get(LogicalField::VolumenM3)) {
            Some(v) => v,
            None => {
                tracing::debug!(fila = ctx.row_index, "Saltando fila: volumen vacío");
                return RowOutcome::Skip;
            }
        };
        if volumen_original <= 0.0 {
            tracing::debug!(
                fila = ctx.row_index,
                volumen = volumen_original,
                "Saltando fila: volumen cero o negativo"
            );
            return RowOutcome::Skip;
        }

        // Siempre ÷ 1000; la astilla además × 2.54
        let mut volumen = volumen_original / DIVISOR_VOLUMEN;
        if es_astilla {
            volumen *= FACTOR_ASTILLA;
        }

        tracing::debug!(
            fila = ctx.row_index,
            producto = %producto_codigo,
            nombre = nombre_producto(&producto_codigo),
            num_factura = %num_factura,
            volumen,
            "Venta general aceptada"
        );

        RowOutcome::Accepted(
            InsertBuilder::new(self.table())
                .text("fecha_venta", format_timestamp(&fecha_venta))
                .text("producto_codigo", producto_codigo)
                .text("cliente", CLIENTE_MASISA)
                .text("num_factura", num_factura)
                .number("volumen_m3", volumen)
                .text("certificacion", CERTIFICACION_DEFAULT)
                .null("precio_unitario")
                .text("user_id", ctx.owner_id)
                .build(),
        )
    }

    fn message_prefix(&self) -> &'static str {
        "¡Procesamiento de ventas generales completado!"
    }
}
