// ==========================================
// TreeTracker Ingest - Variante Venta Astilla MASISA
// ==========================================
// Reporte SAP de ventas de astilla/aserrín a MASISA. El producto se
// identifica por subcadena de la descripción de material; solo la
// astilla lleva factor de conversión.
// ==========================================

use crate::ingest::normalizer::{
    digit_number, float_value, format_timestamp, identifier_or_text, text_value,
    yyyymmdd_datetime,
};
use crate::ingest::resolver::{FieldRule, HeaderPredicate, LogicalField, ResolvedRow};
use crate::ingest::statement::InsertBuilder;
use crate::variants::{
    ReportVariant, RowContext, RowOutcome, CERTIFICACION_DEFAULT, CLIENTE_MASISA, CODIGO_ASTILLA,
};

/// Producto identificable por marcador textual en la descripción.
/// El orden importa: se prueba de arriba hacia abajo.
struct ProductoAstilla {
    marcador: &'static str,
    codigo: &'static str,
    nombre: &'static str,
    /// Factor aplicado al volumen recibido. La astilla usa
    /// (recepción / 1000) × 2.54; el aserrín va sin conversión.
    factor: f64,
}

static PRODUCTOS: &[ProductoAstilla] = &[
    ProductoAstilla {
        marcador: "MATERIAL VERDE VALOR. COMB. COGENERACION",
        codigo: "W3.2",
        nombre: "Aserrín pinus radiata",
        factor: 1.0,
    },
    ProductoAstilla {
        marcador: "ASTILLA VERDE (TS)",
        codigo: "W3.1",
        nombre: "Astillas pinus radiata",
        factor: 2.54 / 1000.0,
    },
];

static FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        field: LogicalField::FechaContabiliz,
        predicates: &[HeaderPredicate::ContainsAll(&["FECHA", "CONTABIL"])],
    },
    FieldRule {
        field: LogicalField::GuiaFlete,
        predicates: &[HeaderPredicate::ContainsAll(&["GUIA", "FLETE"])],
    },
    FieldRule {
        field: LogicalField::DescripcionMaterial,
        predicates: &[HeaderPredicate::ContainsAll(&["DESCRIPC", "MATERIAL"])],
    },
    FieldRule {
        field: LogicalField::VolumenM3,
        predicates: &[HeaderPredicate::ContainsAll(&["RECEPC"])],
    },
];

static REQUIRED: &[LogicalField] = &[
    LogicalField::FechaContabiliz,
    LogicalField::GuiaFlete,
    LogicalField::DescripcionMaterial,
    LogicalField::VolumenM3,
];

pub struct AstillaMasisaVariant;

impl ReportVariant for AstillaMasisaVariant {
    fn name(&self) -> &'static str {
        "venta_astilla_masisa"
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
        // Fecha de contabilización como entero YYYYMMDD; si no
        // decodifica, la fila se salta sin registrarse.
        let fecha_venta = match digit_number(row.get(LogicalField::FechaContabiliz))
            .and_then(|n| yyyymmdd_datetime(n).ok())
        {
            Some(f) => f,
            None => {
                tracing::debug!(
                    fila = ctx.row_index,
                    "Saltando fila: fecha contabilización vacía o inválida"
                );
                return RowOutcome::Skip;
            }
        };

        // Guía flete: entero si coerciona, texto recortado si no
        let guia_flete = match identifier_or_text(row.get(LogicalField::GuiaFlete)) {
            Some(g) => g,
            None => {
                tracing::debug!(fila = ctx.row_index, "Saltando fila: guía flete vacía");
                return RowOutcome::Skip;
            }
        };

        let descripcion = match text_value(row.get(LogicalField::DescripcionMaterial)) {
            Some(d) => d,
            None => {
                tracing::debug!(
                    fila = ctx.row_index,
                    "Saltando fila: descripción material vacía"
                );
                return RowOutcome::Skip;
            }
        };

        let descripcion_upper = descripcion.to_uppercase();
        let producto = match PRODUCTOS
            .iter()
            .find(|p| descripcion_upper.contains(p.marcador))
        {
            Some(p) => p,
            None => {
                tracing::debug!(
                    fila = ctx.row_index,
                    descripcion = %descripcion,
                    "Saltando fila: descripción material no reconocida"
                );
                return RowOutcome::Skip;
            }
        };

        let volumen_original = match float_value(row.get(LogicalField::VolumenM3)) {
            Some(v) => v,
            None => {
                tracing::debug!(fila = ctx.row_index, "Saltando fila: volumen recepción vacío");
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

        let volumen_final = if producto.codigo == CODIGO_ASTILLA {
            volumen_original * producto.factor
        } else {
            volumen_original
        };

        tracing::debug!(
            fila = ctx.row_index,
            producto = producto.codigo,
            nombre = producto.nombre,
            volumen_original,
            volumen_final,
            "Venta astilla aceptada"
        );

        RowOutcome::Accepted(
            InsertBuilder::new(self.table())
                .text("fecha_venta", format_timestamp(&fecha_venta))
                .text("producto_codigo", producto.codigo)
                .text("cliente", CLIENTE_MASISA)
                .text("num_factura", guia_flete)
                .number("volumen_m3", volumen_final)
                .text("certificacion", CERTIFICACION_DEFAULT)
                .text("user_id", ctx.owner_id)
                .build(),
        )
    }

    fn message_prefix(&self) -> &'static str {
        "¡Procesamiento de ventas MASISA completado!"
    }
}
