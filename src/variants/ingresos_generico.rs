// ==========================================
// TreeTracker Ingest - Variante Ingresos Genérica
// ==========================================
// Procesador de reportes de ingreso sin usuario específico: una hoja
// por mes (ENERO..DICIEMBRE), guía y certificación opcionales y fecha
// derivada del nombre de la hoja cuando el reporte no trae columna.
// ==========================================

use crate::ingest::normalizer::{
    float_value, format_timestamp, identifier_or_text, parse_datetime, text_value,
};
use crate::ingest::resolver::{FieldRule, HeaderPredicate, LogicalField, ResolvedRow};
use crate::ingest::statement::InsertBuilder;
use crate::variants::{
    ReportVariant, RowContext, RowOutcome, CERTIFICACION_DEFAULT, PRODUCTO_RECEPCION,
};
use chrono::{NaiveDate, NaiveDateTime};

/// Año del reporte anual por hojas mensuales.
const ANO_REPORTE: i32 = 2025;

/// Nombre de hoja (mes en español) → número de mes.
static MESES: &[(&str, u32)] = &[
    ("ENERO", 1),
    ("FEBRERO", 2),
    ("MARZO", 3),
    ("ABRIL", 4),
    ("MAYO", 5),
    ("JUNIO", 6),
    ("JULIO", 7),
    ("AGOSTO", 8),
    ("SEPTIEMBRE", 9),
    ("OCTUBRE", 10),
    ("NOVIEMBRE", 11),
    ("DICIEMBRE", 12),
];

/// Primer día del mes que nombra la hoja; enero si no se reconoce.
fn fecha_por_hoja(sheet_name: &str) -> NaiveDateTime {
    let normalizado = sheet_name.trim().to_uppercase();
    let mes = MESES
        .iter()
        .find(|(nombre, _)| *nombre == normalizado)
        .map(|(_, numero)| *numero)
        .unwrap_or(1);
    NaiveDate::from_ymd_opt(ANO_REPORTE, mes, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("primer día de mes siempre es válido")
}

static FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        field: LogicalField::Proveedor,
        predicates: &[HeaderPredicate::CompactAny(&["NOMBREPROVEEDOR"])],
    },
    FieldRule {
        field: LogicalField::NumGuia,
        predicates: &[HeaderPredicate::ContainsAny(&[
            "ROL",
            "FOLIO",
            "NUMERO GUIA",
            "GUIA",
        ])],
    },
    FieldRule {
        field: LogicalField::Certificacion,
        predicates: &[HeaderPredicate::ContainsAny(&[
            "FSC",
            "CERTIFICACION",
            "DESCRIPCION",
        ])],
    },
    FieldRule {
        field: LogicalField::VolumenM3,
        predicates: &[HeaderPredicate::ContainsAny(&["M3", "VOLUMEN"])],
    },
    FieldRule {
        field: LogicalField::FechaRecepcion,
        predicates: &[HeaderPredicate::ContainsAny(&["FECHA", "DATE"])],
    },
];

static REQUIRED: &[LogicalField] = &[LogicalField::Proveedor, LogicalField::VolumenM3];

pub struct IngresosGenericoVariant;

impl ReportVariant for IngresosGenericoVariant {
    fn name(&self) -> &'static str {
        "ingresos_generico"
    }

    fn table(&self) -> &'static str {
        "recepciones"
    }

    fn field_rules(&self) -> &'static [FieldRule] {
        FIELD_RULES
    }

    fn required_fields(&self) -> &'static [LogicalField] {
        REQUIRED
    }

    fn process_row(&self, row: &ResolvedRow<'_>, ctx: &RowContext<'_>) -> RowOutcome {
        let proveedor = match text_value(row.get(LogicalField::Proveedor)) {
            Some(p) => p,
            None => {
                tracing::debug!(fila = ctx.row_index, "Saltando fila: proveedor vacío");
                return RowOutcome::Skip;
            }
        };

        // Guía opcional: se autogenera con hoja y fila si falta
        let num_guia = identifier_or_text(row.get(LogicalField::NumGuia))
            .unwrap_or_else(|| format!("AUTO-{}-{}", ctx.sheet_name, ctx.row_index));

        let certificacion = text_value(row.get(LogicalField::Certificacion))
            .unwrap_or_else(|| CERTIFICACION_DEFAULT.to_string());

        // Este reporte registra el volumen directamente en m3
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
                "Saltando fila: volumen no positivo"
            );
            return RowOutcome::Skip;
        }

        // Fecha de la columna si existe; si no, el mes de la hoja
        let fecha = parse_datetime(row.get(LogicalField::FechaRecepcion))
            .unwrap_or_else(|| fecha_por_hoja(ctx.sheet_name));

        tracing::debug!(
            fila = ctx.row_index,
            proveedor = %proveedor,
            num_guia = %num_guia,
            volumen,
            "Ingreso aceptado"
        );

        RowOutcome::Accepted(
            InsertBuilder::new(self.table())
                .text("fecha_recepcion", format_timestamp(&fecha))
                .text("producto_codigo", PRODUCTO_RECEPCION)
                .text("proveedor", proveedor)
                .text("num_guia", num_guia)
                .number("volumen_m3", volumen)
                .text("certificacion", certificacion)
                .text("user_id", ctx.owner_id)
                .build(),
        )
    }

    fn message_prefix(&self) -> &'static str {
        "¡Procesamiento completado!"
    }
}
