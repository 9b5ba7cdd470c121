// ==========================================
// TreeTracker Ingest - Variante Recepciones
// ==========================================
// Reporte de ingreso de planta: guías de recepción de trozos.
// Producto fijo W1.1, volumen registrado en litros → m3 (÷ 1000).
// ==========================================

use crate::ingest::normalizer::{
    float_value, format_timestamp, integer_identifier, parse_datetime, text_value,
};
use crate::ingest::resolver::{FieldRule, HeaderPredicate, LogicalField, ResolvedRow};
use crate::ingest::statement::InsertBuilder;
use crate::variants::{
    ReportVariant, RowContext, RowOutcome, CERTIFICACION_DEFAULT, PRODUCTO_RECEPCION,
};

/// Divisor aplicado al volumen registrado para llevarlo a m3.
const DIVISOR_VOLUMEN: f64 = 1000.0;

static FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        field: LogicalField::NumGuia,
        predicates: &[HeaderPredicate::ContainsAny(&[
            "NUM_GUIA",
            "NUMERO_GUIA",
            "GUIA",
        ])],
    },
    FieldRule {
        field: LogicalField::Proveedor,
        predicates: &[
            // El nombre específico gana antes de caer al predicado laxo,
            // para no emparejar la columna de RUT con el proveedor.
            HeaderPredicate::CompactAny(&["NOMBREPROVEEDOR"]),
            HeaderPredicate::ContainsAllExcept {
                all: &["PROVEEDOR"],
                none: &["RUT", "NOMBRE"],
            },
        ],
    },
    FieldRule {
        field: LogicalField::FechaRecepcion,
        predicates: &[
            HeaderPredicate::ContainsAll(&["FECHA", "RECEP"]),
            HeaderPredicate::ContainsAll(&["FECHA"]),
        ],
    },
    FieldRule {
        field: LogicalField::VolumenM3,
        predicates: &[
            HeaderPredicate::ContainsAll(&["VOLUMEN", "M3"]),
            HeaderPredicate::ContainsAny(&["M3", "VOLUMEN"]),
        ],
    },
    FieldRule {
        field: LogicalField::Rol,
        predicates: &[HeaderPredicate::ContainsAll(&["ROL"])],
    },
    FieldRule {
        field: LogicalField::Origen,
        predicates: &[HeaderPredicate::CompactAny(&["ORIGEN", "PREDIO"])],
    },
    FieldRule {
        field: LogicalField::Comuna,
        predicates: &[HeaderPredicate::ContainsAll(&["COMUNA"])],
    },
];

static REQUIRED: &[LogicalField] = &[
    LogicalField::NumGuia,
    LogicalField::Proveedor,
    LogicalField::FechaRecepcion,
    LogicalField::VolumenM3,
];

pub struct RecepcionesVariant;

impl ReportVariant for RecepcionesVariant {
    fn name(&self) -> &'static str {
        "recepciones"
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
        // La guía debe coercionar a entero; el ruido decimal se trunca
        let num_guia = match integer_identifier(row.get(LogicalField::NumGuia)) {
            Some(g) => g,
            None => {
                tracing::debug!(fila = ctx.row_index, "Saltando fila: número de guía inválido");
                return RowOutcome::Skip;
            }
        };

        let proveedor = match text_value(row.get(LogicalField::Proveedor)) {
            Some(p) => p,
            None => {
                tracing::debug!(fila = ctx.row_index, "Saltando fila: proveedor vacío");
                return RowOutcome::Skip;
            }
        };

        let volumen = match float_value(row.get(LogicalField::VolumenM3)) {
            Some(v) => v / DIVISOR_VOLUMEN,
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

        // Fecha ausente o no interpretable → hora de procesamiento
        let fecha = parse_datetime(row.get(LogicalField::FechaRecepcion)).unwrap_or(ctx.now);

        // El rol viene a veces con comillas simples pegadas al número
        let rol = text_value(row.get(LogicalField::Rol)).map(|r| r.replace('\'', ""));
        let origen = text_value(row.get(LogicalField::Origen));
        let comuna = text_value(row.get(LogicalField::Comuna));

        tracing::debug!(
            fila = ctx.row_index,
            num_guia = %num_guia,
            proveedor = %proveedor,
            volumen,
            "Recepción aceptada"
        );

        RowOutcome::Accepted(
            InsertBuilder::new(self.table())
                .text("fecha_recepcion", format_timestamp(&fecha))
                .text("producto_codigo", PRODUCTO_RECEPCION)
                .text("proveedor", proveedor)
                .text("num_guia", num_guia)
                .number("volumen_m3", volumen)
                .text("certificacion", CERTIFICACION_DEFAULT)
                .text("user_id", ctx.owner_id)
                .optional_text("rol", rol)
                .optional_text("origen", origen)
                .optional_text("comuna", comuna)
                .build(),
        )
    }

    fn message_prefix(&self) -> &'static str {
        "¡Procesamiento de recepciones completado!"
    }
}
