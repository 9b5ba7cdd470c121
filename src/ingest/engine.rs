// ==========================================
// TreeTracker Ingest - Orquestador de ingesta
// ==========================================
// Flujo: cargar libro → por hoja resolver columnas → por fila
// normalizar + reglas de variante → emitir sentencias → agregar.
// Procesamiento síncrono, sin estado mutable entre solicitudes.
// ==========================================

use crate::ingest::resolver::{resolve_columns, ResolvedRow};
use crate::ingest::result::ProcessingResult;
use crate::ingest::workbook::Workbook;
use crate::variants::registry::VariantRegistry;
use crate::variants::{ReportVariant, RowContext, RowOutcome};
use chrono::{NaiveDateTime, Utc};
use std::path::Path;

/// Contexto de una solicitud: identidad del dueño y hora de
/// procesamiento. La hora se inyecta para que los respaldos de fecha
/// sean reproducibles en pruebas.
#[derive(Debug, Clone)]
pub struct IngestContext {
    pub owner_id: String,
    pub now: NaiveDateTime,
}

impl IngestContext {
    pub fn new(owner_id: impl Into<String>) -> Self {
        IngestContext {
            owner_id: owner_id.into(),
            now: Utc::now().naive_utc(),
        }
    }

    /// Fija la hora de procesamiento (pruebas).
    pub fn with_fixed_time(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }
}

/// Motor de ingesta: registro de variantes + orquestación.
pub struct IngestEngine {
    registry: VariantRegistry,
}

impl IngestEngine {
    pub fn new() -> Self {
        IngestEngine {
            registry: VariantRegistry::with_defaults(),
        }
    }

    pub fn with_registry(registry: VariantRegistry) -> Self {
        IngestEngine { registry }
    }

    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    /// Punto de entrada por solicitud: resuelve la variante, carga el
    /// libro y lo procesa. Los dos casos fatales (variante desconocida,
    /// libro ilegible) devuelven `success=false` con el estado parcial.
    pub fn process_path(
        &self,
        path: &Path,
        tenant: &str,
        operation: &str,
        ctx: &IngestContext,
    ) -> ProcessingResult {
        let variant = match self.registry.resolve(tenant, operation) {
            Ok(v) => v,
            Err(err) => {
                let mut result = ProcessingResult::new();
                result.fail(err.to_string());
                return result;
            }
        };

        tracing::info!(
            archivo = %path.display(),
            usuario = tenant,
            variante = variant.name(),
            "Procesando archivo"
        );

        let workbook = match Workbook::load(path) {
            Ok(wb) => wb,
            Err(err) => {
                let mut result = ProcessingResult::new();
                result.fail(format!("Error en el procesamiento: {}", err));
                return result;
            }
        };

        self.process_workbook(&workbook, variant.as_ref(), ctx)
    }

    /// Procesa un libro ya materializado con una variante concreta.
    ///
    /// Las fallas de fila nunca escalan a la hoja y las de hoja nunca
    /// escalan al libro: terminar con cero registros sigue siendo éxito.
    pub fn process_workbook(
        &self,
        workbook: &Workbook,
        variant: &dyn ReportVariant,
        ctx: &IngestContext,
    ) -> ProcessingResult {
        let mut result = ProcessingResult::new();
        result.total_sheets = workbook.total_sheets();

        for sheet in &workbook.sheets {
            tracing::info!(hoja = %sheet.name, filas = sheet.rows.len(), "Procesando hoja");

            let map = resolve_columns(sheet, variant.field_rules());
            let missing = map.missing(variant.required_fields());
            if !missing.is_empty() {
                let keys: Vec<&str> = missing.iter().map(|f| f.key()).collect();
                // La hoja no aporta registros pero las hermanas siguen
                result.soft_error(format!(
                    "No se encontraron las columnas requeridas en la hoja «{}»: [{}]",
                    sheet.name,
                    keys.join(", ")
                ));
                continue;
            }

            let mut sheet_records = 0usize;
            for (row_index, cells) in sheet.rows.iter().enumerate() {
                let row = ResolvedRow::new(&map, cells);
                let row_ctx = RowContext {
                    owner_id: &ctx.owner_id,
                    now: ctx.now,
                    sheet_name: &sheet.name,
                    row_index,
                };

                match variant.process_row(&row, &row_ctx) {
                    RowOutcome::Accepted(statement) => {
                        result.accept(statement);
                        sheet_records += 1;
                    }
                    RowOutcome::Skip => {}
                    RowOutcome::Fail(message) => {
                        if variant.records_row_errors() {
                            result.soft_error(format!("Error en fila {}: {}", row_index, message));
                        } else {
                            tracing::debug!(
                                fila = row_index,
                                error = %message,
                                "Falla de fila no registrada por la variante"
                            );
                        }
                    }
                }
            }

            result.sheets_processed += 1;
            tracing::info!(
                hoja = %sheet.name,
                registros = sheet_records,
                "Hoja procesada"
            );
        }

        result.finish(format!(
            "{} {} registros procesados de {} hojas.",
            variant.message_prefix(),
            result.records_processed,
            result.sheets_processed
        ));
        result
    }
}

impl Default for IngestEngine {
    fn default() -> Self {
        Self::new()
    }
}
