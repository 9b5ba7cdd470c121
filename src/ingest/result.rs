// ==========================================
// TreeTracker Ingest - Agregador de resultados
// ==========================================
// Responsabilidad: acumular conteos, errores blandos y sentencias
// Contrato de salida: único objeto devuelto por el motor
// ==========================================

use crate::ingest::statement::StatementDescriptor;
use serde::Serialize;

/// Resultado agregado de procesar un libro completo.
///
/// Se crea una vez por solicitud, se puebla incrementalmente y se
/// devuelve como única salida del motor. Los consumidores dependen de
/// que `records_processed` e `insert_statements` vengan poblados aun
/// cuando hubo hojas o filas saltadas, mientras el libro haya cargado.
#[derive(Debug, Serialize)]
pub struct ProcessingResult {
    pub success: bool,
    pub records_processed: usize,
    pub sheets_processed: usize,
    pub total_sheets: usize,
    pub errors: Vec<String>,
    pub insert_statements: Vec<StatementDescriptor>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingResult {
    pub fn new() -> Self {
        ProcessingResult {
            success: false,
            records_processed: 0,
            sheets_processed: 0,
            total_sheets: 0,
            errors: Vec::new(),
            insert_statements: Vec::new(),
            message: String::new(),
            error: None,
        }
    }

    /// Registro aceptado: suma al conteo y guarda su sentencia.
    pub fn accept(&mut self, statement: StatementDescriptor) {
        self.insert_statements.push(statement);
        self.records_processed += 1;
    }

    /// Error blando: se registra sin abortar el procesamiento.
    pub fn soft_error(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.errors.push(message);
    }

    /// Cierre exitoso (aun con cero registros aceptados).
    pub fn finish(&mut self, message: String) {
        self.success = true;
        self.message = message;
    }

    /// Cierre fatal: conserva el estado parcial acumulado.
    pub fn fail(&mut self, error: String) {
        tracing::error!("{}", error);
        self.success = false;
        self.errors.push(error.clone());
        self.error = Some(error);
    }

    /// Renderizado heredado de todas las sentencias acumuladas.
    pub fn rendered_statements(&self) -> Vec<String> {
        self.insert_statements
            .iter()
            .map(|s| s.to_legacy_sql())
            .collect()
    }
}

impl Default for ProcessingResult {
    fn default() -> Self {
        Self::new()
    }
}
