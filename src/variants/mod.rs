// ==========================================
// TreeTracker Ingest - Variantes de reglas de negocio
// ==========================================
// Una variante por familia de reporte de origen. Cada una define
// campos requeridos, resolución de producto, conversión de unidades
// y atributos fijos. Las tablas son datos estáticos del proceso,
// nunca se mutan después del arranque.
// ==========================================

pub mod astilla_masisa;
pub mod ingresos_generico;
pub mod recepciones;
pub mod registry;
pub mod ventas_arauco;
pub mod ventas_masisa;

pub use astilla_masisa::AstillaMasisaVariant;
pub use ingresos_generico::IngresosGenericoVariant;
pub use recepciones::RecepcionesVariant;
pub use registry::VariantRegistry;
pub use ventas_arauco::VentasAraucoVariant;
pub use ventas_masisa::VentasMasisaVariant;

use crate::ingest::resolver::{FieldRule, LogicalField, ResolvedRow};
use crate::ingest::statement::StatementDescriptor;
use chrono::NaiveDateTime;

// ===== Atributos fijos compartidos =====

/// Certificación por defecto cuando el reporte no trae una.
pub const CERTIFICACION_DEFAULT: &str = "Material Controlado";

/// Código de producto de las recepciones de trozos (raw logs).
pub const PRODUCTO_RECEPCION: &str = "W1.1";

/// Código de astilla y de aserrín en el vocabulario cerrado de productos.
pub const CODIGO_ASTILLA: &str = "W3.1";
pub const CODIGO_ASERRIN: &str = "W3.2";

pub const CLIENTE_MASISA: &str = "MASISA";
pub const CLIENTE_ARAUCO: &str = "ARAUCO";

/// Catálogo código → nombre, usado para los logs de diagnóstico.
pub const CATALOGO_PRODUCTOS: &[(&str, &str)] = &[
    ("W1.1", "Astillas pinus radiata"),
    ("W1.2", "Aserrín pinus radiata"),
    ("W2.1", "Madera aserrada"),
    ("W3.1", "Astillas pinus radiata"),
    ("W3.2", "Aserrín pinus radiata"),
];

pub fn nombre_producto(codigo: &str) -> &'static str {
    CATALOGO_PRODUCTOS
        .iter()
        .find(|(c, _)| *c == codigo)
        .map(|(_, n)| *n)
        .unwrap_or("Producto desconocido")
}

/// Contexto de una fila en proceso: identidad del dueño, hora de
/// procesamiento inyectada y posición para mensajes.
pub struct RowContext<'a> {
    pub owner_id: &'a str,
    pub now: NaiveDateTime,
    pub sheet_name: &'a str,
    pub row_index: usize,
}

/// Veredicto de una fila.
pub enum RowOutcome {
    /// Registro canónico aceptado, ya convertido en sentencia.
    Accepted(StatementDescriptor),
    /// Salto silencioso: ruido de calidad de datos esperado,
    /// no se registra ni se cuenta.
    Skip,
    /// Falla de extracción. Solo las variantes que declaran
    /// `records_row_errors` la ven reflejada en la lista de errores.
    Fail(String),
}

/// Conjunto de reglas de una familia de reportes.
///
/// Las implementaciones son estructuras sin estado; todas sus tablas
/// (predicados de encabezado, códigos de producto) son `'static` y
/// seguras para lectura concurrente por construcción.
pub trait ReportVariant: Send + Sync {
    /// Nombre corto para logs.
    fn name(&self) -> &'static str;

    /// Tabla destino de las sentencias emitidas.
    fn table(&self) -> &'static str;

    /// Tabla declarativa de resolución de columnas.
    fn field_rules(&self) -> &'static [FieldRule];

    /// Campos lógicos sin los cuales la hoja entera se salta.
    fn required_fields(&self) -> &'static [LogicalField];

    /// Si los `RowOutcome::Fail` se agregan a la lista de errores.
    /// La divergencia entre variantes es intencional: replica el
    /// comportamiento observado de cada reporte en producción.
    fn records_row_errors(&self) -> bool {
        false
    }

    /// Extrae, valida y convierte una fila en sentencia.
    fn process_row(&self, row: &ResolvedRow<'_>, ctx: &RowContext<'_>) -> RowOutcome;

    /// Prefijo del mensaje de término para el resultado agregado.
    fn message_prefix(&self) -> &'static str;
}
