// ==========================================
// TreeTracker Ingest - Registro de variantes
// ==========================================
// Selección por datos (usuario, operación) resuelta en el arranque.
// Sin carga dinámica de código: el despacho heredado construía rutas
// de archivo desde la solicitud; aquí el registro es estático.
// ==========================================

use crate::ingest::error::{IngestError, IngestResult};
use crate::variants::{
    AstillaMasisaVariant, IngresosGenericoVariant, RecepcionesVariant, ReportVariant,
    VentasAraucoVariant, VentasMasisaVariant,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Usuario de la forestal con funciones personalizadas por operación.
pub const TENANT_FORESTAL: &str = "496f6470-2f4d-40c6-9426-bb5421116a3d";

/// Identificadores de operación expuestos por el despachador.
pub mod operaciones {
    pub const INGRESOS: &str = "1";
    pub const VENTA_ASTILLA_MASISA: &str = "3";
    pub const VENTAS_MASISA: &str = "4";
    pub const PROFORMA_ARAUCO: &str = "5";
}

/// Registro (usuario, operación) → variante.
///
/// La resolución prueba primero la entrada específica del usuario,
/// después su variante por defecto, y por último la tabla genérica
/// por operación. Sin coincidencia: `IngestError::UnknownVariant`.
pub struct VariantRegistry {
    por_usuario: HashMap<(String, String), Arc<dyn ReportVariant>>,
    por_defecto_usuario: HashMap<String, Arc<dyn ReportVariant>>,
    genericas: HashMap<String, Arc<dyn ReportVariant>>,
}

impl VariantRegistry {
    pub fn empty() -> Self {
        VariantRegistry {
            por_usuario: HashMap::new(),
            por_defecto_usuario: HashMap::new(),
            genericas: HashMap::new(),
        }
    }

    /// Registro con el mapeo de producción.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        let recepciones: Arc<dyn ReportVariant> = Arc::new(RecepcionesVariant);
        registry.register_tenant(
            TENANT_FORESTAL,
            operaciones::INGRESOS,
            Arc::clone(&recepciones),
        );
        registry.register_tenant(
            TENANT_FORESTAL,
            operaciones::VENTA_ASTILLA_MASISA,
            Arc::new(AstillaMasisaVariant),
        );
        registry.register_tenant(
            TENANT_FORESTAL,
            operaciones::VENTAS_MASISA,
            Arc::new(VentasMasisaVariant),
        );
        registry.register_tenant(
            TENANT_FORESTAL,
            operaciones::PROFORMA_ARAUCO,
            Arc::new(VentasAraucoVariant),
        );
        // Operaciones no listadas de este usuario caen a recepciones
        registry.register_tenant_default(TENANT_FORESTAL, recepciones);

        // Variante genérica por operación, ignora la identidad
        registry.register_generic(operaciones::INGRESOS, Arc::new(IngresosGenericoVariant));

        registry
    }

    pub fn register_tenant(
        &mut self,
        tenant: &str,
        operation: &str,
        variant: Arc<dyn ReportVariant>,
    ) {
        self.por_usuario
            .insert((tenant.to_string(), operation.to_string()), variant);
    }

    pub fn register_tenant_default(&mut self, tenant: &str, variant: Arc<dyn ReportVariant>) {
        self.por_defecto_usuario.insert(tenant.to_string(), variant);
    }

    pub fn register_generic(&mut self, operation: &str, variant: Arc<dyn ReportVariant>) {
        self.genericas.insert(operation.to_string(), variant);
    }

    pub fn resolve(&self, tenant: &str, operation: &str) -> IngestResult<Arc<dyn ReportVariant>> {
        if let Some(variant) = self
            .por_usuario
            .get(&(tenant.to_string(), operation.to_string()))
        {
            tracing::info!(
                usuario = tenant,
                operacion = operation,
                variante = variant.name(),
                "Variante personalizada resuelta"
            );
            return Ok(Arc::clone(variant));
        }
        if let Some(variant) = self.por_defecto_usuario.get(tenant) {
            tracing::info!(
                usuario = tenant,
                operacion = operation,
                variante = variant.name(),
                "Variante por defecto del usuario"
            );
            return Ok(Arc::clone(variant));
        }
        if let Some(variant) = self.genericas.get(operation) {
            tracing::info!(
                operacion = operation,
                variante = variant.name(),
                "Variante genérica resuelta"
            );
            return Ok(Arc::clone(variant));
        }
        Err(IngestError::UnknownVariant {
            tenant: tenant.to_string(),
            operation: operation.to_string(),
        })
    }
}

impl Default for VariantRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
