// ==========================================
// TreeTracker Ingest - Emisor de sentencias
// ==========================================
// Responsabilidad: descriptor estructurado (tabla, columnas, valores)
// El SQL literal es solo una serialización de compatibilidad
// ==========================================

use serde::Serialize;

/// Valor tipado de una sentencia pendiente de inserción.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Text(String),
    Number(f64),
    Null,
}

impl SqlValue {
    /// Renderizado literal: comillas simples internas duplicadas,
    /// números en decimal plano, ausentes como NULL.
    pub fn render_literal(&self) -> String {
        match self {
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            SqlValue::Number(n) => crate::ingest::normalizer::render_number(*n),
            SqlValue::Null => "NULL".to_string(),
        }
    }
}

/// Descriptor de una inserción pendiente: tabla destino, lista
/// ordenada de columnas y valores posicionales. Se crea una vez por
/// registro aceptado y no se muta después.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementDescriptor {
    table: &'static str,
    columns: Vec<&'static str>,
    values: Vec<SqlValue>,
}

impl StatementDescriptor {
    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Forma parametrizada: SQL con marcadores `?` más la lista de
    /// valores a enlazar. Esta es la representación primaria para el
    /// colaborador de persistencia.
    pub fn parameterized(&self) -> (String, &[SqlValue]) {
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            self.columns.join(", "),
            placeholders
        );
        (sql, &self.values)
    }

    /// Serialización heredada con literales incrustados, en el formato
    /// exacto que consumían los clientes antiguos. Solo para
    /// compatibilidad; la forma parametrizada es la primaria.
    pub fn to_legacy_sql(&self) -> String {
        let rendered: Vec<String> = self.values.iter().map(|v| v.render_literal()).collect();
        format!(
            "INSERT INTO {} ({}) \nVALUES ({});",
            self.table,
            self.columns.join(", "),
            rendered.join(", ")
        )
    }
}

/// Constructor fluido de descriptores de inserción.
///
/// Las columnas opcionales se agregan solo cuando el valor está
/// presente, por lo que el largo de la lista depende del registro.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: &'static str,
    columns: Vec<&'static str>,
    values: Vec<SqlValue>,
}

impl InsertBuilder {
    pub fn new(table: &'static str) -> Self {
        InsertBuilder {
            table,
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn text(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.columns.push(column);
        self.values.push(SqlValue::Text(value.into()));
        self
    }

    pub fn number(mut self, column: &'static str, value: f64) -> Self {
        self.columns.push(column);
        self.values.push(SqlValue::Number(value));
        self
    }

    /// Columna numérica ausente: se emite igualmente, como NULL.
    pub fn null(mut self, column: &'static str) -> Self {
        self.columns.push(column);
        self.values.push(SqlValue::Null);
        self
    }

    /// Columna de texto opcional: se omite por completo si no hay valor.
    pub fn optional_text(self, column: &'static str, value: Option<String>) -> Self {
        match value {
            Some(v) => self.text(column, v),
            None => self,
        }
    }

    pub fn build(self) -> StatementDescriptor {
        StatementDescriptor {
            table: self.table,
            columns: self.columns,
            values: self.values,
        }
    }
}
