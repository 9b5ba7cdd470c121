// ==========================================
// TreeTracker Ingest - Pruebas de integración del motor
// ==========================================
// Flujo completo sobre libros en memoria: resolución de variante,
// resolución de columnas, procesamiento de filas y agregación.
// ==========================================


use test_helpers::{contexto, fecha, hoja, libro_simple, numero, texto};
use treetracker_ingest::variants::{
    AstillaMasisaVariant, IngresosGenericoVariant, RecepcionesVariant, VentasAraucoVariant,
    VentasMasisaVariant,
};
use treetracker_ingest::{logging, CellValue, IngestEngine, SqlValue, Workbook};

// ==========================================
// Recepciones: reporte de ingreso de planta
// ==========================================

#[test]
fn test_recepciones_full_sheet() {
    logging::init_test();
    let engine = IngestEngine::new();

    let workbook = libro_simple(
        "INGRESOS",
        &["Numero Guia", "NOMBRE PROVEEDOR", "Fecha Recepcion", "Volumen M3"],
        vec![
            vec![
                numero(12345.0),
                texto("Sociedad O'Higgins"),
                fecha(2024, 5, 1),
                numero(15000.0),
            ],
            // Guía no numérica: fila saltada en silencio
            vec![
                texto("SIN-GUIA"),
                texto("Acme"),
                fecha(2024, 5, 2),
                numero(8000.0),
            ],
            vec![
                numero(12346.0),
                texto("Forestal Sur"),
                CellValue::Empty,
                numero(2500.0),
            ],
        ],
    );

    let result = engine.process_workbook(&workbook, &RecepcionesVariant, &contexto("tenant-1"));

    assert!(result.success);
    assert_eq!(result.records_processed, 2);
    assert_eq!(result.sheets_processed, 1);
    assert_eq!(result.total_sheets, 1);
    assert!(result.errors.is_empty());
    assert_eq!(
        result.message,
        "¡Procesamiento de recepciones completado! 2 registros procesados de 1 hojas."
    );

    // Apóstrofe del proveedor duplicado en la forma heredada
    let sql = result.insert_statements[0].to_legacy_sql();
    assert_eq!(
        sql,
        "INSERT INTO recepciones (fecha_recepcion, producto_codigo, proveedor, num_guia, \
         volumen_m3, certificacion, user_id) \nVALUES ('2024-05-01T00:00:00', 'W1.1', \
         'Sociedad O''Higgins', '12345', 15.0, 'Material Controlado', 'tenant-1');"
    );

    // Fecha ausente resuelta con la hora del contexto
    assert_eq!(
        result.insert_statements[1].values()[0],
        SqlValue::Text("2025-06-15T10:30:00".to_string())
    );
}

#[test]
fn test_sheet_without_required_columns_is_soft_error() {
    logging::init_test();
    let engine = IngestEngine::new();

    let workbook = Workbook::from_sheets(vec![
        hoja("RESUMEN", &["Comentario", "Total"], vec![]),
        hoja(
            "INGRESOS",
            &["GUIA", "NOMBRE PROVEEDOR", "FECHA", "VOLUMEN M3"],
            vec![vec![
                numero(1.0),
                texto("Acme"),
                fecha(2024, 1, 10),
                numero(1000.0),
            ]],
        ),
    ]);

    let result = engine.process_workbook(&workbook, &RecepcionesVariant, &contexto("t"));

    // La hoja sin columnas no detiene a su hermana
    assert!(result.success);
    assert_eq!(result.records_processed, 1);
    assert_eq!(result.sheets_processed, 1);
    assert_eq!(result.total_sheets, 2);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0],
        "No se encontraron las columnas requeridas en la hoja «RESUMEN»: \
         [num_guia, proveedor, fecha_recepcion, volumen_m3]"
    );
}

#[test]
fn test_empty_workbook_succeeds_with_zero_records() {
    logging::init_test();
    let engine = IngestEngine::new();
    let workbook = Workbook::from_sheets(vec![]);

    let result = engine.process_workbook(&workbook, &RecepcionesVariant, &contexto("t"));

    assert!(result.success);
    assert_eq!(result.records_processed, 0);
    assert_eq!(result.total_sheets, 0);
    assert_eq!(
        result.message,
        "¡Procesamiento de recepciones completado! 0 registros procesados de 0 hojas."
    );
}

// ==========================================
// Venta astilla MASISA: producto por descripción
// ==========================================

#[test]
fn test_astilla_masisa_records_row_errors() {
    logging::init_test();
    let engine = IngestEngine::new();

    let workbook = libro_simple(
        "Hoja1",
        &["Fecha contabiliz.", "Guía Flete", "Descripción Material", "Recepción"],
        vec![
            vec![
                numero(20250728.0),
                numero(556677.0),
                texto("ASTILLA VERDE (TS)"),
                numero(1000.0),
            ],
            // Descripción desconocida: salto, no error
            vec![
                numero(20250728.0),
                numero(556678.0),
                texto("CORTEZA EUCALIPTO"),
                numero(500.0),
            ],
            vec![
                numero(20250729.0),
                numero(556679.0),
                texto("MATERIAL VERDE VALOR. COMB. COGENERACION P-RAD"),
                numero(847.3),
            ],
        ],
    );

    let result = engine.process_workbook(&workbook, &AstillaMasisaVariant, &contexto("tenant-1"));

    assert!(result.success);
    assert_eq!(result.records_processed, 2);
    assert!(result.errors.is_empty());

    // Astilla: 1000 × (2.54/1000); aserrín sin conversión
    assert_eq!(result.insert_statements[0].values()[4], SqlValue::Number(2.54));
    assert_eq!(
        result.insert_statements[0].values()[1],
        SqlValue::Text("W3.1".to_string())
    );
    assert_eq!(result.insert_statements[1].values()[4], SqlValue::Number(847.3));
    assert_eq!(
        result.insert_statements[1].values()[2],
        SqlValue::Text("MASISA".to_string())
    );
}

// ==========================================
// Ventas generales MASISA: esquema laxo
// ==========================================

#[test]
fn test_ventas_masisa_reports_unparseable_date_as_row_error() {
    logging::init_test();
    let engine = IngestEngine::new();

    let workbook = libro_simple(
        "VENTAS",
        &["Fecha Venta", "Num Factura", "Descripción Material", "Volumen M3"],
        vec![
            vec![
                numero(20250310.0),
                numero(880011.0),
                texto("ASTILLA VERDE (TS)"),
                numero(1000.0),
            ],
            // Fecha presente pero ilegible: error de fila registrado
            vec![
                texto("marzo del 25"),
                numero(880012.0),
                texto("aserrín"),
                numero(500.0),
            ],
            // Sin factura: se autogenera por índice de fila
            vec![
                numero(20250311.0),
                CellValue::Empty,
                texto("aserrín"),
                numero(2000.0),
            ],
        ],
    );

    let result = engine.process_workbook(&workbook, &VentasMasisaVariant, &contexto("tenant-1"));

    assert!(result.success);
    assert_eq!(result.records_processed, 2);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0],
        "Error en fila 1: no se pudo interpretar la fecha de venta"
    );

    // Astilla: (1000 / 1000) × 2.54
    assert_eq!(result.insert_statements[0].values()[4], SqlValue::Number(2.54));
    // Factura autogenerada con índice base 0 + 1
    assert_eq!(
        result.insert_statements[1].values()[3],
        SqlValue::Text("AUTO-0003".to_string())
    );
    // Precio unitario siempre NULL en la forma heredada
    assert!(result.insert_statements[0]
        .to_legacy_sql()
        .contains("NULL"));
}

// ==========================================
// Proforma ARAUCO: encabezados compactos fijos
// ==========================================

#[test]
fn test_ventas_arauco_product_mapping_and_raw_volume() {
    logging::init_test();
    let engine = IngestEngine::new();

    let workbook = libro_simple(
        "PROFORMA",
        &["FCH_RECEPCION", "NUM_GUIA_SERIE_C", "VOLUMEN_M3_RECEPCION", "COD_ADICIONAL"],
        vec![
            vec![fecha(2025, 2, 20), numero(880011.0), numero(34.7), texto("ASTI")],
            vec![fecha(2025, 2, 21), numero(880012.0), numero(28.1), texto("ASCM")],
            // Código desconocido cae al aserrín
            vec![fecha(2025, 2, 22), numero(880013.0), numero(10.0), texto("XYZ")],
        ],
    );

    let result = engine.process_workbook(&workbook, &VentasAraucoVariant, &contexto("tenant-1"));

    assert!(result.success);
    assert_eq!(result.records_processed, 3);

    assert_eq!(
        result.insert_statements[0].values()[1],
        SqlValue::Text("W3.1".to_string())
    );
    // Volumen sin conversión
    assert_eq!(result.insert_statements[0].values()[4], SqlValue::Number(34.7));
    assert_eq!(
        result.insert_statements[1].values()[1],
        SqlValue::Text("W3.2".to_string())
    );
    assert_eq!(
        result.insert_statements[2].values()[1],
        SqlValue::Text("W3.2".to_string())
    );
    assert_eq!(
        result.insert_statements[0].values()[2],
        SqlValue::Text("ARAUCO".to_string())
    );
}

// ==========================================
// Ingresos genérico: hojas mensuales
// ==========================================

#[test]
fn test_ingresos_generico_monthly_sheets() {
    logging::init_test();
    let engine = IngestEngine::new();

    let workbook = Workbook::from_sheets(vec![
        hoja(
            "MARZO",
            &["NOMBRE PROVEEDOR", "M3 o m3st"],
            vec![
                vec![texto("Forestal Sur"), numero(120.5)],
                vec![texto("Acme"), numero(80.0)],
            ],
        ),
        hoja(
            "ABRIL",
            &["NOMBRE PROVEEDOR", "M3 o m3st", "FSC"],
            vec![vec![texto("Acme"), numero(30.0), texto("FSC 100%")]],
        ),
    ]);

    let result = engine.process_workbook(&workbook, &IngresosGenericoVariant, &contexto("t"));

    assert!(result.success);
    assert_eq!(result.records_processed, 3);
    assert_eq!(result.sheets_processed, 2);
    assert_eq!(
        result.message,
        "¡Procesamiento completado! 3 registros procesados de 2 hojas."
    );

    // Fecha derivada del mes de la hoja
    assert_eq!(
        result.insert_statements[0].values()[0],
        SqlValue::Text("2025-03-01T00:00:00".to_string())
    );
    // Guía autogenerada con hoja e índice
    assert_eq!(
        result.insert_statements[1].values()[3],
        SqlValue::Text("AUTO-MARZO-1".to_string())
    );
    // Certificación de la columna FSC cuando existe
    assert_eq!(
        result.insert_statements[2].values()[5],
        SqlValue::Text("FSC 100%".to_string())
    );
    // Volumen sin dividir en este reporte
    assert_eq!(result.insert_statements[0].values()[4], SqlValue::Number(120.5));
}

// ==========================================
// Determinismo: misma entrada, misma salida
// ==========================================

#[test]
fn test_same_input_yields_identical_statements() {
    logging::init_test();
    let engine = IngestEngine::new();

    let build = || {
        libro_simple(
            "INGRESOS",
            &["GUIA", "NOMBRE PROVEEDOR", "FECHA", "VOLUMEN M3"],
            vec![
                vec![numero(10.0), texto("Acme"), CellValue::Empty, numero(2000.0)],
                vec![numero(11.0), texto("Beta"), fecha(2024, 3, 3), numero(4500.0)],
            ],
        )
    };

    let ctx = contexto("tenant-1");
    let first = engine.process_workbook(&build(), &RecepcionesVariant, &ctx);
    let second = engine.process_workbook(&build(), &RecepcionesVariant, &ctx);

    assert_eq!(first.rendered_statements(), second.rendered_statements());
}

// ==========================================
// Resolución de variante por usuario y operación
// ==========================================

#[test]
fn test_unknown_variant_fails_before_reading_file() {
    logging::init_test();
    let engine = IngestEngine::new();
    let ctx = contexto("nadie");

    let result = engine.process_path(
        std::path::Path::new("/no/existe.xlsx"),
        "nadie",
        "99",
        &ctx,
    );

    assert!(!result.success);
    assert!(result.error.is_some());
    assert_eq!(result.records_processed, 0);
}

#[test]
fn test_missing_file_fails_with_processing_error() {
    logging::init_test();
    let engine = IngestEngine::new();
    let ctx = contexto("tenant-1");

    let result = engine.process_path(
        std::path::Path::new("/no/existe.xlsx"),
        treetracker_ingest::TENANT_FORESTAL,
        treetracker_ingest::operaciones::INGRESOS,
        &ctx,
    );

    assert!(!result.success);
    let error = result.error.as_deref().unwrap_or("");
    assert!(error.starts_with("Error en el procesamiento:"), "{}", error);
}
