// ==========================================
// TreeTracker Ingest - Entrada de línea de comandos
// ==========================================
// Uso: treetracker-ingest <archivo> <usuario> <operacion>
// Imprime el resultado agregado como JSON en stdout.
// ==========================================

use std::path::Path;
use std::process::ExitCode;

use treetracker_ingest::{logging, IngestContext, IngestEngine};

fn main() -> ExitCode {
    // Inicializa el sistema de logs
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        eprintln!("Uso: {} <archivo> <usuario> <operacion>", args[0]);
        eprintln!("  archivo    ruta al reporte (.xlsx, .xls, .ods o .csv)");
        eprintln!("  usuario    identificador del cliente dueño de los datos");
        eprintln!("  operacion  tipo de reporte (1, 3, 4, 5)");
        return ExitCode::from(2);
    }

    let path = Path::new(&args[1]);
    let tenant = &args[2];
    let operation = &args[3];

    tracing::info!("==================================================");
    tracing::info!("{} v{}", treetracker_ingest::APP_NAME, treetracker_ingest::VERSION);
    tracing::info!("==================================================");

    let engine = IngestEngine::new();
    let ctx = IngestContext::new(tenant.as_str());
    let result = engine.process_path(path, tenant, operation, &ctx);

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            tracing::error!("No se pudo serializar el resultado: {}", err);
            return ExitCode::FAILURE;
        }
    }

    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
