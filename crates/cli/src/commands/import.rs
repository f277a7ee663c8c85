use std::fs;
use std::path::Path;

use caliope_core::domain::catalog::{ProductUpload, ServiceUpload};
use caliope_core::import::{BulkImporter, ImportError, PRODUCT_ID_PREFIX, SERVICE_ID_PREFIX};
use caliope_db::Repositories;
use clap::ValueEnum;

use crate::commands::{migrated_pool, prepare, CommandResult, Failure};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ImportTarget {
    Services,
    Products,
}

impl ImportTarget {
    fn success_message(&self, count: usize) -> String {
        match self {
            Self::Services => format!("{count} servicios añadidos con éxito."),
            Self::Products => format!("{count} productos añadidos con éxito."),
        }
    }
}

pub fn run(target: ImportTarget, file: &Path) -> CommandResult {
    let raw = match fs::read_to_string(file) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "import",
                "file_read",
                format!("could not read `{}`: {error}", file.display()),
                2,
            );
        }
    };

    let (config, runtime) = match prepare("import") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };
    let importer = match BulkImporter::new(config.import.chunk_size) {
        Ok(importer) => importer,
        Err(error) => {
            return CommandResult::failure("import", "config_validation", error.to_string(), 2);
        }
    };

    let result = runtime.block_on(async {
        let pool = migrated_pool(&config).await?;
        let repositories = Repositories::sql(pool.clone());

        let imported = match target {
            ImportTarget::Services => {
                importer
                    .import_json::<ServiceUpload, _>(
                        &raw,
                        SERVICE_ID_PREFIX,
                        repositories.services.as_ref(),
                    )
                    .await
            }
            ImportTarget::Products => {
                importer
                    .import_json::<ProductUpload, _>(
                        &raw,
                        PRODUCT_ID_PREFIX,
                        repositories.products.as_ref(),
                    )
                    .await
            }
        };

        pool.close().await;
        imported.map_err(classify)
    });

    match result {
        Ok(count) => CommandResult::success("import", target.success_message(count)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("import", error_class, message, exit_code)
        }
    }
}

fn classify(error: ImportError) -> Failure {
    match error {
        ImportError::Write { .. } => ("import_write", error.to_string(), 6),
        ImportError::InvalidChunkSize(_) => ("config_validation", error.to_string(), 2),
        ImportError::InvalidJson(_) | ImportError::NotAnArray | ImportError::InvalidItem { .. } => {
            ("invalid_payload", error.to_string(), 7)
        }
    }
}
