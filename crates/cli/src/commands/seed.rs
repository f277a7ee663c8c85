use caliope_db::{DemoDataset, Repositories, SeedResult};

use crate::commands::{migrated_pool, prepare, CommandResult};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = migrated_pool(&config).await?;

        let loaded = DemoDataset::load(&Repositories::sql(pool.clone()))
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8));

        pool.close().await;
        loaded
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", summary(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn summary(seeded: &SeedResult) -> String {
    format!(
        "demo dataset loaded: {} services, {} products, {} users",
        seeded.services, seeded.products, seeded.users
    )
}
