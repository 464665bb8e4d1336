//! Worker configuration loaded from environment variables.

use std::path::PathBuf;

use uuid::Uuid;

use portage_core::context::{clamp_limit, DEFAULT_BATCH_LIMIT, MAX_BATCH_LIMIT};
use portage_core::locale::DEFAULT_LOCALE;
use portage_core::profile::Profile;

/// Worker configuration.
///
/// `CONNECTION_ID` identifies the source connection and must stay stable
/// across runs — it is part of every identity mapping's key.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Postgres connection string (unused in dry-run mode).
    pub database_url: String,
    /// Directory containing one `<entity>.json` dump per data set.
    pub source_dir: PathBuf,
    /// Stable identity of the source connection.
    pub connection_id: Uuid,
    /// Source profile to migrate.
    pub profile: Profile,
    /// Shop default locale.
    pub locale: String,
    /// Records per batch (clamped).
    pub batch_size: i64,
    /// Run entirely in memory, without touching the target database.
    pub dry_run: bool,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var         | Default         |
    /// |-----------------|-----------------|
    /// | `DATABASE_URL`  | required unless `DRY_RUN=true` |
    /// | `SOURCE_DIR`    | `./source-data` |
    /// | `CONNECTION_ID` | required        |
    /// | `PROFILE`       | `shop5`         |
    /// | `LOCALE`        | `en-GB`         |
    /// | `BATCH_SIZE`    | `100`           |
    /// | `DRY_RUN`       | `false`         |
    pub fn from_env() -> Self {
        let dry_run = std::env::var("DRY_RUN")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) if dry_run => String::new(),
            Err(_) => panic!("DATABASE_URL must be set (or DRY_RUN=true)"),
        };

        let source_dir: PathBuf = std::env::var("SOURCE_DIR")
            .unwrap_or_else(|_| "./source-data".into())
            .into();

        let connection_id: Uuid = std::env::var("CONNECTION_ID")
            .expect("CONNECTION_ID must be set")
            .parse()
            .expect("CONNECTION_ID must be a valid UUID");

        let profile_name = std::env::var("PROFILE").unwrap_or_else(|_| "shop5".into());
        let profile = Profile::from_str(&profile_name).unwrap_or_else(|| {
            panic!(
                "PROFILE must be one of: {}",
                Profile::ALL.join(", ")
            )
        });

        let locale = std::env::var("LOCALE").unwrap_or_else(|_| DEFAULT_LOCALE.into());

        let batch_size: i64 = std::env::var("BATCH_SIZE")
            .unwrap_or_else(|_| DEFAULT_BATCH_LIMIT.to_string())
            .parse()
            .expect("BATCH_SIZE must be a valid integer");
        let batch_size = clamp_limit(Some(batch_size), DEFAULT_BATCH_LIMIT, MAX_BATCH_LIMIT);

        Self {
            database_url,
            source_dir,
            connection_id,
            profile,
            locale,
            batch_size,
            dry_run,
        }
    }
}
