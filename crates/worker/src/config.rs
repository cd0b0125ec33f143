use std::path::PathBuf;

/// Worker configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory where export files are written (default: `./exports`).
    pub export_dir: PathBuf,
    /// Maximum number of concurrently running export jobs (default: `2`).
    pub concurrency: usize,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default     |
    /// |----------------------|-------------|
    /// | `EXPORT_DIR`         | `./exports` |
    /// | `EXPORT_CONCURRENCY` | `2`         |
    pub fn from_env() -> Self {
        let export_dir = std::env::var("EXPORT_DIR")
            .unwrap_or_else(|_| "./exports".into())
            .into();

        let concurrency: usize = std::env::var("EXPORT_CONCURRENCY")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("EXPORT_CONCURRENCY must be a valid usize");

        Self {
            export_dir,
            concurrency,
        }
    }
}
