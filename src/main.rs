// Entrypoint for the CLI application.
// - Keeps `main` small: build the API client, run one cycle against the
//   current directory, map the outcome to an exit code.

use std::path::Path;
use std::process;

use tracing::error;
use tracing_subscriber::EnvFilter;

use youthstudy_cli::api::ApiClient;
use youthstudy_cli::run::run;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let api = match ApiClient::from_env() {
        Ok(api) => api,
        Err(err) => {
            error!("{err:#}");
            process::exit(1);
        }
    };

    match run(&api, Path::new(".")) {
        Ok(()) => process::exit(0),
        Err(err) => {
            let code = err.exit_code();
            error!("{:#}", anyhow::Error::new(err));
            process::exit(code);
        }
    }
}
