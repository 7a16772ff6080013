use std::env;

use fire_age::api::CliError;
use tracing::error;

#[tokio::main]
async fn main() {
    fire_age::telemetry::init_tracing();

    let raw_args: Vec<String> = env::args().collect();
    match raw_args.get(1).map(|s| s.as_str()) {
        Some("serve") => {
            let port = raw_args
                .get(2)
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(8080);
            if let Err(e) = fire_age::api::run_http_server(port).await {
                error!("server error: {e}");
                std::process::exit(1);
            }
        }
        Some("simulate") => match fire_age::api::run_cli(&raw_args[1..]) {
            Ok(json) => println!("{json}"),
            Err(CliError::Args(e)) => e.exit(),
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        },
        _ => {
            eprintln!("Usage: fire_age serve [port] | fire_age simulate [--flags]");
            std::process::exit(1);
        }
    }
}
