use clap::Parser;
use authornest::cli::utils::output_error;
use authornest::cli::{Cli, OutputFormat};
use authornest::portal::ClientError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("authornest=warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = OutputFormat::from_cli(&cli);

    if let Err(e) = authornest::cli::run(cli).await {
        let code = e.downcast_ref::<ClientError>().map(ClientError::code);
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => output_error(&output, &e.to_string(), code)?,
        }
        std::process::exit(1);
    }

    Ok(())
}
