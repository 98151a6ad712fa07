use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match sg_cli::cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(sg_cli::errors::get_exit_code(&e))
        }
    }
}
