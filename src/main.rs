use intern_test::{RunError, cli};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match cli::run().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e
                .downcast_ref::<RunError>()
                .map(RunError::exit_code)
                .unwrap_or(intern_test::core::models::FAILURE_EXIT_CODE);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
