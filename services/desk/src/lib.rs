mod catalog;
mod cli;
mod demo;
mod infra;

use credit_desk::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
