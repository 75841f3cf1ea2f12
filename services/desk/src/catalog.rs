use clap::Args;
use credit_desk::error::AppError;
use credit_desk::workflows::desk::{ApplicationCatalog, ApplicationSummary};

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogArgs {
    /// Case-insensitive filter on applicant name or application id
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Emit the matching applications as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let catalog = ApplicationCatalog::standard();
    let applications = catalog.search(args.search.as_deref().unwrap_or_default());

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&applications).map_err(std::io::Error::from)?;
        println!("{rendered}");
        return Ok(());
    }

    if applications.is_empty() {
        println!("No applications match.");
        return Ok(());
    }
    println!(
        "{:<8} {:<28} {:<16} {:<14} {:<12} Progress",
        "ID", "Applicant", "Program", "Amount", "Status"
    );
    for application in applications {
        println!("{}", render_row(application));
    }
    Ok(())
}

fn render_row(application: &ApplicationSummary) -> String {
    format!(
        "{:<8} {:<28} {:<16} {:<14} {:<12} {}% ({})",
        application.id,
        application.applicant,
        application.program,
        application.amount,
        application.status.label(),
        application.progress,
        application.band().label()
    )
}
