use clap::Parser;
use casegrade_cli::{cmd::GlobalArgs, util};

#[tokio::main]
async fn main() {
    util::init_logger();
    let app = GlobalArgs::parse();
    match app.exec().await {
        Ok(report) if report.scorecard.all_passed() => (),
        Ok(_) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:?}", e);
            std::process::exit(1);
        }
    }
}
