mod cli;
mod config;
mod linkcache;
mod normalize;
mod paginate;
mod render;
mod reports;
mod retry;
mod shorten;
mod transport;
mod types;
mod ui;

use cli::ReportCommand;

fn main() {
    env_logger::init();

    // Parse CLI arguments
    let args = cli::CliArgs::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        ui::print_error(&e);
        std::process::exit(1);
    }

    // Resolve cache location, shortener, and pagination budget
    let ctx = match config::build_context(&args) {
        Ok(ctx) => ctx,
        Err(e) => {
            ui::print_error(&format!("Configuration error: {}", e));
            std::process::exit(1);
        }
    };

    // Run the selected report against its export
    let result = match &args.command {
        ReportCommand::Bugzilla(report) => reports::bugzilla::run(&ctx, report),
        ReportCommand::Jira(report) => reports::jira::run(&ctx, report),
        ReportCommand::Perforce(report) => reports::perforce::run(&ctx, report),
    };

    // stdout carries only the report payload; the scheduler forwards it
    // to the chat transport verbatim.
    match result {
        Ok(output) => {
            if ctx.plain {
                println!("{}", output.to_plain());
            } else {
                println!("{}", output.to_json());
            }
        }
        Err(e) => {
            ui::print_error(&e);
            std::process::exit(1);
        }
    }
}
