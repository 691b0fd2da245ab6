//! check_mssql_database entry point.

use mssqlprobe_lib::cli::{self, Cli, Invocation};
use mssqlprobe_lib::Report;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let report = match Cli::parse_args() {
        Invocation::Run(cli) => cli::execute(*cli).await,
        Invocation::Exit(text) => {
            print!("{}", text);
            std::process::exit(0);
        },
        Invocation::Invalid(e) => Report::unknown(&e),
    };

    println!("{}", report.output);
    std::process::exit(report.exit_code());
}
