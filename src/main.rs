use clap::Parser;
use std::process::ExitCode;

use kanji_check::cli::Args;
use kanji_check::cli::commands::check::{self, CheckError};
use kanji_check::config::Environment;
use kanji_check::output::{self, OutputConfig};
use kanji_check::ui::Style;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let env = Environment::capture();

    output::init(OutputConfig::from_flags(args.quiet, args.no_color, &env));
    kanji_check::logging::init(args.verbose, &env);

    let options = check::CheckOptions {
        input: args.input,
        output: args.output,
        batch_size: args.batch_size,
        backend: args.backend,
        model: args.model,
        region: args.region,
        profile: args.profile,
    };

    match check::run_check(options, &env).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            kanji_check::warn!("{} {err:#}", Style::error("Error:"));
            let code = err
                .downcast_ref::<CheckError>()
                .map_or(exitcode::SOFTWARE, CheckError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
