use clap::Parser;
use rangetree::cli::{execute_command, output, Cli};
use rangetree::exitcode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let code = match execute_command(&cli) {
        Ok(()) => exitcode::OK,
        Err(e) => {
            output::error(&e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -v -v -v");
            LevelFilter::TRACE
        }
    };

    // Create a subscriber with formatted output directed to stderr
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangetree::util::testing;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        testing::init_test_setup();
        Cli::command().debug_assert();
    }

    #[test]
    fn given_repeated_verbose_flag_when_parsing_then_counts() {
        let cli = Cli::try_parse_from(["rangetree", "-vv", "demo"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn given_run_with_values_when_parsing_then_splits_on_commas() {
        let cli =
            Cli::try_parse_from(["rangetree", "run", "-", "--values", "1,-2,3", "-a", "max"])
                .unwrap();
        match cli.command {
            Some(rangetree::cli::Commands::Run {
                values,
                aggregation,
                ..
            }) => {
                assert_eq!(values, vec![1, -2, 3]);
                assert_eq!(aggregation, Some(rangetree::application::Aggregation::Max));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
