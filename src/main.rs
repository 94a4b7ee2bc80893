use clap::Parser;

fn main() {
    let cli = pgsniffer::cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start async runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(pgsniffer::app::run(cli)) {
        eprintln!("pgsniffer: {err}");
        std::process::exit(1);
    }
}
