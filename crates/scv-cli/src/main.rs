mod cli;

fn main() {
    // Logging is best effort; the CLI works without it.
    let _log_guard = scv_core::logging::init().ok();

    if let Err(e) = cli::run() {
        if e.downcast_ref::<cli::Reported>().is_none() {
            eprintln!("{e:#}"); // pretty anyhow chain
        }
        std::process::exit(1);
    }
}
