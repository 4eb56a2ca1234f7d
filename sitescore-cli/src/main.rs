//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    let multi = sitescore_cli::init_logging();
    if let Err(err) = sitescore_cli::run(&multi) {
        eprintln!("sitescore: {err}");
        std::process::exit(1);
    }
}
