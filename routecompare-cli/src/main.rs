//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = routecompare_cli::run() {
        eprintln!("routecompare: {err}");
        std::process::exit(1);
    }
}
