fn main() {
    if let Err(e) = dash_filters::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
