fn main() {
    if let Err(err) = graph_arrange::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
