fn main() {
    if let Err(err) = battery_push::app::run() {
        eprintln!("application startup failed: {err}");
        std::process::exit(1);
    }
}
