fn main() {
    if let Err(err) = battery_push::app::run_agent() {
        eprintln!("push agent startup failed: {err}");
        std::process::exit(1);
    }
}
