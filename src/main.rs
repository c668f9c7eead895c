use std::process::exit;

fn main() {
    if let Err(err) = stackpick::cli::run() {
        stackpick::ui::output::error(&err);
        exit(1);
    }
}
