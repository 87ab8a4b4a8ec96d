mod application;
mod presentation;

fn main() {
    env_logger::init();
    std::process::exit(application::run());
}
