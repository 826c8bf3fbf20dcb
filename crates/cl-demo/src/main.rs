use cl_demo::{info, report, session, ClError, Config};
use env_logger::Env;

fn run() -> Result<(), ClError> {
    let config = Config::from_env()?;
    log::debug!("config: {config:?}");

    // 1. Plattformen & Geräte auflisten
    info::print_platform_and_dev_info()?;

    // 2. Session: erzeugen, ausführen, abbauen
    session::run(&config)?;

    println!("Shut down cleanly");
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    if let Err(err) = run() {
        report::fail(&err);
    }
}
