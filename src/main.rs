use pbdecrypt::server::{default_fetcher, launch};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // The blocking HTTP client has to be built outside the server runtime.
    let fetcher = default_fetcher()?;
    rocket::execute(launch(fetcher))
}
