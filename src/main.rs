use proxy_log::info;
use server_proxy::config::{self, display};
use server_proxy::error::Result;
use server_proxy::server::Server;
use server_proxy::signal;

const DEFAULT_CONFIG_PATH: &str = "config/webserv.conf";

fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let app_config = config::load(std::path::Path::new(&config_path))?;
    display::display_config(&app_config.servers);

    signal::install();

    let mut server = Server::new(&app_config)?;
    info!("server started, pid {}", std::process::id());

    server.run()?;

    info!("shutdown requested, exiting cleanly");
    Ok(())
}
