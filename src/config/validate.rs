use std::collections::{HashMap, HashSet};

use crate::config::types::ServerConfig;

/// Cross-server validation. Since virtual-host-by-`server_name` selection is
/// out of scope, every `(host, port)` pair must resolve to exactly one
/// `ServerConfig` — there is no name-based disambiguation at request time.
pub fn validate_configs(configs: Vec<ServerConfig>) -> Vec<ServerConfig> {
    let mut dropped = HashSet::new();

    let mut usage_map: HashMap<(String, u16), Vec<usize>> = HashMap::new();
    for (idx, config) in configs.iter().enumerate() {
        for port in &config.ports {
            usage_map.entry((config.host.clone(), *port)).or_default().push(idx);
        }
    }

    for ((host, port), indices) in &usage_map {
        if indices.len() > 1 {
            println!(
                "\x1b[1;31mConflict:\x1b[0m multiple server blocks bind {}:{}. Dropping all of them.",
                host, port
            );
            dropped.extend(indices.iter().copied());
        }
    }

    let mut port_hosts: HashMap<u16, HashSet<String>> = HashMap::new();
    for config in &configs {
        for port in &config.ports {
            port_hosts.entry(*port).or_default().insert(config.host.clone());
        }
    }
    for (port, hosts) in &port_hosts {
        if hosts.contains("0.0.0.0") && hosts.len() > 1 {
            println!(
                "\x1b[1;31mBind conflict:\x1b[0m port {} mixes wildcard '0.0.0.0' with specific addresses {:?}.",
                port, hosts
            );
            for (idx, config) in configs.iter().enumerate() {
                if config.ports.contains(port) {
                    dropped.insert(idx);
                }
            }
        }
    }

    for (idx, config) in configs.iter().enumerate() {
        let mut valid = true;

        for (code, path) in &config.error_pages {
            if *code < 100 || *code > 599 {
                println!(
                    "\x1b[1;31mInvalid status code:\x1b[0m server '{}' error_page code {} out of range.",
                    config.server_name, code
                );
                valid = false;
            }
            if std::fs::File::open(path).is_err() {
                println!(
                    "\x1b[1;31mFile error:\x1b[0m server '{}' error page '{}' for code {} does not exist.",
                    config.server_name, path, code
                );
                valid = false;
            }
        }

        for route in &config.routes {
            if std::fs::read_dir(&route.root).is_err() {
                println!(
                    "\x1b[1;31mDirectory error:\x1b[0m server '{}' route '{}' root '{}' does not exist.",
                    config.server_name, route.path, route.root
                );
                valid = false;
            }
        }

        if !valid {
            dropped.insert(idx);
        }
    }

    let kept: Vec<ServerConfig> = configs
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !dropped.contains(idx))
        .map(|(_, c)| c)
        .collect();

    if !dropped.is_empty() {
        println!("\x1b[33mResult:\x1b[0m {} server block(s) dropped due to conflicts or invalid paths.", dropped.len());
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(host: &str, ports: Vec<u16>, name: &str) -> ServerConfig {
        let mut c = ServerConfig::default();
        c.host = host.to_string();
        c.ports = ports;
        c.server_name = name.to_string();
        c
    }

    #[test]
    fn no_conflicts_keeps_all() {
        let configs = vec![
            make_config("127.0.0.1", vec![8001], "s1"),
            make_config("127.0.0.1", vec![8002], "s2"),
        ];
        assert_eq!(validate_configs(configs).len(), 2);
    }

    #[test]
    fn same_host_port_is_a_conflict_even_with_different_names() {
        // server_name no longer disambiguates at request time.
        let configs = vec![
            make_config("127.0.0.1", vec![8080], "example.com"),
            make_config("127.0.0.1", vec![8080], "api.example.com"),
        ];
        assert_eq!(validate_configs(configs).len(), 0);
    }

    #[test]
    fn partial_port_overlap_drops_both_blocks() {
        let configs = vec![
            make_config("127.0.0.1", vec![80, 81], "foo"),
            make_config("127.0.0.1", vec![80], "foo"),
        ];
        assert_eq!(validate_configs(configs).len(), 0);
    }

    #[test]
    fn wildcard_conflicts_with_specific_host() {
        let configs = vec![
            make_config("0.0.0.0", vec![8080], "s1"),
            make_config("127.0.0.1", vec![8080], "s2"),
        ];
        assert_eq!(validate_configs(configs).len(), 0);
    }

    #[test]
    fn invalid_status_code_drops_block() {
        let mut config = make_config("127.0.0.1", vec![8080], "s1");
        config.error_pages.insert(99, "exists".to_string());
        assert_eq!(validate_configs(vec![config]).len(), 0);
    }

    #[test]
    fn missing_error_page_file_drops_block() {
        let mut config = make_config("127.0.0.1", vec![8080], "s1");
        config.error_pages.insert(404, "/non/existent/path/err.html".to_string());
        assert_eq!(validate_configs(vec![config]).len(), 0);
    }

    #[test]
    fn missing_route_root_drops_block() {
        use crate::config::types::RouteConfig;
        let mut config = make_config("127.0.0.1", vec![8080], "s1");
        let mut route = RouteConfig::default();
        route.root = "/non/existent/dir".to_string();
        config.routes.push(route);
        assert_eq!(validate_configs(vec![config]).len(), 0);
    }

    #[test]
    fn valid_paths_are_kept() {
        use crate::config::types::RouteConfig;
        let temp_dir = std::env::temp_dir();
        let file_path = temp_dir.join("webserv_test_err.html");
        std::fs::write(&file_path, "error").unwrap();

        let mut config = make_config("127.0.0.1", vec![8080], "s1");
        config.error_pages.insert(404, file_path.to_str().unwrap().to_string());

        let mut route = RouteConfig::default();
        route.root = temp_dir.to_str().unwrap().to_string();
        config.routes.push(route);

        assert_eq!(validate_configs(vec![config]).len(), 1);
        let _ = std::fs::remove_file(file_path);
    }
}
