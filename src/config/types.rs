use std::collections::HashMap;

// --- Defaults ---
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SERVER_NAME: &str = "_";
pub const DEFAULT_MAX_BODY_SIZE: usize = 1_048_576; // 1MB
pub const DEFAULT_ROUTE_PATH: &str = "/";
pub const DEFAULT_ROOT: &str = "./www";
pub const DEFAULT_FILE: &str = "index.html";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub servers: Vec<ServerConfig>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub ports: Vec<u16>,
    pub server_name: String,
    pub client_max_body_size: usize,
    pub error_pages: HashMap<u16, String>,
    pub routes: Vec<RouteConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            ports: vec![DEFAULT_PORT],
            server_name: DEFAULT_SERVER_NAME.to_string(),
            client_max_body_size: DEFAULT_MAX_BODY_SIZE,
            error_pages: HashMap::new(),
            routes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteConfig {
    pub path: String,
    pub methods: Vec<String>,
    pub root: String,
    pub default_file: String,
    pub autoindex: bool,
    pub upload_dir: Option<String>,
    pub cgi: HashMap<String, String>,
    pub redirect: Option<(u16, String)>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_ROUTE_PATH.to_string(),
            methods: vec!["GET".to_string(), "HEAD".to_string()],
            root: DEFAULT_ROOT.to_string(),
            default_file: DEFAULT_FILE.to_string(),
            autoindex: false,
            upload_dir: None,
            cgi: HashMap::new(),
            redirect: None,
        }
    }
}

impl ServerConfig {
    /// Longest-prefix-match over `routes`; among routes tied on prefix length,
    /// the one declared first wins. Returns `None` if nothing matches.
    pub fn find_route(&self, path: &str) -> Option<&RouteConfig> {
        let mut best: Option<(usize, &RouteConfig)> = None;
        for route in self.routes.iter() {
            if !path.starts_with(route.path.as_str()) {
                continue;
            }
            let len = route.path.len();
            match best {
                Some((best_len, _)) if len <= best_len => {}
                _ => best = Some((len, route)),
            }
        }
        best.map(|(_, r)| r)
    }
}
