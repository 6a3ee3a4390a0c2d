// Process configuration, loaded from environment variables and CLI flags.
// Game rules are compile-time constants in `engine::config`.

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address to bind the HTTP server to.
    pub bind_addr: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment and arguments.
    ///
    /// Environment variables:
    /// - `BIND_ADDR` - interface to listen on (default: `0.0.0.0`)
    /// - `PORT` - HTTP server port (default: 8080)
    /// - `LOG_FORMAT` - `json` for JSON log lines, anything else for compact text
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Build a config from explicit arguments and an environment lookup.
    pub fn from_sources(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let bind_addr = env("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string());

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| env("PORT").and_then(|v| v.parse().ok()))
            .unwrap_or(8080);

        let log_format = match env("LOG_FORMAT").as_deref() {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };

        Config {
            bind_addr,
            port,
            log_format,
        }
    }

    /// `host:port` string for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| match pair {
            [name, value] if name == flag => Some(value.clone()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_sources(&args(&["land-backend"]), env_of(&[]));
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Compact);
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_sources(
            &args(&["land-backend"]),
            env_of(&[("PORT", "9000"), ("BIND_ADDR", "127.0.0.1"), ("LOG_FORMAT", "JSON")]),
        );
        assert_eq!(config.listen_addr(), "127.0.0.1:9000");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_cli_port_beats_env() {
        let config = Config::from_sources(
            &args(&["land-backend", "--port", "7000"]),
            env_of(&[("PORT", "9000")]),
        );
        assert_eq!(config.port, 7000);
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = Config::from_sources(
            &args(&["land-backend", "--port", "nope"]),
            env_of(&[("PORT", "also-nope")]),
        );
        assert_eq!(config.port, 8080);
    }
}
