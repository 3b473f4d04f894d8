/// Runtime settings, read from environment variables with defaults
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the HTTP server listens on (`BIND_ADDR`)
    pub bind_addr: String,
    /// Postgres connection string; in-memory room records when unset (`DATABASE_URL`)
    pub database_url: Option<String>,
    /// Capacity of every event bus channel (`EVENT_BUS_CAPACITY`)
    pub event_bus_capacity: usize,
    /// Whether the channel backend updates visibility in place
    /// (`PRESENCE_ATOMIC_VISIBILITY`)
    pub atomic_visibility: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            database_url: None,
            event_bus_capacity: 1000,
            atomic_visibility: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup. Unparseable
    /// values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            event_bus_capacity: lookup("EVENT_BUS_CAPACITY")
                .and_then(|s| s.parse().ok())
                // broadcast channels need a non-zero capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.event_bus_capacity),
            atomic_visibility: lookup("PRESENCE_ATOMIC_VISIBILITY")
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.atomic_visibility),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
