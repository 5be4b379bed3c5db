use serde::{Deserialize, Serialize};

/// Default value for `EULA` when a request omits it. The image refuses to
/// boot without an accepted EULA.
pub const DEFAULT_EULA: &str = "true";

fn default_eula() -> Option<String> {
    Some(DEFAULT_EULA.to_string())
}

/// Semantic type of a configurable field, as seen by the environment renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Flag,
    List,
}

/// Rendering of a field value into an environment variable value.
pub trait EnvValue {
    const KIND: FieldKind;

    /// `None` means the value contributes no environment entry.
    fn render(&self) -> Option<String>;
}

impl EnvValue for String {
    const KIND: FieldKind = FieldKind::Text;

    fn render(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl EnvValue for i64 {
    const KIND: FieldKind = FieldKind::Integer;

    fn render(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl EnvValue for u16 {
    const KIND: FieldKind = FieldKind::Integer;

    fn render(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl EnvValue for bool {
    const KIND: FieldKind = FieldKind::Flag;

    fn render(&self) -> Option<String> {
        Some(if *self { "true" } else { "false" }.to_string())
    }
}

impl EnvValue for Vec<String> {
    const KIND: FieldKind = FieldKind::List;

    fn render(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.join("\n"))
        }
    }
}

/// One row of the static field table backing [`ServerConfig`].
#[derive(Clone, Copy)]
pub struct FieldSpec {
    /// Rust field name on [`ServerConfig`]
    pub name: &'static str,
    pub kind: FieldKind,
    pub env_key: &'static str,
    value: fn(&ServerConfig) -> Option<String>,
}

impl FieldSpec {
    /// Rendered value of this field, or `None` when it is absent.
    pub fn value(&self, config: &ServerConfig) -> Option<String> {
        (self.value)(config)
    }
}

impl std::fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("env_key", &self.env_key)
            .finish()
    }
}

/// Declares `ServerConfig` and `SERVER_FIELDS` from one list so the struct and
/// its environment table cannot drift apart.
macro_rules! server_config {
    ($( $(#[$attr:meta])* $field:ident : $ty:ty => $key:literal, )*) => {
        /// Requested game server. Only `server_name` is mandatory; every other
        /// field maps to one environment variable of the server image.
        #[derive(Debug, Clone, Default, PartialEq, Deserialize)]
        pub struct ServerConfig {
            /// Container name and data directory name
            #[serde(alias = "name")]
            pub server_name: String,
            /// Host port bound to the game port
            #[serde(default)]
            pub port: Option<u16>,
            $(
                $(#[$attr])*
                pub $field: Option<$ty>,
            )*
        }

        /// Environment table, in declaration order.
        pub static SERVER_FIELDS: &[FieldSpec] = &[
            $(
                FieldSpec {
                    name: stringify!($field),
                    kind: <$ty as EnvValue>::KIND,
                    env_key: $key,
                    value: |config: &ServerConfig| config.$field.as_ref().and_then(|v| v.render()),
                },
            )*
        ];
    };
}

server_config! {
    version: String => "VERSION",
    #[serde(default = "default_eula")]
    eula: String => "EULA",
    difficulty: String => "DIFFICULTY",
    #[serde(rename = "type")]
    server_type: String => "TYPE",
    spiget_resources: String => "SPIGET_RESOURCES",
    mods: Vec<String> => "MODS",
    ops: String => "OPS",
    online_mode: String => "ONLINE_MODE",
    enable_autopause: String => "ENABLE_AUTOPAUSE",
    memory: String => "MEMORY",
    view_distance: i64 => "VIEW_DISTANCE",
    max_players: i64 => "MAX_PLAYERS",
    whitelist: String => "WHITELIST",
    mods_files: String => "MODS_FILES",
    world: String => "WORLD",
    uid: i64 => "UID",
    gid: i64 => "GID",
    init_memory: String => "INIT_MEMORY",
    max_memory: String => "MAX_MEMORY",
    tz: String => "TZ",
    enable_rolling_logs: bool => "ENABLE_ROLLING_LOGS",
    enable_jmx: bool => "ENABLE_JMX",
    jmx_host: String => "JMX_HOST",
    use_aikar_flags: bool => "USE_AIKAR_FLAGS",
    jvm_opts: String => "JVM_OPTS",
    jvm_xx_opts: String => "JVM_XX_OPTS",
    jvm_dd_opts: String => "JVM_DD_OPTS",
    extra_args: String => "EXTRA_ARGS",
    log_timestamp: bool => "LOG_TIMESTAMP",
    motd: String => "MOTD",
    icon: String => "ICON",
    rcon_password: String => "RCON_PASSWORD",
    rcon_port: u16 => "RCON_PORT",
    enable_rcon: bool => "ENABLE_RCON",
    enable_whitelist: bool => "ENABLE_WHITELIST",
    enforce_whitelist: bool => "ENFORCE_WHITELIST",
    broadcast_rcon_to_ops: bool => "BROADCAST_RCON_TO_OPS",
    enable_query: bool => "ENABLE_QUERY",
    query_port: u16 => "QUERY_PORT",
    level_seed: String => "LEVEL_SEED",
    generator_settings: String => "GENERATOR_SETTINGS",
    level_type: String => "LEVEL_TYPE",
    level: String => "LEVEL",
    pvp: bool => "PVP",
    hardcore: bool => "HARDCORE",
    allow_flight: bool => "ALLOW_FLIGHT",
    max_build_height: i64 => "MAX_BUILD_HEIGHT",
    force_gamemode: bool => "FORCE_GAMEMODE",
    max_tick_time: i64 => "MAX_TICK_TIME",
    max_world_size: i64 => "MAX_WORLD_SIZE",
    spawn_npcs: bool => "SPAWN_NPCS",
    spawn_animals: bool => "SPAWN_ANIMALS",
    spawn_monsters: bool => "SPAWN_MONSTERS",
    spawn_protection: i64 => "SPAWN_PROTECTION",
    function_permission_level: i64 => "FUNCTION_PERMISSION_LEVEL",
    network_compression_threshold: i64 => "NETWORK_COMPRESSION_THRESHOLD",
    player_idle_timeout: i64 => "PLAYER_IDLE_TIMEOUT",
    rate_limit: i64 => "RATE_LIMIT",
    enable_status: bool => "ENABLE_STATUS",
    sync_chunk_writes: bool => "SYNC_CHUNK_WRITES",
    text_filtering_config: String => "TEXT_FILTERING_CONFIG",
    use_native_transport: bool => "USE_NATIVE_TRANSPORT",
    prevent_proxy_connections: bool => "PREVENT_PROXY_CONNECTIONS",
    enable_jmx_monitoring: bool => "ENABLE_JMX_MONITORING",
    resource_pack: String => "RESOURCE_PACK",
    resource_pack_sha1: String => "RESOURCE_PACK_SHA1",
    resource_pack_prompt: String => "RESOURCE_PACK_PROMPT",
    resource_pack_required: bool => "RESOURCE_PACK_REQUIRED",
    snooper_enabled: bool => "SNOOPER_ENABLED",
    entity_broadcast_range_percentage: i64 => "ENTITY_BROADCAST_RANGE_PERCENTAGE",
    simulation_distance: i64 => "SIMULATION_DISTANCE",
    hide_online_players: bool => "HIDE_ONLINE_PLAYERS",
    broadcast_console_to_ops: bool => "BROADCAST_CONSOLE_TO_OPS",
    enable_command_block: bool => "ENABLE_COMMAND_BLOCK",
    op_permission_level: i64 => "OP_PERMISSION_LEVEL",
    allow_nether: bool => "ALLOW_NETHER",
}

impl ServerConfig {
    /// A config with only the name set, plus the same `eula` default a JSON
    /// request without that field gets.
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            eula: default_eula(),
            ..Default::default()
        }
    }
}

/// A server as currently observed through the container runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub name: String,
    pub id: String,
    pub status: String,
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_env_keys_are_upper_cased_field_names() {
        for field in SERVER_FIELDS {
            let expected = match field.name {
                "server_type" => "TYPE".to_string(),
                name => name.to_ascii_uppercase(),
            };
            assert_eq!(field.env_key, expected, "field {}", field.name);
        }
    }

    #[test]
    fn test_env_keys_unique() {
        let keys: HashSet<_> = SERVER_FIELDS.iter().map(|f| f.env_key).collect();
        assert_eq!(keys.len(), SERVER_FIELDS.len());
        assert!(!keys.contains("SERVER_NAME"));
        assert!(!keys.contains("PORT"));
    }

    #[test]
    fn test_field_kinds() {
        let kind_of = |name: &str| {
            SERVER_FIELDS
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.kind)
        };
        assert_eq!(kind_of("mods"), Some(FieldKind::List));
        assert_eq!(kind_of("pvp"), Some(FieldKind::Flag));
        assert_eq!(kind_of("max_players"), Some(FieldKind::Integer));
        assert_eq!(kind_of("motd"), Some(FieldKind::Text));
    }

    #[test]
    fn test_deserialize_minimal_request() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"server_name": "lobby"}"#).unwrap();
        assert_eq!(config.server_name, "lobby");
        assert_eq!(config.port, None);
        assert_eq!(config.eula.as_deref(), Some(DEFAULT_EULA));
        assert_eq!(config.version, None);
        assert_eq!(config, ServerConfig::new("lobby"));
    }

    #[test]
    fn test_deserialize_name_alias_and_type() {
        let config: ServerConfig = serde_json::from_value(serde_json::json!({
            "name": "modded",
            "type": "FORGE",
            "eula": null,
            "pvp": false,
            "mods": ["a.jar"]
        }))
        .unwrap();
        assert_eq!(config.server_name, "modded");
        assert_eq!(config.server_type.as_deref(), Some("FORGE"));
        assert_eq!(config.eula, None);
        assert_eq!(config.pvp, Some(false));
        assert_eq!(config.mods, Some(vec!["a.jar".to_string()]));
    }

    #[test]
    fn test_value_follows_field() {
        let mut config = ServerConfig::new("s");
        let motd = SERVER_FIELDS.iter().find(|f| f.name == "motd").unwrap();
        assert_eq!(motd.value(&config), None);
        config.motd = Some("hello".to_string());
        assert_eq!(motd.value(&config).as_deref(), Some("hello"));
    }

    #[test]
    fn test_empty_mod_list_renders_nothing() {
        assert_eq!(Vec::<String>::new().render(), None);
        assert_eq!(
            vec!["a.jar".to_string(), "b.jar".to_string()].render().as_deref(),
            Some("a.jar\nb.jar")
        );
    }
}
