use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

const DEFAULT_LISTEN_PORT: u16 = 8080;
const DEFAULT_PUBLIC_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:9090";
const DEFAULT_SEND_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REDIS_KEY_PREFIX: &str = "voip";
const DEFAULT_APP_BUNDLE_ID: &str = "com.example.voip_cross_platform";

#[derive(Debug, Clone)]
pub struct DispatchServerConfig {
    pub listen_addr: SocketAddr,
    pub public_base_url: String,
    /// When unset the server falls back to the in-memory token
    /// directory (local dev only; tokens do not survive a restart).
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    pub gateway_url: String,
    pub gateway_api_key: Option<String>,
    /// Transport-level timeout for a single gateway send. A timed-out
    /// platform is reported as a per-platform failure.
    pub send_timeout: Duration,
    /// Bundle identity used to derive the APNs voip topic.
    pub app_bundle_id: String,
}

impl DispatchServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let listen_port = env::var("DISPATCH_PORT")
            .ok()
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(DEFAULT_LISTEN_PORT);

        let listen_addr = env::var("DISPATCH_ADDR")
            .ok()
            .and_then(|raw| raw.parse::<IpAddr>().ok())
            .map(|ip| SocketAddr::new(ip, listen_port))
            .unwrap_or(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), listen_port));

        let public_base_url =
            env::var("DISPATCH_PUBLIC_URL").unwrap_or_else(|_| DEFAULT_PUBLIC_URL.to_string());

        let redis_url = env::var("DISPATCH_REDIS_URL").ok().filter(|raw| !raw.is_empty());

        // Namespace all keys so Redis ACLs can be scoped safely
        let redis_key_prefix = env::var("DISPATCH_REDIS_KEY_PREFIX")
            .unwrap_or_else(|_| DEFAULT_REDIS_KEY_PREFIX.to_string());

        let gateway_url =
            env::var("DISPATCH_GATEWAY_URL").unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string());

        let gateway_api_key = env::var("DISPATCH_GATEWAY_API_KEY")
            .ok()
            .filter(|raw| !raw.is_empty());

        let send_timeout = env::var("DISPATCH_SEND_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS));

        let app_bundle_id =
            env::var("DISPATCH_APP_BUNDLE_ID").unwrap_or_else(|_| DEFAULT_APP_BUNDLE_ID.to_string());

        Ok(Self {
            listen_addr,
            public_base_url,
            redis_url,
            redis_key_prefix,
            gateway_url,
            gateway_api_key,
            send_timeout,
            app_bundle_id,
        })
    }
}

impl Default for DispatchServerConfig {
    fn default() -> Self {
        Self::from_env().unwrap_or_else(|_| Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_LISTEN_PORT),
            public_base_url: DEFAULT_PUBLIC_URL.to_string(),
            redis_url: None,
            redis_key_prefix: DEFAULT_REDIS_KEY_PREFIX.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            gateway_api_key: None,
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
            app_bundle_id: DEFAULT_APP_BUNDLE_ID.to_string(),
        })
    }
}
