//! dropflow configuration
//!
//! Every setting is read once at startup from environment variables (the CLI
//! merges a `.env` file first) and validated in a single pass. The resulting
//! [`Config`] is passed by reference into every component; nothing reads the
//! environment after this point.

pub mod error;

pub use error::*;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default region slug.
pub const DEFAULT_REGION: &str = "sgp1";
/// Default instance display name, also the default lookup tag.
pub const DEFAULT_DROPLET_NAME: &str = "DO-MinecraftServer";
pub const DEFAULT_DROPLET_SIZE: &str = "s-2vcpu-4gb";
pub const DEFAULT_DROPLET_IMAGE: &str = "ubuntu-20-04-x64";
pub const DEFAULT_PROBE_URL: &str = "https://api.digitalocean.com";

/// Fully validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub cloud: CloudSettings,
    pub remote: RemoteSettings,
    pub server: ServerSettings,
    pub timing: Timing,
    /// Endpoint used by the connectivity waiter.
    pub probe_url: String,
}

/// Cloud provider identifiers for the single managed instance.
#[derive(Clone)]
pub struct CloudSettings {
    pub access_token: String,
    pub region: String,
    pub droplet_name: String,
    pub droplet_size: String,
    pub droplet_image: String,
    pub ssh_key_fingerprints: Vec<String>,
    /// Tags applied at creation. The first one is used to find the instance again.
    pub tags: Vec<String>,
    pub volume_name: String,
    pub domain: String,
    pub subdomain: String,
    pub monitoring: bool,
}

impl CloudSettings {
    /// Tag used to list candidate instances.
    pub fn lookup_tag(&self) -> &str {
        self.tags.first().map(String::as_str).unwrap_or(DEFAULT_DROPLET_NAME)
    }

    /// Fully-qualified name of the managed A record.
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.subdomain, self.domain)
    }
}

impl fmt::Debug for CloudSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudSettings")
            .field("access_token", &"<redacted>")
            .field("region", &self.region)
            .field("droplet_name", &self.droplet_name)
            .field("droplet_size", &self.droplet_size)
            .field("droplet_image", &self.droplet_image)
            .field("ssh_key_fingerprints", &self.ssh_key_fingerprints)
            .field("tags", &self.tags)
            .field("volume_name", &self.volume_name)
            .field("domain", &self.domain)
            .field("subdomain", &self.subdomain)
            .field("monitoring", &self.monitoring)
            .finish()
    }
}

/// Remote shell access to the instance.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub username: String,
    pub private_key_path: PathBuf,
}

/// What runs on the instance and where it lives.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub mount_point: String,
    pub start_script: String,
    /// Output file of the detached server process, on the instance.
    pub log_file: String,
    /// Executable path matched against the process table to find the server.
    pub process_path: String,
    pub service_port: u16,
    pub use_swap: bool,
    pub swap_size: String,
}

/// Fixed intervals and optional bounds for every waiting loop.
#[derive(Debug, Clone)]
pub struct Timing {
    pub instance_poll_interval: Duration,
    pub ssh_initial_delay: Duration,
    pub ssh_retry_delay: Duration,
    pub process_poll_interval: Duration,
    pub connectivity_retry_delay: Duration,
    /// Overall deadline for one start/stop call. `None` waits forever.
    pub operation_timeout: Option<Duration>,
    /// Cap on session connect attempts. `None` retries forever.
    pub connect_attempts: Option<u32>,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            instance_poll_interval: Duration::from_secs(5),
            ssh_initial_delay: Duration::from_secs(10),
            ssh_retry_delay: Duration::from_secs(10),
            process_poll_interval: Duration::from_secs(3),
            connectivity_retry_delay: Duration::from_secs(3),
            operation_timeout: None,
            connect_attempts: None,
        }
    }
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut problems = Vec::new();

        let mut required = |key: &str| match get(key) {
            Some(value) => value,
            None => {
                problems.push(format!("{key} is not set"));
                String::new()
            }
        };

        let access_token = required("DO_ACCESS_TOKEN");
        let key_path_raw = required("DO_DROPLET_SSH_ACCESS_KEY");
        let domain = required("DO_NETWORK_DOMAIN");
        let subdomain = required("DO_NETWORK_SUBDOMAIN");
        let volume_name = required("DO_VOLUME_NAME");

        let ssh_key_fingerprints = split_list(get("DO_SSH_KEY_FINGERPRINTS").as_deref());
        if ssh_key_fingerprints.is_empty() {
            problems.push("DO_SSH_KEY_FINGERPRINTS is not set".to_string());
        }

        let mut tags = split_list(get("DO_DROPLET_TAGS").as_deref());
        if tags.is_empty() {
            tags.push(DEFAULT_DROPLET_NAME.to_string());
        }

        let private_key_path = if key_path_raw.is_empty() {
            PathBuf::new()
        } else {
            match expand_home(&key_path_raw) {
                Ok(path) => path,
                Err(e) => {
                    problems.push(e.to_string());
                    PathBuf::new()
                }
            }
        };

        let mount_point = get("DROPFLOW_MOUNT_POINT").unwrap_or_else(|| "/mnt/mc".to_string());
        let start_script =
            get("DROPFLOW_START_SCRIPT").unwrap_or_else(|| format!("{mount_point}/start.sh"));
        let process_path =
            get("DROPFLOW_PROCESS_PATH").unwrap_or_else(|| format!("{mount_point}/jdk/bin/java"));

        let use_swap = parse_or(&get, "DROPFLOW_USE_SWAP", parse_bool, false, &mut problems);
        let service_port = parse_or(
            &get,
            "DROPFLOW_SERVICE_PORT",
            |v| v.parse::<u16>().ok().filter(|p| *p != 0),
            25565,
            &mut problems,
        );
        let operation_timeout = parse_or(
            &get,
            "DROPFLOW_OPERATION_TIMEOUT",
            |v| v.parse::<u64>().ok().filter(|s| *s > 0).map(Some),
            None,
            &mut problems,
        )
        .map(Duration::from_secs);
        let connect_attempts = parse_or(
            &get,
            "DROPFLOW_CONNECT_ATTEMPTS",
            |v| v.parse::<u32>().ok().filter(|n| *n > 0).map(Some),
            None,
            &mut problems,
        );

        if !problems.is_empty() {
            return Err(ConfigError::Invalid(problems));
        }

        Ok(Self {
            cloud: CloudSettings {
                access_token,
                region: get("DO_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
                droplet_name: get("DO_DROPLET_NAME")
                    .unwrap_or_else(|| DEFAULT_DROPLET_NAME.to_string()),
                droplet_size: get("DO_DROPLET_SIZE")
                    .unwrap_or_else(|| DEFAULT_DROPLET_SIZE.to_string()),
                droplet_image: get("DO_DROPLET_IMAGE")
                    .unwrap_or_else(|| DEFAULT_DROPLET_IMAGE.to_string()),
                ssh_key_fingerprints,
                tags,
                volume_name,
                domain,
                subdomain,
                monitoring: true,
            },
            remote: RemoteSettings {
                username: get("DROPFLOW_SSH_USER").unwrap_or_else(|| "root".to_string()),
                private_key_path,
            },
            server: ServerSettings {
                mount_point,
                start_script,
                log_file: get("DROPFLOW_SERVER_LOG")
                    .unwrap_or_else(|| "~/minecraftserver.log".to_string()),
                process_path,
                service_port,
                use_swap,
                swap_size: get("DROPFLOW_SWAP_SIZE").unwrap_or_else(|| "4G".to_string()),
            },
            timing: Timing {
                operation_timeout,
                connect_attempts,
                ..Timing::default()
            },
            probe_url: get("DROPFLOW_PROBE_URL").unwrap_or_else(|| DEFAULT_PROBE_URL.to_string()),
        })
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.cloud;
        writeln!(f, "access token   : <set, {} chars>", c.access_token.len())?;
        writeln!(f, "droplet        : {} ({}, {}, {})", c.droplet_name, c.region, c.droplet_size, c.droplet_image)?;
        writeln!(f, "tags           : {}", c.tags.join(", "))?;
        writeln!(f, "ssh keys       : {}", c.ssh_key_fingerprints.len())?;
        writeln!(f, "volume         : {}", c.volume_name)?;
        writeln!(f, "dns record     : {}", c.fqdn())?;
        writeln!(
            f,
            "ssh access     : {}@<instance> with {}",
            self.remote.username,
            self.remote.private_key_path.display()
        )?;
        writeln!(f, "mount point    : {}", self.server.mount_point)?;
        writeln!(f, "start script   : {}", self.server.start_script)?;
        writeln!(f, "service port   : {}", self.server.service_port)?;
        writeln!(
            f,
            "swap           : {}",
            if self.server.use_swap { self.server.swap_size.as_str() } else { "off" }
        )?;
        match self.timing.operation_timeout {
            Some(t) => write!(f, "timeout        : {}s", t.as_secs()),
            None => write!(f, "timeout        : none"),
        }
    }
}

/// Split a comma separated list, dropping empty items.
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Expand a leading `~` to the current user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    if path == "~" || path.starts_with("~/") {
        let home =
            dirs::home_dir().ok_or_else(|| ConfigError::HomeDirNotFound(path.to_string()))?;
        let rest = path.trim_start_matches('~').trim_start_matches('/');
        Ok(if rest.is_empty() { home } else { home.join(rest) })
    } else {
        Ok(PathBuf::from(path))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<T, G, P>(get: &G, key: &str, parse: P, default: T, problems: &mut Vec<String>) -> T
where
    G: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    match get(key) {
        None => default,
        Some(raw) => parse(&raw).unwrap_or_else(|| {
            problems.push(format!("{key} has an invalid value '{raw}'"));
            default
        }),
    }
}
