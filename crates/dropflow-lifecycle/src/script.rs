//! Remote bootstrap steps run over the session during `start`.

use dropflow_config::ServerSettings;

/// What a failed step does to the rest of the start sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    Abort,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: &'static str,
    pub command: String,
    pub on_failure: OnFailure,
}

impl Step {
    fn new(name: &'static str, command: String, on_failure: OnFailure) -> Self {
        Self {
            name,
            command,
            on_failure,
        }
    }
}

/// Device path under which the provider exposes a named volume.
pub fn volume_device(volume_name: &str) -> String {
    format!("/dev/disk/by-id/scsi-0DO_Volume_{}", volume_name)
}

/// Ordered bootstrap sequence: mount, optional swap, launch, firewall rules,
/// firewall enable.
pub fn bootstrap_steps(server: &ServerSettings, volume_name: &str) -> Vec<Step> {
    let mut steps = vec![Step::new(
        "mount volume",
        format!(
            "mkdir -p {mount} && mount -o discard,defaults,noatime {device} {mount}",
            mount = server.mount_point,
            device = volume_device(volume_name),
        ),
        OnFailure::Abort,
    )];

    if server.use_swap {
        steps.push(Step::new(
            "provision swap",
            format!(
                "fallocate -l {} /swapfile && chmod 600 /swapfile && mkswap /swapfile && swapon /swapfile && sysctl vm.swappiness=10",
                server.swap_size
            ),
            OnFailure::Warn,
        ));
    }

    steps.push(Step::new(
        "launch server",
        format!(
            "nohup {} > {} 2>&1 < /dev/null &",
            server.start_script, server.log_file
        ),
        OnFailure::Abort,
    ));
    steps.push(Step::new(
        "allow firewall ports",
        format!(
            "ufw allow OpenSSH && ufw allow {port}/tcp && ufw allow {port}/udp",
            port = server.service_port
        ),
        OnFailure::Abort,
    ));
    steps.push(Step::new(
        "enable firewall",
        "ufw --force enable".to_string(),
        OnFailure::Warn,
    ));

    steps
}

/// Prints the PIDs whose executable is exactly `process_path`, one per line.
pub fn find_pids_command(process_path: &str) -> String {
    format!(
        "ps -eo pid=,args= | awk '$2==\"{}\" {{print $1}}'",
        process_path
    )
}

pub fn terminate_command(pids: &[u32]) -> String {
    let list: Vec<String> = pids.iter().map(u32::to_string).collect();
    format!("kill -15 {}", list.join(" "))
}

/// Parse the output of [`find_pids_command`], ignoring noise.
pub fn parse_pids(stdout: &str) -> Vec<u32> {
    stdout
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect()
}
