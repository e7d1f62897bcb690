//! Test-registry command - check API reachability and runtime login

use helmpack_client::{
    ClientConfig, ContainerRuntime, DockerCli, RegistryApi, RegistryCredentials, registry_host,
};

use crate::display;
use crate::error::{CliError, Result};

pub fn run(
    registry_url: &str,
    user: Option<String>,
    password: Option<String>,
    insecure: bool,
    config: &ClientConfig,
) -> Result<()> {
    let credentials = RegistryCredentials::resolve(user, password)?;
    let host = registry_host(registry_url);

    if insecure {
        display::warning("TLS certificate verification disabled");
    }

    let api = RegistryApi::new(registry_url, credentials.clone(), insecure)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::other(format!("failed to start async runtime: {}", e)))?;

    match runtime.block_on(api.system_info()) {
        Ok(info) => {
            display::success("Registry API connection successful");
            println!(
                "  Version: {}",
                info.harbor_version.as_deref().unwrap_or("Unknown")
            );
            println!(
                "  Registry URL: {}",
                info.registry_url.as_deref().unwrap_or("Unknown")
            );
        }
        Err(e) => {
            display::failure(&format!("Registry API connection failed: {}", e));
            if e.is_tls() && !insecure {
                display::hint("retry with --insecure to skip certificate verification");
            }
            return Err(e.into());
        }
    }

    let docker = DockerCli::new(&config.docker_binary);
    match docker.login(&host, &credentials) {
        Ok(()) => {
            display::success("Container runtime login successful");
            if insecure {
                display::hint(&format!(
                    "the runtime must trust {} too: add it to insecure-registries in /etc/docker/daemon.json or install its CA under /etc/docker/certs.d/{}/ca.crt",
                    host, host
                ));
            }
        }
        Err(e) => {
            display::failure(&format!("Container runtime login failed: {}", e));
            if e.is_tls() {
                display::hint(&format!(
                    "add {{\"insecure-registries\": [\"{}\"]}} to /etc/docker/daemon.json and restart the daemon",
                    host
                ));
            }
            return Err(e.into());
        }
    }

    println!();
    display::success("Registry connectivity test completed");
    Ok(())
}
