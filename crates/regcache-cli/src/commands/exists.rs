use super::print_json;
use miette::{IntoDiagnostic, Result};
use regcache_core::manifest::{check_remote, FanoutSync, RegistryError};
use regcache_core::{Config, UplinkConfig};
use serde::Serialize;

#[derive(Serialize)]
struct ExistsResult<'a> {
    name: &'a str,
    available: bool,
    uplinks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Run the exists command.
///
/// Uplinks given on the command line are queried after the configured ones.
/// Fails with the registry error when the name is taken or an uplink is down.
/// In JSON mode the error is written to stdout and the process exits with 1.
pub fn run(
    config: &Config,
    name: &str,
    urls: &[String],
    allow_offline: bool,
    json: bool,
) -> Result<()> {
    let mut config = config.clone();
    let first = config.uplinks.len();
    for (index, url) in urls.iter().enumerate() {
        config = config.with_uplink(UplinkConfig::new(
            format!("uplink{}", first + index),
            url.clone(),
        ));
    }
    let allow_offline = allow_offline || config.allow_offline_publish;

    let sync = FanoutSync::from_config(&config).into_diagnostic()?;

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let checked = runtime.block_on(check_remote(name, allow_offline, &sync));

    if json {
        let result = ExistsResult {
            name,
            available: checked.is_ok(),
            uplinks: config.uplinks.len(),
            code: checked.as_ref().err().map(RegistryError::code),
            error: checked.as_ref().err().map(|e| e.message().to_string()),
        };
        print_json(&result)?;
        if checked.is_err() {
            std::process::exit(1);
        }
        Ok(())
    } else if let Err(e) = checked {
        Err(e).into_diagnostic()
    } else {
        println!(
            "ok: {name} is not known to any of {} uplink(s)",
            config.uplinks.len()
        );
        Ok(())
    }
}
