use std::path::PathBuf;

use vigil::prelude::*;

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

const DEFAULT_STORE_PATH: &str = "vigil-store.json";

fn store_path(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup("VIGIL_STORE_PATH")
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_STORE_PATH.to_owned())
        .into()
}

/// Auto-login credential, only when both variables are set.
fn credential(lookup: impl Fn(&str) -> Option<String>) -> Option<Credential> {
    let username = lookup("VIGIL_USERNAME").filter(|u| !u.is_empty())?;
    let password = lookup("VIGIL_PASSWORD").filter(|p| !p.is_empty())?;
    Some(Credential::new(username, password))
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// Boots one dashboard "tab" against the real API.
///
/// The durable store is a file, so a token survives between runs. The
/// session store lives only in this process: every run is a fresh browser,
/// which is why a token left by a previous run is wiped at boot.
///
/// `dashboard logout` logs out; anything else (or nothing) boots, then
/// logs in if `VIGIL_USERNAME` and `VIGIL_PASSWORD` are set.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    vigil::init_tracing();

    let client_config = ClientConfig::from_env();
    let path = store_path(env);
    eprintln!(
        "vigil dashboard: api {}, store {}",
        client_config.base_url,
        path.display()
    );

    let transport = HttpAuthTransport::new(client_config.clone())?;
    let dashboard = Dashboard::<HttpAuthTransport>::builder().boot(
        transport,
        FileStore::open(path)?,
        MemoryStore::session(),
        Location::new("/"),
    )?;
    eprintln!(
        "booted: {:?}, at {}",
        dashboard.boot_outcome(),
        dashboard.current()
    );

    if std::env::args().nth(1).as_deref() == Some("logout") {
        let at = dashboard.logout()?;
        eprintln!("logged out, at {at}");
        return Ok(());
    }

    let Some(credential) = credential(env) else {
        eprintln!("set VIGIL_USERNAME and VIGIL_PASSWORD to log in");
        return Ok(());
    };

    match dashboard.login(&credential).await {
        Ok(identity) => {
            eprintln!(
                "logged in as {} (id {}), at {}",
                identity.username,
                identity.id,
                dashboard.current()
            );
            fetch_alerts(&dashboard, client_config).await?;
        }
        Err(e) => match e.auth_failure().map(|f| f.message().to_owned()) {
            Some(reason) => eprintln!("login failed: {reason}"),
            None => return Err(e.into()),
        },
    }

    Ok(())
}

/// One authenticated request, so the bearer token and the 401 path are
/// visible end to end.
async fn fetch_alerts(
    dashboard: &Dashboard<HttpAuthTransport>,
    config: ClientConfig,
) -> Result<(), VigilError> {
    let api = dashboard.api_client(config)?;
    match api.get_json::<serde_json::Value>("/alerts").await {
        Ok(body) => {
            let count = body["alerts"].as_array().map_or(0, Vec::len);
            eprintln!("{count} active alerts");
        }
        Err(ApiError::AuthExpired) => {
            eprintln!("token rejected by the server, now at {}", dashboard.current());
        }
        Err(e) => {
            tracing::warn!(error = %e, "alerts request failed");
            eprintln!("alerts unavailable: {e}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_in(vars: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |k| map.get(k).map(|v| v.to_string())
    }

    #[test]
    fn test_store_path_defaults_to_working_directory() {
        assert_eq!(store_path(lookup_in(&[])), PathBuf::from("vigil-store.json"));
        assert_eq!(
            store_path(lookup_in(&[("VIGIL_STORE_PATH", "/tmp/v.json")])),
            PathBuf::from("/tmp/v.json")
        );
    }

    #[test]
    fn test_credential_requires_both_variables() {
        assert!(credential(lookup_in(&[("VIGIL_USERNAME", "alice")])).is_none());

        let cred = credential(lookup_in(&[
            ("VIGIL_USERNAME", "alice"),
            ("VIGIL_PASSWORD", "pw"),
        ]))
        .unwrap();
        assert_eq!(cred.username, "alice");
    }
}
