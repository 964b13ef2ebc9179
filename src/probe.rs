use crate::auth::SessionAuthenticator;
use crate::config::Config;
use crate::console::run_interactive;
use crate::error::{ProbeError, RunError};
use crate::ws::{ProbeObserver, ProbeOptions, ProbeReport, ProbeSession};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Log in, run the configured scenario on one connection, then log out if
/// asked to.
///
/// Logout runs whether or not the scenario succeeded. A scenario error wins
/// over a logout error.
pub async fn run_probe<O>(
    config: &Config,
    observer: &mut O,
    shutdown: CancellationToken,
) -> Result<ProbeReport, RunError>
where
    O: ProbeObserver + ?Sized,
{
    let authenticator = SessionAuthenticator::new(config).map_err(RunError::Login)?;
    let token = authenticator
        .login(&config.credential())
        .await
        .map_err(RunError::Login)?;
    observer.on_login(&token);

    let mut session = ProbeSession::connect(&config.chat_url, &token, ProbeOptions::from(config))
        .await
        .map_err(RunError::Connect)?;

    let outcome = run_scenario(&mut session, config, observer, shutdown)
        .await
        .map_err(|source| RunError::Scenario {
            scenario: config.scenario.as_str(),
            source,
        });

    match &outcome {
        Ok(report) => info!(
            scenario=%config.scenario,
            sent=report.sent,
            received=report.received,
            closed_by_peer=report.closed_by_peer,
            "Probe finished"
        ),
        Err(e) => warn!(error=%e, "Probe failed"),
    }

    if !config.logout_on_exit {
        return outcome;
    }

    match (outcome, authenticator.logout(&token).await) {
        (outcome, Ok(())) => outcome,
        (Ok(_), Err(e)) => Err(RunError::Logout(e)),
        (Err(scenario_error), Err(e)) => {
            warn!(error=%e, "Logout after failed scenario also failed");
            Err(scenario_error)
        }
    }
}

async fn run_scenario<O>(
    session: &mut ProbeSession,
    config: &Config,
    observer: &mut O,
    shutdown: CancellationToken,
) -> Result<ProbeReport, ProbeError>
where
    O: ProbeObserver + ?Sized,
{
    if config.scenario.is_interactive() {
        let chatroom_id = config.chatroom_id.unwrap_or_else(Uuid::nil);
        return run_interactive(session, chatroom_id, observer, shutdown).await;
    }

    for command in config.scenario.opening_commands(config) {
        session.send(command, observer).await?;
    }
    session.run_until_closed(observer, shutdown).await
}
