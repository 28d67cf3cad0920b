use microhub_core::bootstrap::{BootstrapFlow, BootstrapState};
use microhub_core::remote::{MintedKey, RemoteEndpoint};
use microhub_core::sync::PullOutcome;

use crate::cli::ConnectArgs;
use crate::error::CliError;
use crate::session::{report_pull, Session};

pub async fn run_connect(args: ConnectArgs, session: &Session) -> Result<(), CliError> {
    session.require_online()?;
    if args.wipe && !args.yes {
        return Err(CliError::WipeNotConfirmed);
    }

    let hub = &session.hub;
    let mut flow = hub.bootstrap(&args.url, &args.store)?;
    let state = flow.check().await?.clone();

    let minted = drive_flow(&mut flow, state, &args).await?;
    let Some(authenticated) = flow.into_authenticated() else {
        return Err(CliError::MissingArgument(
            "Connect flow did not complete".to_string(),
        ));
    };

    if let Some(key) = minted {
        println!("Access key: {}", key.as_str());
        println!("Store this key safely; it will not be shown again.");
    }

    let store_id = authenticated.connection.store_id().to_string();
    let outcome = hub.connect(authenticated).await?;
    report_pull(&outcome);
    match outcome {
        PullOutcome::Applied(collections) if !collections.is_empty() => {
            let names = collections
                .iter()
                .map(|collection| collection.label())
                .collect::<Vec<_>>()
                .join(", ");
            println!("Connected to {store_id}; pulled {names}");
        }
        PullOutcome::Disconnected => {}
        _ => println!("Connected to {store_id}"),
    }
    Ok(())
}

/// Walk the connect flow from the checked state using the command-line
/// answers. Returns a key when the remote minted one.
pub async fn drive_flow<R: RemoteEndpoint>(
    flow: &mut BootstrapFlow<'_, R>,
    state: BootstrapState,
    args: &ConnectArgs,
) -> Result<Option<MintedKey>, CliError> {
    match state {
        BootstrapState::NewStore => {
            let name = args.name.as_deref().ok_or_else(|| {
                CliError::MissingArgument(
                    "This store is new; pass --name to create it".to_string(),
                )
            })?;
            Ok(Some(flow.create_store(name).await?))
        }
        BootstrapState::ReturningStore { user_name } if args.wipe => {
            let name = args
                .name
                .clone()
                .or(user_name)
                .ok_or_else(|| {
                    CliError::MissingArgument("Pass --name to re-create the store".to_string())
                })?;
            flow.request_wipe()?;
            Ok(Some(flow.confirm_wipe(&name).await?))
        }
        BootstrapState::ReturningStore { user_name } => {
            let key = args.key.as_deref().ok_or_else(|| {
                let owner = user_name.map_or_else(String::new, |name| format!(" ({name})"));
                CliError::MissingArgument(format!(
                    "This store already exists{owner}; pass --key, or --wipe --yes if the key is lost"
                ))
            })?;
            flow.login(key).await?;
            Ok(None)
        }
        other => Err(CliError::MissingArgument(format!(
            "Unexpected connect state: {}",
            other.label()
        ))),
    }
}

pub async fn run_disconnect(session: &Session) -> Result<(), CliError> {
    if session.hub.connection().await.is_none() {
        println!("Not connected.");
        return Ok(());
    }
    session.hub.disconnect().await?;
    println!("Disconnected");
    Ok(())
}

pub async fn run_pull(session: &Session) -> Result<(), CliError> {
    session.require_online()?;
    let outcome = session.hub.pull().await;
    report_pull(&outcome);
    match outcome {
        PullOutcome::NotConnected => Err(CliError::NotConnected),
        PullOutcome::Applied(collections) => {
            println!("Pulled {} collection(s)", collections.len());
            Ok(())
        }
        _ => Ok(()),
    }
}
