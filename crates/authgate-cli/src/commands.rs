//! Each command mounts the session cached on disk, acts on it and reports
//! the outcome on stdout

use std::{process::ExitCode, time::Duration};

use anyhow::Context as _;
use authgate_client_core::{
    storage::FileStorage, Client, ClientSettings, PermissionGate, RouteDecision, RouteGuard,
    Session, SessionHandle, SessionProvider, SessionStatus,
};
use authgate_shared::req_args::LoginReqArgs;
use tracing::info;

use crate::{
    background_worker::create_runtime,
    cli::{CheckArgs, Command, LoginArgs},
};

const LOGOUT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

#[tracing::instrument(skip(settings))]
pub fn run(command: Command, settings: &ClientSettings) -> anyhow::Result<ExitCode> {
    let storage = FileStorage::new(settings.storage_file());
    let provider = SessionProvider::mount(SessionHandle::new(storage));
    let session = provider.handle();

    match command {
        Command::Status => {
            for line in describe_session(&session.session()) {
                println!("{line}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Login(args) => login(args, settings, session),
        Command::Logout => logout(settings, session),
        Command::Whoami => match session.user() {
            Some(user) => {
                let json =
                    serde_json::to_string_pretty(&user).context("failed to convert user to json")?;
                println!("{json}");
                Ok(ExitCode::SUCCESS)
            }
            None => {
                println!("Not logged in");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Check(args) => {
            let guard = route_guard(args, settings);
            let decision = session.decide(&guard);
            println!("{}", describe_decision(&decision));
            Ok(if decision == RouteDecision::Render {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Health => health(settings, session),
    }
}

fn login(
    args: LoginArgs,
    settings: &ClientSettings,
    session: &SessionHandle,
) -> anyhow::Result<ExitCode> {
    let LoginArgs {
        username,
        password,
        tenant,
    } = args;
    let rt = create_runtime()?;
    let _enter = rt.enter();
    let client = Client::from_settings(settings, session.clone());

    let rx = client.login(LoginReqArgs::new(username, password).tenant_id(tenant), || {});
    let outcome = rt
        .block_on(rx)
        .context("login finished without reporting an outcome")?;

    match outcome {
        Ok(()) => {
            let name = session
                .user()
                .map(|x| x.display_name().to_string())
                .unwrap_or_default();
            println!("Logged in as {name}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            info!(?e, "login rejected");
            println!("Login failed: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn logout(settings: &ClientSettings, session: &SessionHandle) -> anyhow::Result<ExitCode> {
    if !session.is_authenticated() {
        println!("Not logged in");
        return Ok(ExitCode::SUCCESS);
    }
    let rt = create_runtime()?;
    let _enter = rt.enter();
    let rx = Client::from_settings(settings, session.clone()).logout();
    let outcome = rt.block_on(tokio::time::timeout(LOGOUT_NOTIFY_TIMEOUT, rx));
    // Succeeds whatever the backend says, the local session is already gone
    match outcome {
        Ok(Ok(Ok(()))) => println!("Logged out"),
        Ok(Ok(Err(e))) => {
            info!(?e, "backend rejected logout");
            println!("Logged out locally, backend answered: {e}");
        }
        Ok(Err(_)) => println!("Logged out locally, backend notification was dropped"),
        Err(_) => println!(
            "Logged out locally, backend did not answer within {}s",
            LOGOUT_NOTIFY_TIMEOUT.as_secs()
        ),
    }
    Ok(ExitCode::SUCCESS)
}

fn health(settings: &ClientSettings, session: &SessionHandle) -> anyhow::Result<ExitCode> {
    let rt = create_runtime()?;
    let _enter = rt.enter();
    let rx = Client::from_settings(settings, session.clone()).health_check(|| {});
    let outcome = rt
        .block_on(rx)
        .context("health check finished without reporting an outcome")?;
    match outcome {
        Ok(()) => {
            println!("{} is up", settings.server_address);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{} is not reachable: {e}", settings.server_address);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn route_guard(args: CheckArgs, settings: &ClientSettings) -> RouteGuard {
    let gate = PermissionGate::new()
        .permissions(args.permissions)
        .roles(args.roles)
        .mode(args.mode.into());
    RouteGuard::new(settings.login_redirect.clone()).with_gate(gate)
}

fn describe_decision(decision: &RouteDecision) -> String {
    match decision {
        RouteDecision::Pending => "Session is still loading".to_string(),
        RouteDecision::Render => "Access granted".to_string(),
        RouteDecision::Redirect(to) => format!("Not logged in, go to {to}"),
        RouteDecision::Forbidden => "Access denied".to_string(),
    }
}

fn describe_session(session: &Session) -> Vec<String> {
    let mut result = vec![format!("Status: {:?}", session.status())];
    match session.status() {
        SessionStatus::Authenticated => {
            if let Some(user) = session.user.as_ref() {
                result.push(format!("User: {} ({})", user.display_name(), user.username));
            }
            result.push(format!("Permissions: {}", join(session.permissions.iter())));
            result.push(format!("Roles: {}", join(session.roles.iter())));
        }
        SessionStatus::LoginFailed => {
            if let Some(error) = session.error.as_ref() {
                result.push(format!("Last error: {error}"));
            }
        }
        SessionStatus::Loading | SessionStatus::Unauthenticated => {}
    }
    result
}

fn join<T: AsRef<str>>(items: impl Iterator<Item = T>) -> String {
    let items: Vec<_> = items.map(|x| x.as_ref().to_string()).collect();
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
