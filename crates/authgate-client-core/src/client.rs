use anyhow::{anyhow, Context};
use authgate_shared::{
    const_config::path::{PathSpec, PATH_HEALTH_CHECK, PATH_LOGIN, PATH_LOGOUT},
    req_args::LoginReqArgs,
    uac::LoginResult,
};
use closure_traits::{ChannelCallBack, ChannelCallBackOutput};
use futures::channel::oneshot;
use reqwest::{header::AUTHORIZATION, Method, StatusCode};
use std::fmt::Debug;
use tracing::info;

use crate::{configuration::ClientSettings, context::SessionHandle};

pub const DUMMY_ARGUMENT: &[(&str, &str)] = &[("", "")];

/// Talks to the auth backend and feeds the answers into a session
#[derive(Debug, Clone)]
pub struct Client {
    api_client: reqwest::Client,
    server_address: String,
    session: SessionHandle,
}

impl Client {
    #[tracing::instrument(name = "NEW CLIENT-CORE", skip(session))]
    pub fn new(server_address: String, session: SessionHandle) -> Self {
        debug_assert!(
            server_address.starts_with("http"),
            "server address should be a http(s) url but got {server_address:?}"
        );
        Self {
            api_client: reqwest::Client::new(),
            server_address,
            session,
        }
    }

    pub fn from_settings(settings: &ClientSettings, session: SessionHandle) -> Self {
        Self::new(settings.server_address.clone(), session)
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Sends the credentials to the backend. The session shows as loading
    /// until the answer arrives, then either authenticated or failed with the
    /// server's message. `ui_notify` runs after the session was updated.
    #[tracing::instrument(skip(ui_notify))]
    pub fn login<F: UiCallBack>(
        &self,
        args: LoginReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        let (tx, rx) = oneshot::channel();
        let body = args.to_json_body();
        let session = self.session.clone();
        session.begin_login();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = match process_json_body::<LoginResult>(resp).await {
                Ok(result) => {
                    session.login(result);
                    Ok(())
                }
                Err(e) => {
                    session.login_failed(e.to_string());
                    Err(e)
                }
            };
            // Receiver may have been dropped if the caller is not interested
            let _ = tx.send(msg);
            ui_notify();
        };

        self.initiate_request(PATH_LOGIN, &body, None, on_done);
        rx
    }

    /// Clears the local session straight away then lets the backend know.
    /// The receiver reports how the backend answered, the local session is
    /// gone either way.
    #[tracing::instrument]
    pub fn logout(&self) -> oneshot::Receiver<anyhow::Result<()>> {
        let (tx, rx) = oneshot::channel();
        let token = self.session.access_token();
        self.session.logout();
        let Some(token) = token else {
            info!("not logged in so backend not notified of logout");
            let _ = tx.send(Ok(()));
            return rx;
        };
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = process_empty(resp).await;
            let _ = tx.send(msg);
        };
        self.initiate_request(
            PATH_LOGOUT,
            &DUMMY_ARGUMENT,
            Some(token.as_bearer()),
            on_done,
        );
        rx
    }

    #[tracing::instrument(skip(ui_notify))]
    pub fn health_check<F>(&self, ui_notify: F) -> oneshot::Receiver<anyhow::Result<()>>
    where
        F: UiCallBack,
    {
        let (tx, rx) = oneshot::channel();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async {
            let msg = process_empty(resp).await;
            let _ = tx.send(msg);
            ui_notify();
        };
        self.initiate_request(PATH_HEALTH_CHECK, &DUMMY_ARGUMENT, None, on_done);
        rx
    }

    #[tracing::instrument(skip(args, bearer, on_done))]
    // WARNING: Must skip args as it my contain sensitive info and "safe" versions
    // would usually already be logged by the caller
    fn initiate_request<T, F, O>(
        &self,
        path_spec: PathSpec,
        args: &T,
        bearer: Option<String>,
        on_done: F,
    ) where
        T: serde::Serialize + Debug,
        F: ChannelCallBack<O>,
        O: ChannelCallBackOutput,
    {
        let is_get_method = path_spec.method == Method::GET;
        let mut request = self
            .api_client
            .request(path_spec.method, self.path_to_url(path_spec.path));
        request = if is_get_method {
            request.query(&args)
        } else {
            request.json(&args)
        };
        if let Some(bearer) = bearer {
            request = request.header(AUTHORIZATION, bearer);
        }
        reqwest_cross::fetch(request, on_done)
    }

    #[tracing::instrument(ret)]
    fn path_to_url(&self, path: &str) -> String {
        format!("{}{path}", self.server_address)
    }
}

#[tracing::instrument(ret, err(Debug))]
async fn process_empty(response: reqwest::Result<reqwest::Response>) -> anyhow::Result<()> {
    let (response, status) = extract_response(response)?;
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(handle_error(response).await)
    }
}

// Not using `ret` as the body may carry tokens
#[tracing::instrument(err(Debug))]
async fn process_json_body<T>(response: reqwest::Result<reqwest::Response>) -> anyhow::Result<T>
where
    T: Debug + serde::de::DeserializeOwned,
{
    let (response, status) = extract_response(response)?;
    match status {
        StatusCode::OK => Ok(response
            .json()
            .await
            .context("failed to parse result as json")?),
        _ => Err(handle_error(response).await),
    }
}

#[tracing::instrument(ret)]
async fn handle_error(response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    debug_assert!(
        !status.is_success(),
        "this is supposed to be an error, right? Status code is: {status}"
    );
    let Ok(body) = response.text().await else {
        return anyhow!("failed to get response body");
    };
    error_from_body(status, body)
}

/// The backend may answer with plain text or a JSON object with a `msg` or
/// `message` field
fn error_from_body(status: StatusCode, body: String) -> anyhow::Error {
    if body.is_empty() {
        return anyhow!("request failed with status code: {status} and no body");
    }
    let from_json = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            ["msg", "message"]
                .iter()
                .find_map(|field| value.get(field)?.as_str().map(str::to_string))
        });
    anyhow!("{}", from_json.unwrap_or(body))
}

/// Provides a way to standardize the error message
#[tracing::instrument(ret, err(Debug))]
fn extract_response(
    response: reqwest::Result<reqwest::Response>,
) -> anyhow::Result<(reqwest::Response, StatusCode)> {
    if response.is_err() {
        info!("Response is err: {:#?}", response);
    }
    let response = response.context("failed to send request")?;
    let status = response.status();
    Ok((response, status))
}

pub trait UiCallBack: 'static + Send + FnOnce() {}
impl<T> UiCallBack for T where T: 'static + Send + FnOnce() {}

#[cfg(not(target_arch = "wasm32"))]
pub mod closure_traits {
    pub trait ChannelCallBack<O>:
        'static + Send + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    impl<T, O> ChannelCallBack<O> for T where
        T: 'static + Send + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    pub trait ChannelCallBackOutput: futures::Future<Output = ()> + Send {}
    impl<T> ChannelCallBackOutput for T where T: futures::Future<Output = ()> + Send {}
}

#[cfg(target_arch = "wasm32")]
pub mod closure_traits {
    pub trait ChannelCallBack<O>:
        'static + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    impl<T, O> ChannelCallBack<O> for T where
        T: 'static + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    pub trait ChannelCallBackOutput: futures::Future<Output = ()> {}
    impl<T> ChannelCallBackOutput for T where T: futures::Future<Output = ()> {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain_text("Invalid username or password", "Invalid username or password")]
    #[case::json_msg(r#"{"code":401,"msg":"Account locked"}"#, "Account locked")]
    #[case::json_message(r#"{"message":"Token expired"}"#, "Token expired")]
    #[case::json_without_message(r#"{"code":500}"#, r#"{"code":500}"#)]
    fn error_message_from_body(#[case] body: &str, #[case] expected: &str) {
        let actual = error_from_body(StatusCode::UNAUTHORIZED, body.to_string());
        assert_eq!(actual.to_string(), expected);
    }

    #[test]
    fn empty_body_mentions_status() {
        let actual = error_from_body(StatusCode::UNAUTHORIZED, String::new());
        assert!(actual.to_string().contains("401"));
    }

    #[test]
    fn url_joins_base_and_path() {
        let client = Client::new(
            "http://localhost:8789".to_string(),
            SessionHandle::new(crate::storage::MemoryStorage::new()),
        );
        assert_eq!(
            client.path_to_url(PATH_LOGIN.path),
            "http://localhost:8789/auth/login"
        );
    }

    #[test]
    fn logout_without_session_does_not_send() {
        // No runtime is running so sending a request here would panic
        let client = Client::new(
            "http://localhost:8789".to_string(),
            SessionHandle::new(crate::storage::MemoryStorage::new()),
        );

        let mut rx = client.logout();

        assert!(!client.session().is_authenticated());
        assert!(matches!(rx.try_recv(), Ok(Some(Ok(())))));
    }
}
