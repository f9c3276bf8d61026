//! Account handlers: login, registration, logout and self-service updates.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use motors_core::models::Account;
use motors_core::validation::{
    AccountUpdateInput, LoginInput, PasswordChangeInput, RegistrationInput, normalize_email,
    parse_id, validate_account_update, validate_login, validate_password_change,
    validate_registration,
};
use serde_json::json;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::FormOrJson;
use crate::handlers::local_path;
use crate::middleware::identity::CurrentIdentity;
use crate::middleware::negotiate::ResponseFormat;
use crate::middleware::role_gate::RoleGate;
use crate::services::auth::{self, SignedIn};
use crate::services::cookies::{clear_jwt_cookie, jwt_cookie};
use crate::services::session::Session;
use crate::views::Page;

/// Landing page after login when no return path is stored.
pub const ACCOUNT_HOME: &str = "/account/";

const LOGGED_OUT: &str = "You have been logged out.";
const ACCOUNT_UPDATED: &str = "Your account was updated.";
const PASSWORD_UPDATED: &str = "Your password was updated.";

fn login_form(email: &str) -> serde_json::Value {
    json!({ "account_email": email })
}

fn account_form(account: &Account) -> serde_json::Value {
    json!({
        "account_id": account.account_id,
        "account_firstname": account.firstname,
        "account_lastname": account.lastname,
        "account_email": account.email,
    })
}

fn signed_in_jar(state: &AppState, jar: CookieJar, signed: &SignedIn) -> CookieJar {
    jar.add(jwt_cookie(
        &signed.token,
        state.config.auth.token_ttl.num_seconds(),
        state.config.auth.secure_cookies,
    ))
}

/// `GET /account/login`
pub async fn login_page(session: Session, format: ResponseFormat) -> Response {
    Page::new("Login")
        .notices(session.take_notices())
        .data(login_form(""))
        .render(format)
}

/// `GET /account/register`
pub async fn register_page(session: Session, format: ResponseFormat) -> Response {
    Page::new("Register")
        .notices(session.take_notices())
        .data(json!({
            "account_firstname": "",
            "account_lastname": "",
            "account_email": "",
        }))
        .render(format)
}

/// `POST /account/register` — create a `Client` account.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    FormOrJson(input): FormOrJson<RegistrationInput>,
) -> AppResult<Response> {
    let reg = match validate_registration(&input) {
        Ok(reg) => reg,
        Err(errors) => {
            return Ok(Page::new("Register")
                .status(StatusCode::BAD_REQUEST)
                .notices(session.take_notices())
                .errors(errors.messages())
                .data(json!({
                    "account_firstname": input.account_firstname.trim(),
                    "account_lastname": input.account_lastname.trim(),
                    "account_email": normalize_email(&input.account_email),
                }))
                .render(format));
        }
    };

    match auth::register(state.accounts.as_ref(), &reg).await {
        Ok(account) => Ok(Page::new("Login")
            .status(StatusCode::CREATED)
            .notice(format!(
                "Congratulations, you're registered {}. Please log in.",
                account.firstname
            ))
            .data(login_form(&account.email))
            .render(format)),
        Err(AppError::Conflict(message)) => Ok(Page::new("Login")
            .status(StatusCode::CONFLICT)
            .notice(message)
            .data(login_form(&reg.email))
            .render(format)),
        Err(e) => Err(e),
    }
}

/// `POST /account/login` — check credentials, set the `jwt` cookie and send
/// the caller back to where a route gate stopped them (once), or to the
/// account page.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    jar: CookieJar,
    FormOrJson(input): FormOrJson<LoginInput>,
) -> AppResult<Response> {
    let creds = match validate_login(&input) {
        Ok(creds) => creds,
        Err(errors) => {
            return Ok(Page::new("Login")
                .status(StatusCode::BAD_REQUEST)
                .errors(errors.messages())
                .data(login_form(&normalize_email(&input.account_email)))
                .render(format));
        }
    };

    let signed = match auth::login(
        state.accounts.as_ref(),
        &state.codec,
        state.config.auth.token_ttl,
        &creds,
    )
    .await
    {
        Ok(signed) => signed,
        Err(AppError::Unauthorized(message)) => {
            return Ok(Page::new("Login")
                .status(StatusCode::UNAUTHORIZED)
                .notice(message)
                .data(login_form(&creds.email))
                .render(format));
        }
        Err(e) => return Err(e),
    };

    let jar = signed_in_jar(&state, jar, &signed);
    let redirect = session
        .take_return_to()
        .and_then(|path| local_path(&path).map(str::to_string))
        .unwrap_or_else(|| ACCOUNT_HOME.to_string());

    Ok(match format {
        ResponseFormat::Json => (
            jar,
            Json(json!({
                "ok": true,
                "redirect": redirect,
                "token": signed.token,
                "account": signed.account,
            })),
        )
            .into_response(),
        ResponseFormat::Html => (jar, Redirect::to(&redirect)).into_response(),
    })
}

/// `GET|POST /account/logout` — clear the `jwt` cookie.
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    jar: CookieJar,
) -> Response {
    let jar = jar.add(clear_jwt_cookie(state.config.auth.secure_cookies));
    match format {
        ResponseFormat::Json => {
            (jar, Json(json!({ "ok": true, "message": LOGGED_OUT }))).into_response()
        }
        ResponseFormat::Html => {
            session.push_notice(LOGGED_OUT);
            (jar, Redirect::to("/")).into_response()
        }
    }
}

/// `GET /account/` — the caller's account page.
pub async fn management(
    State(state): State<AppState>,
    current: CurrentIdentity,
    session: Session,
    format: ResponseFormat,
) -> AppResult<Response> {
    let identity = current.require()?;
    let account = state
        .accounts
        .find_by_id(identity.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found.".into()))?;

    Ok(Page::new("Account Management")
        .notices(session.take_notices())
        .data(json!({
            "greeting": format!("Welcome {}", account.firstname),
            "is_staff": RoleGate::staff().admits(account.role),
            "account": account,
        }))
        .render(format))
}

/// `GET /account/update/{account_id}` — edit form for the caller's own account.
pub async fn update_page(
    State(state): State<AppState>,
    current: CurrentIdentity,
    session: Session,
    format: ResponseFormat,
    Path(account_id): Path<String>,
) -> AppResult<Response> {
    let identity = current.require()?;
    let account_id =
        parse_id(&account_id).ok_or_else(|| AppError::Validation("Invalid account id.".into()))?;
    if account_id != identity.sub {
        return Err(AppError::Forbidden(auth::NOT_YOUR_ACCOUNT.into()));
    }
    let account = state
        .accounts
        .find_by_id(account_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found.".into()))?;

    Ok(Page::new("Edit Account")
        .notices(session.take_notices())
        .data(account_form(&account))
        .render(format))
}

/// `POST /account/update` — change names and email; the token is re-issued.
pub async fn update_account(
    State(state): State<AppState>,
    current: CurrentIdentity,
    session: Session,
    format: ResponseFormat,
    jar: CookieJar,
    FormOrJson(input): FormOrJson<AccountUpdateInput>,
) -> AppResult<Response> {
    let identity = current.require()?;
    let sticky = json!({
        "account_id": input.account_id.trim(),
        "account_firstname": input.account_firstname.trim(),
        "account_lastname": input.account_lastname.trim(),
        "account_email": normalize_email(&input.account_email),
    });

    let update = match validate_account_update(&input) {
        Ok(update) => update,
        Err(errors) => {
            return Ok(Page::new("Edit Account")
                .status(StatusCode::BAD_REQUEST)
                .errors(errors.messages())
                .data(sticky)
                .render(format));
        }
    };

    let signed = match auth::update_profile(
        state.accounts.as_ref(),
        &state.codec,
        state.config.auth.token_ttl,
        identity,
        &update,
    )
    .await
    {
        Ok(signed) => signed,
        Err(AppError::Conflict(message)) => {
            return Ok(Page::new("Edit Account")
                .status(StatusCode::CONFLICT)
                .errors(vec![message])
                .data(sticky)
                .render(format));
        }
        Err(e) => return Err(e),
    };

    let jar = signed_in_jar(&state, jar, &signed);
    Ok(match format {
        ResponseFormat::Json => (
            jar,
            Json(json!({
                "ok": true,
                "message": ACCOUNT_UPDATED,
                "token": signed.token,
                "account": signed.account,
            })),
        )
            .into_response(),
        ResponseFormat::Html => {
            session.push_notice(ACCOUNT_UPDATED);
            (jar, Redirect::to(ACCOUNT_HOME)).into_response()
        }
    })
}

/// `POST /account/password` — replace the caller's password.
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentIdentity,
    session: Session,
    format: ResponseFormat,
    FormOrJson(input): FormOrJson<PasswordChangeInput>,
) -> AppResult<Response> {
    let identity = current.require()?;
    let change = match validate_password_change(&input) {
        Ok(change) => change,
        Err(errors) => {
            return Ok(Page::new("Edit Account")
                .status(StatusCode::BAD_REQUEST)
                .errors(errors.messages())
                .data(json!({ "account_id": input.account_id.trim() }))
                .render(format));
        }
    };

    auth::change_password(state.accounts.as_ref(), identity, &change).await?;

    Ok(match format {
        ResponseFormat::Json => Json(json!({ "ok": true, "message": PASSWORD_UPDATED })).into_response(),
        ResponseFormat::Html => {
            session.push_notice(PASSWORD_UPDATED);
            Redirect::to(ACCOUNT_HOME).into_response()
        }
    })
}
