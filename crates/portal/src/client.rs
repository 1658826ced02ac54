//! Authenticated portal client.
//!
//! All portal traffic mimics the site's own AJAX calls: form-encoded POSTs
//! carrying a handler name, the CSRF token, and the session cookies. The
//! portal signals an expired session by answering with a login redirect
//! payload instead of the requested partial; every method here surfaces that
//! as [`PortalError::SessionExpired`].

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use eyre::{eyre, Result};
use reqwest::header::{COOKIE, SET_COOKIE};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::PortalError;
use crate::parse;
use crate::session_blob::SessionBlob;
use crate::ClassSchedule;
use rebook_core::models::class::{
    BookingAction, BookingOutcome, ClassCandidate, FormKind, LiveBookingSnapshot,
};

/// JSON key the portal puts in a response when it wants the browser to
/// navigate to the login page.
const REDIRECT_KEY: &str = "X_REDIRECT";
/// Key carrying the schedule partial in an `onDate` response.
const EVENTS_PARTIAL: &str = "@events";

const HANDLER_HEADER: &str = "X-Request-Handler";
const PARTIALS_HEADER: &str = "X-Request-Partials";
const CSRF_HEADER: &str = "X-CSRF-Token";

const LOGIN_HANDLER: &str = "onSignin";
const SCHEDULE_HANDLER: &str = "onDate";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Portal origin, e.g. "https://bookings.example-gym.co.uk".
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl PortalConfig {
    /// Load from environment variables. `PORTAL_BASE_URL` is required;
    /// `PORTAL_USER_AGENT` and `PORTAL_TIMEOUT_SECONDS` have defaults.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("PORTAL_BASE_URL")
            .map_err(|_| eyre!("PORTAL_BASE_URL environment variable must be set"))?;
        let user_agent =
            std::env::var("PORTAL_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        let request_timeout = std::env::var("PORTAL_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent,
            request_timeout,
        })
    }

    fn login_url(&self) -> String {
        format!("{}/login", self.base_url)
    }

    fn booking_url(&self) -> String {
        format!("{}/book-classes", self.base_url)
    }

    fn members_url(&self) -> String {
        format!("{}/members", self.base_url)
    }
}

/// Operations the orchestrator needs from an authenticated session.
#[async_trait]
pub trait PortalApi: Send + Sync + std::fmt::Debug {
    /// Fresh credential login. Replaces the session cookies and CSRF token.
    async fn login(&self, password: &str) -> Result<(), PortalError>;

    /// Scrape the bookable classes for one date.
    async fn fetch_classes_for_date(&self, date: NaiveDate) -> Result<ClassSchedule, PortalError>;

    /// Submit a booking or cancellation for a matched candidate and classify
    /// the portal's answer.
    async fn execute(
        &self,
        candidate: &ClassCandidate,
        action: BookingAction,
    ) -> Result<BookingOutcome, PortalError>;

    /// Scrape the member area's list of currently held bookings.
    async fn fetch_current_bookings(&self) -> Result<Vec<LiveBookingSnapshot>, PortalError>;

    /// Current persistable session state.
    fn session_blob(&self) -> SessionBlob;
}

#[derive(Debug)]
pub struct PortalClient {
    http: reqwest::Client,
    config: PortalConfig,
    username: String,
    state: Mutex<SessionBlob>,
}

impl PortalClient {
    /// Build a client over an existing session blob (possibly empty, for a
    /// fresh login).
    pub fn new(
        config: PortalConfig,
        username: &str,
        blob: SessionBlob,
    ) -> Result<Self, PortalError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            http,
            config,
            username: username.to_string(),
            state: Mutex::new(blob),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn snapshot(&self) -> (String, String) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        (state.cookie_header(), state.csrf_token.clone())
    }

    fn absorb_response_cookies(&self, response: &reqwest::Response) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for value in response.headers().get_all(SET_COOKIE) {
            if let Ok(raw) = value.to_str() {
                state.absorb_set_cookie(raw);
            }
        }
    }

    /// Fetch the login page and pull the CSRF token out of its meta tag.
    async fn fetch_csrf_token(&self) -> Result<String, PortalError> {
        let response = self.http.get(self.config.login_url()).send().await?;
        self.absorb_response_cookies(&response);

        let html = response.text().await?;
        parse::parse_csrf_token(&html)
            .ok_or_else(|| PortalError::Parse("No CSRF token on login page".to_string()))
    }

    async fn submit_form(
        &self,
        candidate: &ClassCandidate,
        action_description: &str,
    ) -> Result<BookingOutcome, PortalError> {
        let form = candidate
            .form
            .as_ref()
            .ok_or_else(|| PortalError::Parse("Candidate has no form to submit".to_string()))?;

        let (cookies, csrf) = self.snapshot();
        debug!(
            "Submitting {} for class id {} ({})",
            action_description, form.class_id, candidate.name
        );

        let response = self
            .http
            .post(self.config.booking_url())
            .header(COOKIE, cookies)
            .header(CSRF_HEADER, csrf)
            .header(HANDLER_HEADER, form.handler.clone())
            .form(&[
                ("id", form.class_id.as_str()),
                ("timestamp", form.timestamp.as_str()),
            ])
            .send()
            .await?;
        self.absorb_response_cookies(&response);

        let text = response.text().await?;
        if text.contains(REDIRECT_KEY) {
            warn!("{} answered with a login redirect", action_description);
            return Err(PortalError::SessionExpired);
        }

        let Ok(body) = serde_json::from_str::<Value>(&text) else {
            return Ok(BookingOutcome::Unknown {
                message: text.chars().take(200).collect(),
            });
        };

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();

        if parse::is_already_held_note(&message) {
            return Ok(BookingOutcome::AlreadyHeld);
        }
        if message.contains("full") || message.contains("no spaces") {
            return Ok(BookingOutcome::NoCapacity);
        }

        info!(
            "{} succeeded for class '{}' (user {})",
            action_description, candidate.name, self.username
        );
        Ok(BookingOutcome::Success {
            resolved_name: candidate.name.clone(),
        })
    }
}

#[async_trait]
impl PortalApi for PortalClient {
    async fn login(&self, password: &str) -> Result<(), PortalError> {
        info!("Attempting portal login for user {}", self.username);
        let csrf = self.fetch_csrf_token().await?;

        let (cookies, _) = self.snapshot();
        let response = self
            .http
            .post(self.config.login_url())
            .header(COOKIE, cookies)
            .header(CSRF_HEADER, csrf.clone())
            .header(HANDLER_HEADER, LOGIN_HANDLER)
            .form(&[("login", self.username.as_str()), ("password", password)])
            .send()
            .await?;
        self.absorb_response_cookies(&response);

        let body: Value = response
            .json()
            .await
            .map_err(|_| PortalError::AuthFailed("Unexpected login response".to_string()))?;

        if body.get(REDIRECT_KEY).is_some() {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.csrf_token = csrf;
            info!("Portal login successful for user {}", self.username);
            Ok(())
        } else {
            Err(PortalError::AuthFailed(format!(
                "Login rejected for user {}",
                self.username
            )))
        }
    }

    async fn fetch_classes_for_date(&self, date: NaiveDate) -> Result<ClassSchedule, PortalError> {
        let (cookies, csrf) = self.snapshot();
        debug!("Fetching classes for {} (user {})", date, self.username);

        let response = self
            .http
            .post(self.config.booking_url())
            .header(COOKIE, cookies)
            .header(CSRF_HEADER, csrf)
            .header(HANDLER_HEADER, SCHEDULE_HANDLER)
            .header(PARTIALS_HEADER, EVENTS_PARTIAL)
            .form(&[("date", date.format("%Y-%m-%d").to_string())])
            .send()
            .await?;
        self.absorb_response_cookies(&response);

        let body: Value = response
            .json()
            .await
            .map_err(|e| PortalError::Parse(format!("Schedule response was not JSON: {e}")))?;

        if body.get(REDIRECT_KEY).is_some() {
            return Err(PortalError::SessionExpired);
        }

        let raw_html = body
            .get(EVENTS_PARTIAL)
            .and_then(Value::as_str)
            .ok_or_else(|| PortalError::Parse("Schedule response missing events partial".to_string()))?
            .to_string();

        let candidates = parse::parse_schedule(&raw_html)?;
        debug!("Parsed {} classes for {}", candidates.len(), date);

        Ok(ClassSchedule {
            date,
            candidates,
            raw_html,
        })
    }

    async fn execute(
        &self,
        candidate: &ClassCandidate,
        action: BookingAction,
    ) -> Result<BookingOutcome, PortalError> {
        match (action, candidate.form.as_ref().map(|f| f.kind)) {
            (BookingAction::Book, Some(FormKind::Signup)) => {
                self.submit_form(candidate, "booking").await
            }
            (BookingAction::Book, Some(FormKind::WaitingList)) => {
                self.submit_form(candidate, "waitlisting").await
            }
            // A cancel form means the user already holds this class.
            (BookingAction::Book, Some(FormKind::Cancel)) => Ok(BookingOutcome::AlreadyHeld),
            (BookingAction::Book, None) => {
                match candidate.status_note.as_deref() {
                    Some(note) if parse::is_already_held_note(note) => {
                        Ok(BookingOutcome::AlreadyHeld)
                    }
                    _ => Ok(BookingOutcome::FormUnavailable),
                }
            }
            (BookingAction::Cancel, Some(FormKind::Cancel)) => {
                self.submit_form(candidate, "cancellation").await
            }
            (BookingAction::Cancel, _) => Ok(BookingOutcome::FormUnavailable),
        }
    }

    async fn fetch_current_bookings(&self) -> Result<Vec<LiveBookingSnapshot>, PortalError> {
        let (cookies, _) = self.snapshot();
        let response = self
            .http
            .get(self.config.members_url())
            .header(COOKIE, cookies)
            .send()
            .await?;

        // An expired session bounces the member area to the login page.
        if response.url().path().ends_with("/login") {
            return Err(PortalError::SessionExpired);
        }
        self.absorb_response_cookies(&response);

        let html = response.text().await?;
        parse::parse_current_bookings(&html)
    }

    fn session_blob(&self) -> SessionBlob {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
