// Centralized logging for the login flow
use log::{debug, info, warn};

use crate::oauth::ConsumerConfig;

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log the middleware configuration at startup
    pub fn log_middleware_configured(consumer: &ConsumerConfig, login_path: &str, return_to: &str) {
        info!(
            "🔧 Twitter login configured: site={}, authorize_path={}, login_path={}, return_to={}",
            consumer.site, consumer.authorize_path, login_path, return_to
        );
        if !consumer.is_configured() {
            warn!("⚠️  Twitter consumer key or secret is empty; request token calls will fail");
        }
    }

    /// Log the start of a login attempt
    pub fn log_login_started(callback_url: &str) {
        info!("🔄 Requesting Twitter request token (callback: {})", callback_url);
    }

    /// Log that the user is being sent to the provider
    pub fn log_authorize_redirect(authorize_url: &str, format: &str) {
        debug!("Sending user to {} as {} response", authorize_url, format);
    }

    /// Log a denied authorization
    pub fn log_access_denied(reason: &str) {
        info!("⏭️  User denied Twitter authorization ({})", reason);
    }

    /// Log a callback carrying a verifier but no pending request token
    pub fn log_missing_request_token() {
        warn!("❌ OAuth callback received without a pending request token in session");
    }

    /// Log a successful verifier exchange
    pub fn log_access_token_obtained() {
        info!("✅ Exchanged request token for access token");
    }

    /// Log a stored user profile
    pub fn log_profile_stored(screen_name: Option<&str>, field_count: usize) {
        info!(
            "✅ Stored Twitter profile for @{} ({} fields)",
            screen_name.unwrap_or("unknown"),
            field_count
        );
    }

    /// Log a failed profile fetch after the access token was stored
    pub fn log_profile_fetch_failed(error: &dyn std::fmt::Display) {
        warn!("⚠️  Could not load Twitter profile, continuing with empty profile: {}", error);
    }

    /// Log a non-success provider response; the body is only shown at debug level
    pub fn log_provider_error(endpoint: &str, status: u16, body: &str) {
        warn!("❌ Twitter {} endpoint responded with status {}", endpoint, status);
        debug!("Raw Twitter {} error response: {}", endpoint, body);
    }

    /// Log a login request that ended in an error response
    pub fn log_flow_failed(error: &dyn std::error::Error) {
        warn!("❌ Twitter login failed: {}", error);
        if let Some(source) = error.source() {
            debug!("Caused by: {}", source);
        }
    }

    /// Log a session that only fit in its cookie after dropping profile fields
    pub fn log_session_cookie_compacted(size: usize, compacted_size: usize, limit: usize) {
        warn!(
            "⚠️  Session cookie of {} bytes exceeds the {} byte limit; stored profile reduced to identity fields ({} bytes)",
            size, limit, compacted_size
        );
    }

    /// Log the downstream application declining the login path
    pub fn log_app_not_found(return_to: &str) {
        debug!("Application has no handler at the login path; redirecting to {}", return_to);
    }
}
