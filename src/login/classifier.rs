use std::collections::HashMap;

/// Query parameter carrying the provider's one-time verifier
pub const VERIFIER_PARAM: &str = "oauth_verifier";
/// Query parameter the provider sets when the user refused access
pub const DENIED_PARAM: &str = "denied";

/// The three shapes a request to the login path can take
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginRequestKind {
    /// The provider redirected back after the user granted access
    VerifierPresent(String),
    /// The provider redirected back after the user refused access
    Denied(String),
    /// The user asked to log in
    LoginStart,
}

/// Classify a login-path request by its query parameters
///
/// A verifier wins over a denial marker; anything else starts a login.
#[must_use]
pub fn classify(query: &HashMap<String, String>) -> LoginRequestKind {
    if let Some(verifier) = query.get(VERIFIER_PARAM) {
        LoginRequestKind::VerifierPresent(verifier.clone())
    } else if let Some(reason) = query.get(DENIED_PARAM) {
        LoginRequestKind::Denied(reason.clone())
    } else {
        LoginRequestKind::LoginStart
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_verifier_present() {
        assert_eq!(
            classify(&query(&[("oauth_verifier", "v1"), ("oauth_token", "reqtok")])),
            LoginRequestKind::VerifierPresent("v1".to_string())
        );
    }

    #[test]
    fn test_denied() {
        assert_eq!(
            classify(&query(&[("denied", "OMG")])),
            LoginRequestKind::Denied("OMG".to_string())
        );
        assert_eq!(
            classify(&query(&[("denied", "")])),
            LoginRequestKind::Denied(String::new())
        );
    }

    #[test]
    fn test_verifier_takes_precedence_over_denied() {
        assert_eq!(
            classify(&query(&[("denied", "x"), ("oauth_verifier", "v1")])),
            LoginRequestKind::VerifierPresent("v1".to_string())
        );
    }

    #[test]
    fn test_everything_else_starts_login() {
        assert_eq!(classify(&query(&[])), LoginRequestKind::LoginStart);
        assert_eq!(
            classify(&query(&[("next", "/home")])),
            LoginRequestKind::LoginStart
        );
    }
}
