use actix_web::HttpResponse;

use crate::utils::headers::accepts;
use crate::utils::response_builder::ResponseBuilder;

/// Encoding of the "go to the provider" response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// `200 application/json` with `{"authorize_url": ..}`
    Json,
    /// `200 application/javascript` assigning `window.location`
    Script,
    /// `302` with a `Location` header
    Redirect,
}

impl ResponseFormat {
    /// Pick the encoding from the `Accept` header and the XHR marker
    #[must_use]
    pub fn negotiate(accept: Option<&str>, xhr: bool) -> Self {
        if accepts(accept, "application/json") {
            Self::Json
        } else if xhr || accepts(accept, "application/javascript") {
            Self::Script
        } else {
            Self::Redirect
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Script => "script",
            Self::Redirect => "redirect",
        }
    }
}

/// What the middleware should answer with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseInstruction {
    /// Send the browser to the provider's authorize page
    Authorize {
        authorize_url: String,
        format: ResponseFormat,
    },
    /// Plain redirect, e.g. back to the return path
    Redirect { location: String },
    /// Let the application handle the login path; redirect to `fallback` if it
    /// has nothing there
    Delegate { fallback: String },
}

impl ResponseInstruction {
    /// Concrete response for instructions that do not involve the application
    #[must_use]
    pub fn into_response(self) -> Option<HttpResponse> {
        match self {
            Self::Authorize {
                authorize_url,
                format,
            } => Some(match format {
                ResponseFormat::Json => ResponseBuilder::authorize_json(&authorize_url),
                ResponseFormat::Script => ResponseBuilder::authorize_script(&authorize_url),
                ResponseFormat::Redirect => ResponseBuilder::redirect(&authorize_url),
            }),
            Self::Redirect { location } => Some(ResponseBuilder::redirect(&location)),
            Self::Delegate { .. } => None,
        }
    }
}
