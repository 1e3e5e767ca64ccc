use actix_web::{http::header, HttpResponse};
use serde_json::json;

pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Plain `302 Found` with an empty `text/plain` body
    #[must_use]
    pub fn redirect(location: &str) -> HttpResponse {
        HttpResponse::Found()
            .insert_header((header::LOCATION, location))
            .content_type("text/plain")
            .finish()
    }

    /// `200` JSON body carrying the authorize URL for script-driven clients
    #[must_use]
    pub fn authorize_json(authorize_url: &str) -> HttpResponse {
        HttpResponse::Ok()
            .content_type("application/json")
            .body(json!({ "authorize_url": authorize_url }).to_string())
    }

    /// `200` script that navigates the page to the authorize URL
    #[must_use]
    pub fn authorize_script(authorize_url: &str) -> HttpResponse {
        HttpResponse::Ok()
            .content_type("application/javascript")
            .body(navigation_script(authorize_url))
    }

    /// JSON error body with the given status
    #[must_use]
    pub fn error_json(
        status: actix_web::http::StatusCode,
        error: &str,
        description: &str,
    ) -> HttpResponse {
        HttpResponse::build(status)
            .content_type("application/json")
            .body(
                json!({
                    "error": error,
                    "error_description": description
                })
                .to_string(),
            )
    }
}

/// `window.location = "<url>";` with the URL encoded as a JS string literal
#[must_use]
pub fn navigation_script(url: &str) -> String {
    // JSON strings are valid JS literals; `<` is escaped so the script can be inlined in HTML
    let literal = serde_json::Value::String(url.to_string())
        .to_string()
        .replace('<', "\\u003c");
    format!("window.location = {literal};")
}
