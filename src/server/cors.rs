use std::env;

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Method, Status};
use rocket::{options, Request, Response};

// Comma separated allow list; unset or `*` allows any origin.
const ORIGINS_ENV: &str = "PBDECRYPT_CORS_ORIGINS";
const ANY_ORIGIN: &str = "*";
const ALLOWED_METHODS: &str = "GET,OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type,Accept";
const MAX_AGE_SECONDS: &str = "86400";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cors {
    origins: Vec<String>,
}

impl Cors {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let origins: Vec<String> = origins
            .into_iter()
            .map(Into::into)
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        if origins.is_empty() {
            return Self::any();
        }
        Self { origins }
    }

    pub fn any() -> Self {
        Self {
            origins: vec![ANY_ORIGIN.to_string()],
        }
    }

    pub fn from_env() -> Self {
        match env::var(ORIGINS_ENV) {
            Ok(value) => Self::new(value.split(',')),
            Err(_) => Self::any(),
        }
    }

    fn allow_origin(&self, request_origin: Option<&str>) -> Option<String> {
        if self.origins.iter().any(|origin| origin == ANY_ORIGIN) {
            return Some(ANY_ORIGIN.to_string());
        }
        let origin = request_origin?;
        self.origins
            .iter()
            .find(|allowed| allowed.eq_ignore_ascii_case(origin))
            .map(|_| origin.to_string())
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = self.allow_origin(request.headers().get_one("Origin")) {
            if origin != ANY_ORIGIN {
                response.set_header(Header::new("Vary", "Origin"));
            }
            response.set_header(Header::new("Access-Control-Allow-Origin", origin));
            response.set_header(Header::new("Access-Control-Allow-Methods", ALLOWED_METHODS));
            response.set_header(Header::new("Access-Control-Allow-Headers", ALLOWED_HEADERS));
            response.set_header(Header::new("Access-Control-Max-Age", MAX_AGE_SECONDS));
        }

        if request.method() == Method::Options {
            response.set_status(Status::NoContent);
            response.set_header(Header::new("Content-Length", "0"));
        }
    }
}

#[options("/api/<_..>")]
pub fn api_preflight() -> Status {
    Status::NoContent
}
