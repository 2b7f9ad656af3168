use rocket::{
    fairing::{Fairing, Info, Kind},
    http::Header,
    Request, Response,
};

/// Lets the event feed be polled from pages served on other origins.
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, X-GitHub-Event, X-Hub-Signature-256",
        ));
    }
}

/// Answers preflight requests; the headers themselves are added by [`Cors`].
#[rocket::options("/<_..>")]
pub fn preflight() {}
