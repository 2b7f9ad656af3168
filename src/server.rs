use rocket::{
    data::{ByteUnit, Limits},
    routes, Build, Config, Rocket,
};

use crate::{
    api::{self, EventsLimit},
    config::HooklineConfig,
    cors::{self, Cors},
    store::StoreHandle,
    webhooks::github::{self, GitHubSecret},
};

/// Assembles the web server around an already opened `store`.
pub fn build(config: &HooklineConfig, store: StoreHandle) -> Rocket<Build> {
    // deliveries are read under the `json` limit
    let limits = Limits::default().limit("json", ByteUnit::Byte(config.max_payload_bytes));
    let figment = Config::figment().merge(("limits", limits));

    rocket::custom(figment)
        .mount("/", routes![api::index, api::events, cors::preflight])
        .mount("/webhook", routes![github::receiver, github::health])
        .attach(Cors)
        .manage(store)
        .manage(GitHubSecret(config.webhook_secret.clone()))
        .manage(EventsLimit(config.events_limit))
}
