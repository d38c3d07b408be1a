/**
 * fj4tide's demo server: a JSON echo service which decodes and encodes every body with
 * whichever codec was compiled in
 */
#[macro_use]
extern crate serde_derive;

use clap::{App, Arg};
use fj4tide::http::{json_response, RequestExt};
use fj4tide::settings::{self, Settings};
use fj4tide::{Codec, JsonCodec};
use log::*;
use std::sync::Arc;
use tide::{Request, Response, StatusCode};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone)]
struct State {
    codec: Codec,
    settings: Arc<Settings>,
}

#[async_std::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let matches = App::new("fj4tide")
        .version(env!("CARGO_PKG_VERSION"))
        .about("JSON echo server backed by the fastest codec available")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Sets a custom config file")
                .takes_value(true),
        )
        .get_matches();

    let file = matches.value_of("config").unwrap_or("fj4tide.yml");
    let settings = Arc::new(settings::load(file)?);
    let codec = fj4tide::new_with_config(&settings.codec);
    let addr = settings.listen_address();

    info!("Using the {} codec", codec.kind());
    info!("Listening on: {}", addr);

    let mut app = tide::with_state(State { codec, settings });

    /*
     * tide drops error messages from responses by default, the rejection details are the whole
     * point of the echo service
     */
    app.with(tide::utils::After(|mut res: Response| async move {
        if let Some(err) = res.error() {
            let message = err.to_string();
            res.set_body(message);
        }
        Ok(res)
    }));

    app.at("/").get(|_| async move { Ok("fj4tide echo server") });
    app.at("/codec").get(codec_info);
    app.at("/echo").post(echo);

    app.listen(addr).await?;
    Ok(())
}

#[derive(Serialize)]
struct CodecInfo {
    codec: String,
    version: &'static str,
}

async fn codec_info(req: Request<State>) -> tide::Result {
    let state = req.state();
    let info = CodecInfo {
        codec: state.codec.kind().to_string(),
        version: env!("CARGO_PKG_VERSION"),
    };
    json_response(&state.codec, StatusCode::Ok, &info, "")
}

/**
 * Decode whatever JSON document was posted and send it straight back, pretty printed when the
 * query string asks for it
 */
async fn echo(mut req: Request<State>) -> tide::Result {
    let state = req.state().clone();
    let body: serde_json::Value = req.body_json_with(&state.codec).await?;

    let pretty = req.url().query_pairs().any(|(key, _)| key == "pretty");
    let indent = if pretty { state.settings.indent.as_str() } else { "" };

    debug!("Echoing a body back for {}", req.url());
    json_response(&state.codec, StatusCode::Ok, &body, indent)
}
