/**
 * The http module plugs the JSON codecs into tide's request and response types
 */
use crate::codec::JsonCodec;
use crate::errors::{DecodeError, EncodeError};
use async_trait::async_trait;
use log::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tide::http::mime;
use tide::{Body, Request, Response, StatusCode};

impl DecodeError {
    /**
     * The status a host should answer with for this error.
     *
     * Every decode failure is the client's doing, so errors which were passed along untouched
     * are answered with 400 as well, carrying the library's own message the way tide's body
     * binder does.
     */
    pub fn status(&self) -> StatusCode {
        StatusCode::BadRequest
    }

    /**
     * Convert into a tide error.
     *
     * The tide error keeps this DecodeError as its inner error, so the original library error
     * is still reachable through `source()`.
     */
    pub fn into_http_error(self) -> tide::Error {
        let status = self.status();
        tide::Error::new(status, self)
    }
}

impl EncodeError {
    pub fn into_http_error(self) -> tide::Error {
        tide::Error::new(StatusCode::InternalServerError, self)
    }
}

/**
 * Decoding request bodies with a JsonCodec
 */
#[async_trait]
pub trait RequestExt {
    async fn body_json_with<C, T>(&mut self, codec: &C) -> tide::Result<T>
    where
        C: JsonCodec,
        T: DeserializeOwned + Send;
}

#[async_trait]
impl<State> RequestExt for Request<State>
where
    State: Clone + Send + Sync + 'static,
{
    async fn body_json_with<C, T>(&mut self, codec: &C) -> tide::Result<T>
    where
        C: JsonCodec,
        T: DeserializeOwned + Send,
    {
        let body = self.body_bytes().await?;

        codec.deserialize(body.as_slice()).map_err(|err| {
            debug!("Rejecting a request body for {}: {}", self.url().path(), err);
            err.into_http_error()
        })
    }
}

/**
 * Encoding response bodies with a JsonCodec
 */
pub trait ResponseExt {
    fn set_body_json_with<C, T>(&mut self, codec: &C, value: &T, indent: &str) -> tide::Result<()>
    where
        C: JsonCodec,
        T: Serialize + ?Sized;
}

impl ResponseExt for Response {
    fn set_body_json_with<C, T>(&mut self, codec: &C, value: &T, indent: &str) -> tide::Result<()>
    where
        C: JsonCodec,
        T: Serialize + ?Sized,
    {
        let mut buffer = vec![];
        codec
            .serialize(&mut buffer, value, indent)
            .map_err(EncodeError::into_http_error)?;

        self.set_body(Body::from_bytes(buffer));
        self.set_content_type(mime::JSON);
        Ok(())
    }
}

/**
 * Build a complete JSON response in one go
 */
pub fn json_response<C, T>(codec: &C, status: StatusCode, value: &T, indent: &str) -> tide::Result
where
    C: JsonCodec,
    T: Serialize + ?Sized,
{
    let mut response = Response::new(status);
    response.set_body_json_with(codec, value, indent)?;
    Ok(response)
}
