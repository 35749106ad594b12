//! Client response construction.
//!
//! # Responsibilities
//! - Copy the backend status and `Content-Type` onto the client response
//! - Wrap the backend body in a [`RelayStream`]
//! - Send no body at all when the backend response cannot carry one
//!
//! # Design Decisions
//! - The head is fixed before any body byte moves
//! - No other backend header is copied; framing is re-derived by hyper
//!   (chunked), so a truncated backend body can never look complete

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, Response, StatusCode},
    BoxError,
};

use crate::http::relay::RelayStream;

/// Turn a backend response into the client response.
pub fn relay_response<B>(
    backend: Response<B>,
    chunk_size: usize,
    idle_timeout: Option<Duration>,
) -> Response<Body>
where
    B: hyper::body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let (parts, body) = backend.into_parts();

    // hyper never polls the body of a 1xx, 204 or 304 response.
    let body = if is_bodiless(parts.status) || body.is_end_stream() {
        Body::empty()
    } else {
        let upstream = Body::new(body).into_data_stream();
        Body::from_stream(RelayStream::new(upstream, chunk_size, idle_timeout))
    };

    let mut response = Response::new(body);
    *response.status_mut() = parts.status;
    if let Some(content_type) = parts.headers.get(header::CONTENT_TYPE) {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type.clone());
    }
    response
}

fn is_bodiless(status: StatusCode) -> bool {
    status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
}
