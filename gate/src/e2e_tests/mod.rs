//! End-to-end tests at the HTTP request/response level.
//!
//! Each test file covers one property of the gate, driving the full router
//! (gate middleware plus handlers) through `tower::ServiceExt::oneshot`.

#![cfg(test)]

mod helpers;

mod test_basic_authentication;
mod test_concurrent_requests;
mod test_csrf_disabled;
mod test_entry_point;
mod test_frame_options;
mod test_https_redirect;
mod test_permit_all;
mod test_token_authentication;
