//! REST-backed sources.
//!
//! [`RestSource`] fetches and decodes an endpoint once at construction.
//! [`ObservableRestSource`] serves a configured subtree of the response and
//! re-fetches on `reload`, using a timestamp value elsewhere in the response
//! to decide whether anything changed.

use crate::decode::DecoderRegistry;
use crate::error::Result;
use crate::partial::Partial;
use serde_yaml::Value;
use tracing::debug;

use super::{ObservableSource, Source};

/// A source decoded from one HTTP GET at construction time.
pub struct RestSource {
    partial: Partial,
}

impl RestSource {
    pub fn new(uri: &str, format: &str, decoders: &DecoderRegistry) -> Result<Self> {
        let partial = fetch(uri, format, decoders)?;
        Ok(Self { partial })
    }
}

impl Source for RestSource {
    fn partial(&self) -> Result<Partial> {
        Ok(self.partial.clone())
    }
}

/// A REST source with change detection.
///
/// The endpoint's response carries the configuration under `config_path`
/// and a change marker (timestamp, revision, etag-like value) under
/// `timestamp_path`. `reload` re-fetches and compares the marker; only a
/// different marker refreshes the served subtree.
pub struct ObservableRestSource {
    uri: String,
    format: String,
    config_path: String,
    timestamp_path: String,
    decoders: DecoderRegistry,
    stamp: Value,
    partial: Partial,
}

impl ObservableRestSource {
    pub fn new(
        uri: &str,
        format: &str,
        config_path: &str,
        timestamp_path: &str,
        decoders: &DecoderRegistry,
    ) -> Result<Self> {
        let document = fetch(uri, format, decoders)?;
        let stamp = document.get(timestamp_path)?.clone();
        let partial = document.get_partial(config_path)?;
        Ok(Self {
            uri: uri.to_string(),
            format: format.to_string(),
            config_path: config_path.to_string(),
            timestamp_path: timestamp_path.to_string(),
            decoders: decoders.clone(),
            stamp,
            partial,
        })
    }
}

impl Source for ObservableRestSource {
    fn partial(&self) -> Result<Partial> {
        Ok(self.partial.clone())
    }
}

impl ObservableSource for ObservableRestSource {
    fn reload(&mut self) -> Result<bool> {
        let document = fetch(&self.uri, &self.format, &self.decoders)?;
        let stamp = document.get(&self.timestamp_path)?.clone();
        if stamp == self.stamp {
            return Ok(false);
        }
        debug!(uri = %self.uri, "rest source changed");
        self.stamp = stamp;
        self.partial = document.get_partial(&self.config_path)?;
        Ok(true)
    }
}

fn fetch(uri: &str, format: &str, decoders: &DecoderRegistry) -> Result<Partial> {
    let body = reqwest::blocking::get(uri)?.error_for_status()?.bytes()?;
    decoders.decode(format, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_rest_source_decodes_response() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/config")
            .with_body(r#"{"db": {"host": "remote"}}"#)
            .create();

        let source = RestSource::new(
            &format!("{}/config", server.url()),
            "json",
            &DecoderRegistry::with_defaults(),
        )
        .unwrap();
        assert_eq!(
            source.partial().unwrap().get_str("db.host").unwrap(),
            "remote"
        );
        mock.assert();
    }

    #[test]
    fn test_http_error_fails_closed() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/config")
            .with_status(500)
            .create();

        let result = RestSource::new(
            &format!("{}/config", server.url()),
            "json",
            &DecoderRegistry::with_defaults(),
        );
        assert!(matches!(result, Err(Error::Http(_))));
    }

    #[test]
    fn test_observable_rest_tracks_timestamp() {
        let mut server = mockito::Server::new();
        let first = server
            .mock("GET", "/config")
            .with_body(r#"{"meta": {"stamp": 1}, "data": {"limit": 10}}"#)
            .expect(2)
            .create();

        let uri = format!("{}/config", server.url());
        let decoders = DecoderRegistry::with_defaults();
        let mut source =
            ObservableRestSource::new(&uri, "json", "data", "meta.stamp", &decoders).unwrap();
        assert_eq!(source.partial().unwrap().get_int("limit").unwrap(), 10);

        // same stamp: no change reported
        assert!(!source.reload().unwrap());
        first.assert();

        // new stamp: subtree refreshed
        server
            .mock("GET", "/config")
            .with_body(r#"{"meta": {"stamp": 2}, "data": {"limit": 20}}"#)
            .create();
        assert!(source.reload().unwrap());
        assert_eq!(source.partial().unwrap().get_int("limit").unwrap(), 20);
    }

    #[test]
    fn test_observable_rest_requires_both_paths() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/config")
            .with_body(r#"{"data": {"limit": 10}}"#)
            .create();

        let uri = format!("{}/config", server.url());
        let result = ObservableRestSource::new(
            &uri,
            "json",
            "data",
            "meta.stamp",
            &DecoderRegistry::with_defaults(),
        );
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }
}
