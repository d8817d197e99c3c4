// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Delivery of request documents to Trufina.

use std::future::Future;

use bherror::traits::ForeignError as _;
use reqwest::{header::CONTENT_TYPE, Client, ClientBuilder, Url};

use crate::{config::BasicAuth, Config, Error, Mode, Result};

const XML_CONTENT_TYPE: &str = "text/xml";

/// Interface for posting an XML document to the Trufina API and returning the
/// body of the answer.
///
/// Implementations decide on timeouts and retries; the client performs none.
pub trait TrufinaTransport: Sync {
    /// Error type used by this trait.
    type Err: std::error::Error + Send + Sync + 'static;

    /// Post `xml` and return the response body.
    ///
    /// Responses without a success status must be reported as errors.
    fn post_xml(
        &self,
        xml: String,
    ) -> impl Future<Output = std::result::Result<String, Self::Err>> + Send;
}

/// [`TrufinaTransport`] implementation using the [`reqwest`] crate.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    endpoint: Url,
    basic_auth: Option<BasicAuth>,
}

impl ReqwestTransport {
    /// Construct a transport posting to the endpoint of `mode`, with the basic
    /// authentication configured for it.
    pub fn new(config: &Config, mode: Mode) -> Result<Self> {
        Self::with_client(Client::new(), config, mode)
    }

    /// Same as [`ReqwestTransport::new`], using `client` for the requests.
    pub fn with_client(client: Client, config: &Config, mode: Mode) -> Result<Self> {
        Ok(Self {
            client,
            endpoint: mode.endpoint()?,
            basic_auth: config.credentials(mode).basic_auth.clone(),
        })
    }

    /// Same as [`ReqwestTransport::new`], building the client from `builder`.
    pub fn from_builder(builder: ClientBuilder, config: &Config, mode: Mode) -> Result<Self> {
        let client = builder
            .build()
            .match_foreign_err(|error| Error::Network(error.to_string()))?;
        Self::with_client(client, config, mode)
    }

    /// The URL requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl TrufinaTransport for ReqwestTransport {
    type Err = reqwest::Error;

    async fn post_xml(&self, xml: String) -> reqwest::Result<String> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(xml);
        if let Some(auth) = &self.basic_auth {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }

        request.send().await?.error_for_status()?.text().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::config;

    #[test]
    fn test_basic_auth_follows_mode() {
        let config = config();

        let staging = ReqwestTransport::new(&config, Mode::Staging).unwrap();
        assert_eq!(
            staging.endpoint().as_str(),
            "https://staging.trufina.com/WebServices/API/"
        );
        assert_eq!(
            staging.basic_auth.as_ref().map(|auth| auth.username.as_str()),
            Some("partner")
        );

        let production = ReqwestTransport::new(&config, Mode::Production).unwrap();
        assert_eq!(production.endpoint().host_str(), Some("www.trufina.com"));
        assert!(production.basic_auth.is_none());
    }
}
