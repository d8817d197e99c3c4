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

//! The high-level Trufina client.

use bh_xml_binding::Raw;
use bherror::traits::ForeignError as _;

use crate::{
    response::{self, ResponseDocument, ResponseKind},
    Assembler, Config, Error, Mode, RequestDocument, ReqwestTransport, Result, TrufinaTransport,
};

/// Client assembling requests, sending them over a [`TrufinaTransport`] and
/// parsing the answers.
#[derive(Debug, Clone)]
pub struct TrufinaClient<T: TrufinaTransport> {
    config: Config,
    mode: Mode,
    transport: T,
}

impl TrufinaClient<ReqwestTransport> {
    /// Construct a client talking to the environment `mode` over HTTPS.
    pub fn from_config(config: Config, mode: Mode) -> Result<Self> {
        let transport = ReqwestTransport::new(&config, mode)?;
        Ok(Self::new(config, mode, transport))
    }
}

impl<T: TrufinaTransport> TrufinaClient<T> {
    /// Construct a client from a [`TrufinaTransport`].
    pub fn new(config: Config, mode: Mode, transport: T) -> Self {
        Self {
            config,
            mode,
            transport,
        }
    }

    /// The environment of the client.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The transport of the client.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// An [`Assembler`] using the configuration of the client.
    pub fn assembler(&self) -> Assembler<'_> {
        Assembler::new(&self.config, self.mode)
    }

    /// Send an assembled request and parse the answer.
    pub async fn send(&self, request: &RequestDocument) -> Result<ResponseDocument> {
        let xml = request.to_xml()?;
        tracing::debug!(kind = %request.kind(), xml = %xml, "Sending Trufina request");

        let body = self
            .transport
            .post_xml(xml)
            .await
            .match_foreign_err(|error| Error::Network(error.to_string()))?;

        response::parse(&body)
    }

    /// Start a login for the partner reference token `prt`.
    ///
    /// On success the response carries the `PLID` to send the user to.
    pub async fn login_request(
        &self,
        prt: &str,
        data: impl Into<Raw>,
        seed: impl Into<Raw>,
    ) -> Result<ResponseDocument> {
        let request = self.assembler().login_request(prt, data, seed)?;
        self.send(&request).await
    }

    /// Fetch the data behind the notification ID `tnid`.
    pub async fn info_request(&self, tnid: &str) -> Result<ResponseDocument> {
        let request = self.assembler().info_request(tnid)?;
        self.send(&request).await
    }

    /// Fetch the data shared during the login `tlid`.
    pub async fn login_info_request(&self, tlid: &str) -> Result<ResponseDocument> {
        let request = self.assembler().login_info_request(tlid)?;
        self.send(&request).await
    }

    /// Request additional `data` about a user who already logged in.
    pub async fn access_request(
        &self,
        prt: &str,
        tlid: &str,
        pur: &str,
        data: impl Into<Raw>,
    ) -> Result<ResponseDocument> {
        let request = self.assembler().access_request(prt, tlid, pur, data)?;
        self.send(&request).await
    }

    /// Parse an access notification Trufina posted to the partner.
    pub fn parse_notification(&self, raw_xml: &str) -> Result<ResponseDocument> {
        let document = response::parse(raw_xml)?;
        if document.kind() != ResponseKind::AccessNotification {
            return Err(bherror::Error::root(Error::MalformedResponse(format!(
                "expected {}, received {}",
                ResponseKind::AccessNotification,
                document.kind()
            ))));
        }

        Ok(document)
    }
}
