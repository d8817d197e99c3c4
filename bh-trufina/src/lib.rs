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

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! A `crate` for talking to the [Trufina][1] identity verification XML API.
//!
//! A partner asks Trufina to verify facts about a user (name, date of birth,
//! residence address, ...). Requests and responses are XML documents whose
//! shape is described by the schemas in [`schemas`], and bound to typed
//! element trees with [`bh_xml_binding`].
//!
//! [1]: <https://www.trufina.com>
//!
//! # Details
//!
//! The main components of this crate are the following.
//!
//! * [`Config`] and [`Mode`] -- Partner credentials and the selected environment.
//! * [`Assembler`] -- Builds and validates the request documents.
//! * [`response::parse`] -- Classifies and parses the documents Trufina sends back.
//! * [`TrufinaTransport`] -- Delivers requests, with [`ReqwestTransport`] as the HTTPS
//!   implementation.
//! * [`TrufinaClient`] -- Ties all of the above together.
//!
//! # Example
//!
//! ```
//! use bh_trufina::{response, Assembler, Config, Mode, ResponseKind};
//! use bh_xml_binding::Raw;
//!
//! let config = Config::from_yaml_str(
//!     r#"
//! staging: { pid: "1234", pak: "staging-key" }
//! production: { pid: "1234", pak: "production-key" }
//! endpoints:
//!   success: "https://partner.example/trufina/success"
//!   failure: "https://partner.example/trufina/failure"
//!   cancel: "https://partner.example/trufina/cancel"
//! "#,
//! )
//! .unwrap();
//!
//! let request = Assembler::new(&config, Mode::Staging)
//!     .login_request("abc", Raw::fields(["name", "phone"]), Raw::Empty)
//!     .unwrap();
//! assert!(request.to_xml().unwrap().contains("<PRT>abc</PRT>"));
//!
//! let response = response::parse(
//!     "<TrufinaLoginResponse><PRT>abc</PRT><PLID>123</PLID></TrufinaLoginResponse>",
//! )
//! .unwrap();
//! assert_eq!(response.kind(), ResponseKind::LoginResponse);
//! assert_eq!(response.plid(), Some("123"));
//! ```

pub use bh_xml_binding;
pub use client::TrufinaClient;
pub use config::{BasicAuth, Config, Credentials, Endpoints, Mode};
pub use error::{Error, FieldList, Result};
pub use request::{validate_contents, Assembler, RequestDocument, RequestFields, RequestKind};
pub use response::{ResponseDocument, ResponseKind};
pub use transport::{ReqwestTransport, TrufinaTransport};

mod client;
mod config;
mod error;
mod request;
pub mod response;
pub mod schemas;
#[cfg(test)]
mod test_utils;
mod transport;
