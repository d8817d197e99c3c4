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

//! Partner configuration and the API [`Mode`].

use std::path::Path;

use bh_uri_utils::UriPathExtensions as _;
use bherror::traits::{ForeignError as _, PropagateError as _};
use serde::Deserialize;

use crate::{Error, Result};

const STAGING_DOMAIN: &str = "staging.trufina.com";
const PRODUCTION_DOMAIN: &str = "www.trufina.com";
const API_PATH: &str = "/WebServices/API";

/// Trufina environment a client talks to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    /// The staging environment.
    #[default]
    Staging,
    /// The production environment.
    Production,
}

impl Mode {
    /// Host name of the environment.
    pub fn domain(self) -> &'static str {
        match self {
            Self::Staging => STAGING_DOMAIN,
            Self::Production => PRODUCTION_DOMAIN,
        }
    }

    /// HTTPS endpoint accepting the XML API requests.
    pub fn endpoint(self) -> Result<reqwest::Url> {
        let base = format!("https://{}", self.domain());
        let mut url = reqwest::Url::parse(&base)
            .foreign_err(|| Error::Config(format!("invalid API host `{base}`")))?
            .add_path_suffix(API_PATH)
            .with_err(|| Error::Config(format!("invalid API path `{API_PATH}`")))?;

        // The API only answers on the directory path.
        let path = format!("{}/", url.path());
        url.set_path(&path);

        Ok(url)
    }
}

/// HTTP basic authentication guarding an environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BasicAuth {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Partner credentials for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// Partner ID.
    pub pid: String,
    /// Partner authentication key.
    pub pak: String,
    /// Basic authentication, if the environment requires it.
    #[serde(default)]
    pub basic_auth: Option<BasicAuth>,
}

/// URLs Trufina redirects the user to at the end of a login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoints {
    /// Redirect after a successful login.
    pub success: String,
    /// Redirect after a failed login.
    pub failure: String,
    /// Redirect after a cancelled login.
    pub cancel: String,
}

/// Partner configuration, usually read from a `trufina.yml` file.
///
/// ```yaml
/// staging:
///   pid: "1234"
///   pak: "staging-key"
///   basic_auth: { username: "partner", password: "secret" }
/// production:
///   pid: "1234"
///   pak: "production-key"
/// endpoints:
///   success: "https://partner.example/trufina/success"
///   failure: "https://partner.example/trufina/failure"
///   cancel: "https://partner.example/trufina/cancel"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Credentials for [`Mode::Staging`].
    pub staging: Credentials,
    /// Credentials for [`Mode::Production`].
    pub production: Credentials,
    /// Login redirect URLs.
    pub endpoints: Endpoints,
}

impl Config {
    /// Parse the configuration from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .match_foreign_err(|error| Error::Config(format!("unable to parse YAML: {error}")))
    }

    /// Read the configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .foreign_err(|| Error::Config(format!("unable to read {}", path.display())))?;

        tracing::debug!(path = %path.display(), "Loaded Trufina configuration");

        Self::from_yaml_str(&yaml)
    }

    /// Credentials of the environment `mode`.
    pub fn credentials(&self, mode: Mode) -> &Credentials {
        match mode {
            Mode::Staging => &self.staging,
            Mode::Production => &self.production,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{config, CONFIG_YAML};

    #[test]
    fn test_from_yaml_str() {
        let config = Config::from_yaml_str(CONFIG_YAML).unwrap();

        assert_eq!(config.staging.pid, "1234");
        assert_eq!(
            config.staging.basic_auth,
            Some(BasicAuth {
                username: "partner".to_owned(),
                password: "secret".to_owned(),
            })
        );
        assert_eq!(config.production.pak, "production-key");
        assert_eq!(config.production.basic_auth, None);
        assert_eq!(config.endpoints.cancel, "https://partner.example/trufina/cancel");
    }

    #[test]
    fn test_invalid_yaml() {
        let error = Config::from_yaml_str("staging: [").unwrap_err();
        assert!(matches!(error.error, Error::Config(_)));

        let error = Config::from_yaml_str("staging:\n  pid: \"1\"\n").unwrap_err();
        assert!(matches!(error.error, Error::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let error = Config::from_yaml_file("/nonexistent/trufina.yml").unwrap_err();
        assert!(matches!(error.error, Error::Config(_)));
    }

    #[test]
    fn test_credentials_follow_mode() {
        let config = config();

        assert_eq!(config.credentials(Mode::Staging).pak, "staging-key");
        assert_eq!(config.credentials(Mode::Production).pak, "production-key");
    }

    #[test]
    fn test_mode() {
        assert_eq!(Mode::default(), Mode::Staging);
        assert_eq!(Mode::Production.to_string(), "production");
        assert_eq!(Mode::Staging.domain(), "staging.trufina.com");
        assert_eq!(
            Mode::Staging.endpoint().unwrap().as_str(),
            "https://staging.trufina.com/WebServices/API/"
        );
        assert_eq!(
            Mode::Production.endpoint().unwrap().as_str(),
            "https://www.trufina.com/WebServices/API/"
        );
    }
}
