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

use crate::Config;

pub(crate) const CONFIG_YAML: &str = r#"
staging:
  pid: "1234"
  pak: "staging-key"
  basic_auth:
    username: "partner"
    password: "secret"
production:
  pid: "1234"
  pak: "production-key"
endpoints:
  success: "https://partner.example/trufina/success"
  failure: "https://partner.example/trufina/failure"
  cancel: "https://partner.example/trufina/cancel"
"#;

pub(crate) fn config() -> Config {
    Config::from_yaml_str(CONFIG_YAML).unwrap()
}

pub(crate) const LOGIN_RESPONSE: &str =
    "<TrufinaLoginResponse><PRT>abc</PRT><PLID>123</PLID></TrufinaLoginResponse>";

pub(crate) const REQUEST_FAILURE: &str =
    r#"<TrufinaRequestFailure><Error kind="InvalidToken">Token expired</Error></TrufinaRequestFailure>"#;

pub(crate) const ACCESS_NOTIFICATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TrufinaAccessNotification xmlns="http://www.trufina.com/truapi/1/0">
  <PRT>prt-1</PRT>
  <TNID>tnid-1</TNID>
</TrufinaAccessNotification>"#;

pub(crate) const INFO_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TrufinaInfoResponse xmlns="http://www.trufina.com/truapi/1/0">
  <PRT>prt-1</PRT>
  <TNID>tnid-1</TNID>
  <PUR>pur-1</PUR>
  <AccessResponse>
    <Name>
      <First state="verified" status="present">Bob</First>
      <Surname state="unverified" status="present">Smith</Surname>
    </Name>
    <DateOfBirth state="verified" status="present">1980-01-31</DateOfBirth>
    <Phone state="verified" status="missing"/>
    <ResidenceAddress timeframe="current">
      <StreetAddress state="verified" status="present">1 Main St</StreetAddress>
      <StreetAddress state="verified" status="pending">Apt 2</StreetAddress>
      <City state="verified" status="present">Springfield</City>
    </ResidenceAddress>
  </AccessResponse>
</TrufinaInfoResponse>"#;

/// Same as [`INFO_RESPONSE`], with only the root element qualified.
pub(crate) const UNQUALIFIED_INFO_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<t:TrufinaInfoResponse xmlns:t="http://www.trufina.com/truapi/1/0">
  <PRT>prt-1</PRT>
  <TNID>tnid-1</TNID>
  <PUR>pur-1</PUR>
  <AccessResponse>
    <Name>
      <First state="verified" status="present">Bob</First>
      <Surname state="unverified" status="present">Smith</Surname>
    </Name>
    <DateOfBirth state="verified" status="present">1980-01-31</DateOfBirth>
    <Phone state="verified" status="missing"/>
    <ResidenceAddress timeframe="current">
      <StreetAddress state="verified" status="present">1 Main St</StreetAddress>
      <StreetAddress state="verified" status="pending">Apt 2</StreetAddress>
      <City state="verified" status="present">Springfield</City>
    </ResidenceAddress>
  </AccessResponse>
</t:TrufinaInfoResponse>"#;

pub(crate) const INLINE_ERROR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TrufinaInfoResponse xmlns="http://www.trufina.com/truapi/1/0">
  <TNID>tnid-0</TNID>
  <Error xmlns="">Unknown TNID</Error>
</TrufinaInfoResponse>"#;
