//! Asus RT-AC68U.
//!
//! AsusWRT is half-modern firmware: login hands back an `asus_token` cookie,
//! the client list is JSON buried in a script body, and everything else is
//! still scraped out of `index.asp`. Every request must carry the vanity
//! hostname the firmware expects. An expired session answers HTTP 200 with a
//! redirect stub to the login page, and that stub is the only expiry signal
//! there is.

use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::prelude::*;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::routers::{ConnectionType, Driver, Router, RouterClient, RouterDescriptor};
use crate::scrape::between;

const DESCRIPTOR: RouterDescriptor = RouterDescriptor {
    manufacturer: "Asus",
    model: "RT-AC68U",
    firmware_baseline: "3.0.0.4",
};

const ASUS_HOST: &str = "router.asus.com";

/// Expired sessions answer 200 with this stub in place of content.
const EXPIRY_MARKER: &str = "<script>top.location.href='/Main_Login.asp';";

/// Attachment kinds by the `isWL` index the client list reports.
const CONNECTION_TYPES: [ConnectionType; 4] = [
    ConnectionType::Wired,
    ConnectionType::Vendor("wifi 2.4GHz"),
    ConnectionType::Vendor("wifi 5GHz/5GHz-1"),
    ConnectionType::Vendor("wifi 5Ghz-2"),
];

pub(crate) const DRIVER: Driver = Driver {
    descriptor: DESCRIPTOR,
    matches_fingerprint,
    login: login_boxed,
};

/// Matches the login shell served to unauthenticated clients: the redirect
/// stub plus the model badge markup.
pub(crate) fn matches_fingerprint(page: &str) -> bool {
    if !page.contains("top.location.href='/Main_Login.asp';") {
        return false;
    }
    let document = Html::parse_document(page);
    let selector = Selector::parse(".prod_madelName").unwrap();
    document
        .select(&selector)
        .any(|badge| badge.text().collect::<String>().contains(DESCRIPTOR.model))
}

fn login_boxed(username: &str, password: &str, addr: SocketAddr) -> Result<Box<dyn Router>> {
    Ok(Box::new(RtAc68u::login(username, password, addr)?))
}

fn referer(page: &str) -> String {
    format!("http://{}/{}", ASUS_HOST, page)
}

fn millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// A logged-in session holding the `asus_token` cookie.
pub struct RtAc68u {
    http: HttpClient,
    token: String,
    logged_in: bool,
}

impl RtAc68u {
    /// Runs the login handshake and returns a logged-in driver.
    pub fn login(username: &str, password: &str, addr: SocketAddr) -> Result<Self> {
        let http = HttpClient::new(addr);
        let login_referer = referer("Main_Login.asp");
        // The firmware wants the login page fetched before it accepts a POST.
        http.get(
            "/Main_Login.asp",
            &[("Host", ASUS_HOST), ("Referer", &login_referer)],
        )?;
        let authorization = BASE64_STANDARD.encode(format!("{}:{}", username, password));
        let response = http.post_form(
            "/login.cgi",
            &[
                ("group_id", ""),
                ("action_mode", ""),
                ("action_script", ""),
                ("action_wait", "5"),
                ("current_page", "Main_Login.asp"),
                ("next_page", "index.asp"),
                ("login_authorization", &authorization),
                ("login_captcha", ""),
            ],
            &[("Host", ASUS_HOST), ("Referer", &login_referer)],
        )?;
        let token = response
            .session_cookie("asus_token")
            .ok_or(Error::InvalidCredentials)?;
        Ok(Self {
            http,
            token,
            logged_in: true,
        })
    }

    fn authenticated_get(&mut self, path: &str, referer_page: &str) -> Result<String> {
        if !self.logged_in {
            return Err(Error::NotLoggedIn);
        }
        let referer = referer(referer_page);
        let response = self.http.get(
            path,
            &[
                ("Host", ASUS_HOST),
                ("Referer", &referer),
                ("Cookie", &self.token),
            ],
        )?;
        if response.body.contains(EXPIRY_MARKER) {
            self.logged_in = false;
            return Err(Error::SessionExpired);
        }
        Ok(response.body)
    }

    /// Seconds since boot, from the ajax status document.
    pub fn uptime(&mut self) -> Result<Duration> {
        let path = format!("/ajax_status.xml?hash={}", millis());
        let page = self.authenticated_get(&path, "index.asp")?;
        let seconds = between(&page, "(", " secs since boot")?.trim();
        let seconds: u64 = seconds
            .parse()
            .map_err(|_| Error::MarkerNotFound(" secs since boot"))?;
        Ok(Duration::from_secs(seconds))
    }
}

fn optional_string(entry: &Value, field: &str) -> Option<String> {
    entry
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn signal_strength(entry: &Value) -> Option<i64> {
    match entry.get("rssi") {
        Some(Value::Number(number)) => number.as_i64(),
        Some(Value::String(text)) => text.parse().ok(),
        _ => None,
    }
}

fn connection_type(entry: &Value) -> ConnectionType {
    let index = match entry.get("isWL") {
        Some(Value::Number(number)) => number.as_u64(),
        Some(Value::String(text)) => text.parse().ok(),
        _ => None,
    };
    index
        .and_then(|index| CONNECTION_TYPES.get(index as usize))
        .copied()
        .unwrap_or(ConnectionType::Unknown)
}

/// One networkmap entry, keyed by MAC address.
fn parse_client(mac: &str, entry: &Value) -> Result<RouterClient> {
    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .ok_or(Error::MarkerNotFound("name"))?;
    let ip_address = entry
        .get("ip")
        .and_then(Value::as_str)
        .ok_or(Error::MarkerNotFound("ip"))?
        .parse()
        .map_err(|_| Error::MarkerNotFound("ip"))?;
    let mut client = RouterClient::new(
        name.to_string(),
        ip_address,
        mac.to_string(),
        connection_type(entry),
    );
    client.online = Some(entry.get("isOnline").and_then(Value::as_i64) == Some(1));
    client.vendor = optional_string(entry, "vendor");
    client.nickname = optional_string(entry, "nickName");
    client.ip_method = optional_string(entry, "ipMethod");
    client.internet_allowed = entry
        .get("internetMode")
        .and_then(Value::as_str)
        .map(|mode| mode == "allow");
    client.signal_strength = signal_strength(entry);
    Ok(client)
}

impl Router for RtAc68u {
    fn descriptor(&self) -> RouterDescriptor {
        DESCRIPTOR
    }

    fn is_online(&mut self) -> bool {
        match self.authenticated_get("/index.asp", "index.asp") {
            Ok(page) => between(&page, "wanlink_statusstr() { return '", "'")
                .map(|status| status == "Connected")
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    fn firmware_version(&mut self) -> Result<String> {
        let page = self.authenticated_get("/index.asp", "index.asp")?;
        Ok(between(&page, "\"firmver\" value=\"", "\">")?.to_string())
    }

    fn ssid(&mut self) -> Result<String> {
        let page = self.authenticated_get("/Advanced_Wireless_Content.asp", "Advanced_Wireless_Content.asp")?;
        let ssid = between(&page, "\"wl_ssid_org\" value=\"", "\">")?;
        Ok(urlencoding::decode(ssid)
            .map_err(|_| Error::MarkerNotFound("wl_ssid_org"))?
            .into_owned())
    }

    fn set_ssid(&mut self, _ssid: &str) -> Result<()> {
        if !self.logged_in {
            return Err(Error::NotLoggedIn);
        }
        // Wireless writes on this firmware go through a multi-page apply
        // wizard the driver does not drive; accepted as a no-op.
        Ok(())
    }

    fn network_key(&mut self) -> Result<String> {
        let page = self.authenticated_get("/Advanced_Wireless_Content.asp", "Advanced_Wireless_Content.asp")?;
        let key = between(&page, "\"wl_wpa_psk_org\" value=\"", "\">")?;
        Ok(urlencoding::decode(key)
            .map_err(|_| Error::MarkerNotFound("wl_wpa_psk_org"))?
            .into_owned())
    }

    fn enable_radio(&mut self) -> Result<()> {
        if !self.logged_in {
            return Err(Error::NotLoggedIn);
        }
        Ok(())
    }

    fn disable_radio(&mut self) -> Result<()> {
        if !self.logged_in {
            return Err(Error::NotLoggedIn);
        }
        Ok(())
    }

    fn clients(&mut self) -> Result<Vec<RouterClient>> {
        let path = format!("/update_clients.asp?_={}", millis());
        let page = self.authenticated_get(&path, "index.asp")?;
        let raw = between(&page, "fromNetworkmapd :", "nmpClient")?
            .trim()
            .trim_end_matches(',');
        let parsed: Value = serde_json::from_str(raw)?;
        let table = parsed
            .get(0)
            .and_then(Value::as_object)
            .ok_or(Error::MarkerNotFound("fromNetworkmapd"))?;
        let mut clients = Vec::new();
        for (mac, entry) in table {
            if mac == "maclist" {
                continue;
            }
            clients.push(parse_client(mac, entry)?);
        }
        Ok(clients)
    }

    fn reboot(&mut self) -> Result<bool> {
        if !self.logged_in {
            return Err(Error::NotLoggedIn);
        }
        let apply_referer = referer("apply.asp");
        let response = self.http.post_form(
            "/apply.cgi",
            &[
                ("action_mode", "reboot"),
                ("action_script", ""),
                ("action_wait", "140"),
            ],
            &[
                ("Host", ASUS_HOST),
                ("Referer", &apply_referer),
                ("Cookie", &self.token),
            ],
        )?;
        if response.status == 200 {
            self.logged_in = false;
            return Ok(true);
        }
        Ok(false)
    }

    fn logout(&mut self) {
        if self.logged_in {
            self.logged_in = false;
            let logout_referer = referer("Logout.asp");
            let _ = self.http.get(
                "/Logout.asp",
                &[
                    ("Host", ASUS_HOST),
                    ("Referer", &logout_referer),
                    ("Cookie", &self.token),
                ],
            );
        }
    }
}

impl Drop for RtAc68u {
    fn drop(&mut self) {
        self.logout();
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_ROOT_PAGE: &str = "<html><head>\
<script>top.location.href='/Main_Login.asp';</script></head>\
<body><div class=\"login_banner\"><div class=\"prod_madelName\">RT-AC68U</div></div>\
</body></html>";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{http_200, http_200_with_cookie, http_500, serve_script};

    const INDEX_ONLINE: &str = "<input type=\"hidden\" name=\"firmver\" value=\"3.0.0.4.386\">\
<script>function wanlink_statusstr() { return 'Connected';}</script>";
    const INDEX_OFFLINE: &str = "<input type=\"hidden\" name=\"firmver\" value=\"3.0.0.4.386\">\
<script>function wanlink_statusstr() { return 'Disconnected';}</script>";

    fn logged_in_with(responses: Vec<String>) -> RtAc68u {
        let mut script = vec![
            http_200(SAMPLE_ROOT_PAGE),
            http_200_with_cookie("asus_token=tok3n; Path=/; HttpOnly", ""),
        ];
        script.extend(responses);
        let addr = serve_script(script);
        RtAc68u::login("admin", "hunter2", addr).unwrap()
    }

    #[test]
    fn fingerprint_needs_redirect_stub_and_model_badge() {
        assert!(matches_fingerprint(SAMPLE_ROOT_PAGE));
        // Redirect stub alone could be any AsusWRT build.
        assert!(!matches_fingerprint(
            "<script>top.location.href='/Main_Login.asp';</script>"
        ));
        // Same shell, different model.
        assert!(!matches_fingerprint(
            "<script>top.location.href='/Main_Login.asp';</script>\
<div class=\"prod_madelName\">RT-AC5300</div>"
        ));
    }

    #[test]
    fn login_captures_session_token() {
        let mut router = logged_in_with(vec![]);
        assert_eq!(router.token, "asus_token=tok3n");
        assert_eq!(router.descriptor().model, "RT-AC68U");
        router.logout();
    }

    #[test]
    fn login_without_token_cookie_is_rejected() {
        let addr = serve_script(vec![
            http_200(SAMPLE_ROOT_PAGE),
            http_200("<html>try again</html>"),
        ]);
        match RtAc68u::login("admin", "wrong", addr) {
            Err(Error::InvalidCredentials) => {}
            other => panic!("expected InvalidCredentials, got {:?}", other.err()),
        }
    }

    #[test]
    fn wan_status_from_index_page() {
        let mut router = logged_in_with(vec![http_200(INDEX_ONLINE), http_200(INDEX_OFFLINE)]);
        assert!(router.is_online());
        assert!(!router.is_online());
    }

    #[test]
    fn scrapes_firmware_version() {
        let mut router = logged_in_with(vec![http_200(INDEX_ONLINE)]);
        assert_eq!(router.firmware_version().unwrap(), "3.0.0.4.386");
    }

    #[test]
    fn wireless_values_are_percent_decoded() {
        let page = "<input name=\"wl_ssid_org\" value=\"My%20Network\">\
<input name=\"wl_wpa_psk_org\" value=\"p%40ssword\">";
        let mut router = logged_in_with(vec![http_200(page), http_200(page)]);
        assert_eq!(router.ssid().unwrap(), "My Network");
        assert_eq!(router.network_key().unwrap(), "p@ssword");
    }

    #[test]
    fn set_ssid_is_an_accepted_noop() {
        let mut router = logged_in_with(vec![]);
        router.set_ssid("whatever").unwrap();
        router.logout();
        assert!(matches!(router.set_ssid("x"), Err(Error::NotLoggedIn)));
    }

    #[test]
    fn parses_client_list_json() {
        let body = "networkmap_fullscan: 0,fromNetworkmapd : [{\"maclist\":\
[\"A1:B2:C3:D4:E5:F6\"],\"A1:B2:C3:D4:E5:F6\":{\"name\":\"desktop\",\"nickName\":\"\",\
\"ip\":\"192.168.1.23\",\"ipMethod\":\"Static\",\"isOnline\":1,\"vendor\":\"ASUSTek\",\
\"internetMode\":\"allow\",\"rssi\":\"-42\",\"isWL\":\"2\"}}] ,nmpClient : [{}]";
        let mut router = logged_in_with(vec![http_200(body)]);
        let clients = router.clients().unwrap();
        assert_eq!(clients.len(), 1);
        let client = &clients[0];
        assert_eq!(client.name, "desktop");
        assert_eq!(client.mac_address, "A1:B2:C3:D4:E5:F6");
        assert_eq!(client.ip_address.to_string(), "192.168.1.23");
        assert_eq!(client.connection_type, ConnectionType::Vendor("wifi 5GHz/5GHz-1"));
        assert_eq!(client.online, Some(true));
        assert_eq!(client.vendor.as_deref(), Some("ASUSTek"));
        assert_eq!(client.nickname, None);
        assert_eq!(client.ip_method.as_deref(), Some("Static"));
        assert_eq!(client.internet_allowed, Some(true));
        assert_eq!(client.signal_strength, Some(-42));
    }

    #[test]
    fn expired_session_during_client_list() {
        let mut router = logged_in_with(vec![http_200(EXPIRY_MARKER)]);
        match router.clients() {
            Err(Error::SessionExpired) => {}
            other => panic!("expected SessionExpired, got {:?}", other.err()),
        }
        // Logged out now; no network attempt is made.
        assert!(!router.is_online());
        assert!(matches!(router.clients(), Err(Error::NotLoggedIn)));
    }

    #[test]
    fn reboot_ends_the_session() {
        let mut router = logged_in_with(vec![http_200("<html></html>")]);
        assert!(router.reboot().unwrap());
        assert!(matches!(router.firmware_version(), Err(Error::NotLoggedIn)));
    }

    #[test]
    fn refused_reboot_keeps_the_session() {
        let mut router = logged_in_with(vec![http_500(""), http_200(INDEX_ONLINE)]);
        assert!(!router.reboot().unwrap());
        assert!(router.is_online());
    }

    #[test]
    fn uptime_from_ajax_status() {
        let body = "<devicemap><wan>Sat, 23 May 2020 11:06:14 GMT(604800 secs since boot)\
</wan></devicemap>";
        let mut router = logged_in_with(vec![http_200(body)]);
        assert_eq!(router.uptime().unwrap(), Duration::from_secs(604800));
    }

    #[test]
    fn logout_is_idempotent() {
        let mut router = logged_in_with(vec![]);
        router.logout();
        router.logout();
        assert!(!router.is_online());
    }
}
