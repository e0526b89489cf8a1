//! CenturyLink-branded Actiontec gateways.
//!
//! The C1000A admin interface is classic early-2010s firmware: every value
//! the UI shows arrives as an inline `var x='...'` assignment and the client
//! list is a pipe-separated blob. Login posts the password base64-encoded
//! together with a session key scraped off the landing page; afterwards the
//! firmware trusts the client address, so no cookie is carried.

use std::net::SocketAddr;

use base64::prelude::*;

use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::routers::{ConnectionType, Driver, Router, RouterClient, RouterDescriptor};
use crate::scrape::between;

const DESCRIPTOR: RouterDescriptor = RouterDescriptor {
    manufacturer: "CenturyLink",
    model: "C1000A",
    firmware_baseline: "CAC003-31.30L.86",
};

/// The landing page serves this assignment when a login is required. Seeing
/// it again on an authenticated path means the firmware dropped the session
/// and put the login page where the content should be.
const LOGIN_PAGE_MARKER: &str = "var sessionKey = '";

pub(crate) const DRIVER: Driver = Driver {
    descriptor: DESCRIPTOR,
    matches_fingerprint,
    login: login_boxed,
};

/// Matches the landing page this firmware serves before login.
pub(crate) fn matches_fingerprint(page: &str) -> bool {
    page.contains("Actiontec C1000A") || page.contains("var board_id='C1000A';")
}

fn login_boxed(username: &str, password: &str, addr: SocketAddr) -> Result<Box<dyn Router>> {
    Ok(Box::new(C1000A::login(username, password, addr)?))
}

/// A logged-in session against a C1000A.
pub struct C1000A {
    http: HttpClient,
    logged_in: bool,
}

impl C1000A {
    /// Runs the login handshake and returns a logged-in driver.
    ///
    /// A landing page without the session-key assignment means the firmware
    /// already trusts this client address and no credentials are posted.
    pub fn login(username: &str, password: &str, addr: SocketAddr) -> Result<Self> {
        let http = HttpClient::new(addr);
        let landing = http.get("/", &[])?;
        if landing.body.contains(LOGIN_PAGE_MARKER) {
            let session_key = between(&landing.body, LOGIN_PAGE_MARKER, "'")?;
            let password = BASE64_STANDARD.encode(password);
            http.post_form(
                "/login.cgi",
                &[
                    ("adminUserName", username),
                    ("adminPassword", &password),
                    ("sessionKey", session_key),
                    ("nothankyou", "1"),
                ],
                &[],
            )?;
            let check = http.get("/login.html", &[])?;
            if check.body.contains("not valid") {
                return Err(Error::InvalidCredentials);
            }
        }
        Ok(Self {
            http,
            logged_in: true,
        })
    }

    fn authenticated_get(&mut self, path: &str) -> Result<String> {
        if !self.logged_in {
            return Err(Error::NotLoggedIn);
        }
        let response = self.http.get(path, &[])?;
        if response.body.contains(LOGIN_PAGE_MARKER) {
            self.logged_in = false;
            return Err(Error::SessionExpired);
        }
        Ok(response.body)
    }

    /// The firmware wants the whole wireless form resent for any change, so
    /// radio toggles and SSID writes all go through here.
    fn apply_wireless(&mut self, radio_on: bool, ssid: &str) -> Result<()> {
        if !self.logged_in {
            return Err(Error::NotLoggedIn);
        }
        let response = self.http.post_form(
            "/wirelesssetup_basicsettings.wl",
            &[
                ("wlRadio", if radio_on { "1" } else { "0" }),
                ("wlSsid_wl0v0", ssid),
                ("aeiwlDisabledByGui", "0"),
                ("needthankyou", "1"),
            ],
            &[],
        )?;
        if response.body.contains(LOGIN_PAGE_MARKER) {
            self.logged_in = false;
            return Err(Error::SessionExpired);
        }
        Ok(())
    }
}

/// One entry of the pipe-separated active-user list.
fn parse_client(entry: &str) -> Result<RouterClient> {
    let space = entry.find(' ').ok_or(Error::MarkerNotFound(" "))?;
    let ip_address = entry[..space]
        .parse()
        .map_err(|_| Error::MarkerNotFound("ip"))?;
    let name = between(entry, "&#40;", "&#41;")?.to_string();
    let first_slash = entry.find('/').ok_or(Error::MarkerNotFound("/"))?;
    let second_slash =
        entry[first_slash + 1..].find('/').ok_or(Error::MarkerNotFound("/"))? + first_slash + 1;
    let mut fields = entry[second_slash + 1..].splitn(3, '/');
    let mac_address = fields.next().ok_or(Error::MarkerNotFound("/"))?.to_string();
    let connection_type = match fields.next().ok_or(Error::MarkerNotFound("/"))? {
        "802.11" => ConnectionType::Wifi,
        "Ethernet" => ConnectionType::Wired,
        _ => ConnectionType::Unknown,
    };
    Ok(RouterClient::new(name, ip_address, mac_address, connection_type))
}

impl Router for C1000A {
    fn descriptor(&self) -> RouterDescriptor {
        DESCRIPTOR
    }

    fn is_online(&mut self) -> bool {
        let Ok(page) = self.authenticated_get("/modemstatus_home.html") else {
            return false;
        };
        let Ok(phy) = between(&page, "var phy_status='", "'") else {
            return false;
        };
        let Ok(isp) = between(&page, "var ISP_status='", "'") else {
            return false;
        };
        let phy = phy.to_ascii_lowercase();
        let isp = isp.to_ascii_lowercase();
        !(phy.contains("not") || isp.contains("not"))
    }

    fn firmware_version(&mut self) -> Result<String> {
        let page = self.authenticated_get("/modemstatus_home.html")?;
        Ok(between(&page, "var soft_ver='", "'")?.to_string())
    }

    fn ssid(&mut self) -> Result<String> {
        let page = self.authenticated_get("/wirelesssetup_basicsettings.html")?;
        Ok(between(&page, "gv_ssid = \"", "\"")?.to_string())
    }

    fn set_ssid(&mut self, ssid: &str) -> Result<()> {
        self.apply_wireless(true, ssid)
    }

    fn network_key(&mut self) -> Result<String> {
        let page = self.authenticated_get("/wirelesssetup_basicsettings.html")?;
        Ok(between(&page, "gv_wpapsk_key  =\"", "\"")?.to_string())
    }

    fn enable_radio(&mut self) -> Result<()> {
        let ssid = self.ssid()?;
        self.apply_wireless(true, &ssid)
    }

    fn disable_radio(&mut self) -> Result<()> {
        let ssid = self.ssid()?;
        self.apply_wireless(false, &ssid)
    }

    fn clients(&mut self) -> Result<Vec<RouterClient>> {
        let page = self.authenticated_get("/modemstatus_activeuserlist_refresh.html")?;
        page.split('|')
            .filter(|entry| entry.contains(' '))
            .map(parse_client)
            .collect()
    }

    fn reboot(&mut self) -> Result<bool> {
        if !self.logged_in {
            return Err(Error::NotLoggedIn);
        }
        let response = self.http.post_form("/rebootinfo.cgi", &[("Reboot", "1")], &[])?;
        if response.status == 200 {
            // The device is going down; the session dies with it.
            self.logged_in = false;
            return Ok(true);
        }
        Ok(false)
    }

    fn logout(&mut self) {
        if self.logged_in {
            self.logged_in = false;
            let _ = self.http.post_form("/logout.cgi", &[], &[]);
        }
    }
}

impl Drop for C1000A {
    fn drop(&mut self) {
        self.logout();
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_ROOT_PAGE: &str = "<html><head><title>Actiontec C1000A Modem GUI\
</title></head><body><script>var sessionKey = '8A1F00C3';var board_id='C1000A';\
</script></body></html>";
