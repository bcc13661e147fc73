use chrono::{DateTime, Duration, TimeZone};
use std::fmt::Display;

/// Where the fabricated previous login came from.
pub const LAST_LOGIN_FROM: &str = "192.168.1.5";

/// Render the Ubuntu-style login banner shown before the first prompt.
///
/// `now` drives the "System information" stamp; the last login is placed
/// two days earlier.
pub fn render_banner<Tz>(now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let stamp = now.format("%a %b %d %H:%M:%S %Y");
    let last_login = (now.clone() - Duration::days(2)).format("%a %b %d %H:%M:%S %Y");
    format!(
        "\r\nWelcome to Ubuntu 20.04.5 LTS (GNU/Linux 5.4.0-146-generic x86_64)\r\n\r\n\
         \x20* Documentation:  https://help.ubuntu.com\r\n\
         \x20* Management:     https://landscape.canonical.com\r\n\
         \x20* Support:        https://ubuntu.com/advantage\r\n\r\n\
         \x20 System information as of {stamp}\r\n\r\n\
         \x20 System load:  0.08              Processes:             128\r\n\
         \x20 Usage of /:   42.6% of 30.88GB   Users logged in:       1\r\n\
         \x20 Memory usage: 38%                IPv4 address for eth0: 10.0.2.15\r\n\r\n\
         Last login: {last_login} from {LAST_LOGIN_FROM}\r\n"
    )
}
