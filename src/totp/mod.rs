//! Time-based one-time codes (RFC 6238) and `otpauth://` URIs.
//!
//! - `compute` / `compute_at` derive the current code and its remaining
//!   lifetime from a base32 secret.
//! - `build_provisioning_uri` renders an entry as an `otpauth://totp/...` URI.
//! - `parse_otpauth_uri` is a tolerant parser for strings handed over by a
//!   QR-decoding collaborator; anything that is not an otpauth URI is
//!   treated as a raw secret.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use data_encoding::BASE32_NOPAD;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use url::Url;

use crate::errors::{Result, VaultError};
use crate::vault::entry::TotpEntry;

/// Characters escaped in the label part of a provisioning URI.
const LABEL_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b':');

/// Longest accepted code lifetime, in seconds (one day).
pub const MAX_PERIOD: u64 = 86_400;

pub(crate) fn default_digits() -> u32 {
    6
}

pub(crate) fn default_period() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

/// HMAC digest used to derive codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotpAlgorithm {
    #[default]
    #[serde(rename = "SHA1")]
    Sha1,
    #[serde(rename = "SHA256")]
    Sha256,
    #[serde(rename = "SHA512")]
    Sha512,
}

impl TotpAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

impl fmt::Display for TotpAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TotpAlgorithm {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace('-', "").as_str() {
            "SHA1" => Ok(Self::Sha1),
            "SHA256" => Ok(Self::Sha256),
            "SHA512" => Ok(Self::Sha512),
            other => Err(VaultError::Totp(format!(
                "unsupported algorithm '{other}'; expected SHA1, SHA256 or SHA512"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Code derivation
// ---------------------------------------------------------------------------

/// How close a code is to expiring, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// More than 60% of the period left.
    Fresh,
    /// More than 30% left.
    Aging,
    Expiring,
}

/// A derived code and how long it stays valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpCode {
    pub code: String,
    /// Seconds until the next period boundary (1..=period).
    pub remaining: u64,
    pub period: u64,
}

impl TotpCode {
    pub fn urgency(&self) -> Urgency {
        urgency(self.remaining, self.period)
    }
}

/// Classify `remaining` seconds of a `period`.
pub fn urgency(remaining: u64, period: u64) -> Urgency {
    // remaining > 0.6 * period, widened so no product can overflow.
    let (remaining, period) = (u128::from(remaining) * 10, u128::from(period));
    if remaining > period * 6 {
        Urgency::Fresh
    } else if remaining > period * 3 {
        Urgency::Aging
    } else {
        Urgency::Expiring
    }
}

/// Derive the code for the current wall-clock time.
pub fn compute(
    secret: &str,
    algorithm: TotpAlgorithm,
    digits: u32,
    period: u64,
) -> Result<TotpCode> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| VaultError::Totp(format!("system clock before 1970: {e}")))?
        .as_secs();
    compute_at(secret, algorithm, digits, period, now)
}

/// Derive the code valid at `unix_time` (seconds).
pub fn compute_at(
    secret: &str,
    algorithm: TotpAlgorithm,
    digits: u32,
    period: u64,
    unix_time: u64,
) -> Result<TotpCode> {
    check_shape(digits, period)?;
    let key = decode_secret(secret)?;

    let counter = unix_time / period;
    let value = match algorithm {
        TotpAlgorithm::Sha1 => hotp::<Hmac<Sha1>>(&key, counter)?,
        TotpAlgorithm::Sha256 => hotp::<Hmac<Sha256>>(&key, counter)?,
        TotpAlgorithm::Sha512 => hotp::<Hmac<Sha512>>(&key, counter)?,
    };
    let code = value % 10u32.pow(digits);

    Ok(TotpCode {
        code: format!("{code:0width$}", width = digits as usize),
        remaining: period - (unix_time % period),
        period,
    })
}

/// RFC 4226 dynamic truncation over HMAC(key, counter).
fn hotp<M: Mac + KeyInit>(key: &[u8], counter: u64) -> Result<u32> {
    let mut mac = <M as Mac>::new_from_slice(key)
        .map_err(|e| VaultError::Totp(format!("invalid key: {e}")))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let bytes = [
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ];
    Ok(u32::from_be_bytes(bytes))
}

/// Decode a base32 secret, ignoring whitespace, case and `=` padding.
pub fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if normalized.is_empty() {
        return Err(VaultError::Totp("secret is empty".into()));
    }
    BASE32_NOPAD
        .decode(normalized.as_bytes())
        .map_err(|_| VaultError::Totp("secret is not valid base32".into()))
}

fn check_shape(digits: u32, period: u64) -> Result<()> {
    if digits != 6 && digits != 8 {
        return Err(VaultError::Totp(format!(
            "digits must be 6 or 8 (got {digits})"
        )));
    }
    if period == 0 || period > MAX_PERIOD {
        return Err(VaultError::Totp(format!(
            "period must be between 1 and {MAX_PERIOD} seconds (got {period})"
        )));
    }
    Ok(())
}

/// Check everything a stored entry needs to produce codes.
pub fn validate_parameters(secret: &str, digits: u32, period: u64) -> Result<()> {
    check_shape(digits, period)?;
    decode_secret(secret).map(|_| ())
}

// ---------------------------------------------------------------------------
// otpauth URIs
// ---------------------------------------------------------------------------

/// Render `entry` as `otpauth://totp/{label}?secret=..&issuer=..&digits=..&period=..&algorithm=..`.
///
/// The label is `issuer:account` when both are set, otherwise the entry
/// name. An empty issuer is left out of the query.
pub fn build_provisioning_uri(entry: &TotpEntry) -> String {
    let label = if !entry.issuer.is_empty() && !entry.account.is_empty() {
        format!("{}:{}", entry.issuer, entry.account)
    } else {
        entry.name.clone()
    };

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("secret", &entry.secret.replace(' ', ""));
    if !entry.issuer.is_empty() {
        query.append_pair("issuer", &entry.issuer);
    }
    query
        .append_pair("digits", &entry.digits.to_string())
        .append_pair("period", &entry.period.to_string())
        .append_pair("algorithm", entry.algorithm.as_str());

    format!(
        "otpauth://totp/{}?{}",
        utf8_percent_encode(&label, LABEL_ESCAPE),
        query.finish()
    )
}

/// Fields recovered from an otpauth URI (or a bare secret).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpauthFields {
    pub secret: Option<String>,
    pub issuer: Option<String>,
    pub account: Option<String>,
    pub algorithm: Option<TotpAlgorithm>,
    pub digits: Option<u32>,
    pub period: Option<u64>,
}

impl OtpauthFields {
    /// Build an entry, filling gaps with SHA1 / 6 digits / 30 s / empty issuer.
    ///
    /// The name is the issuer, else the account, else "2FA".
    pub fn into_entry(self, category: &str) -> Result<TotpEntry> {
        let secret = self
            .secret
            .ok_or_else(|| VaultError::invalid("secret", "not present in the scanned data"))?;
        let issuer = self.issuer.unwrap_or_default();
        let account = self.account.unwrap_or_default();
        let name = [issuer.as_str(), account.as_str()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("2FA")
            .to_string();

        let mut entry = TotpEntry::new(name, secret, category);
        entry.issuer = issuer;
        entry.account = account;
        entry.algorithm = self.algorithm.unwrap_or_default();
        entry.digits = self.digits.unwrap_or_else(default_digits);
        entry.period = self.period.unwrap_or_else(default_period);
        Ok(entry)
    }
}

/// Parse a scanned/pasted string.
///
/// - Not starting with `otpauth://` → the trimmed string is the secret.
/// - A malformed URI yields no fields at all.
/// - Unparseable `digits`/`period`/`algorithm` values are dropped.
/// - `issuer` comes from the query, falling back to the label prefix.
pub fn parse_otpauth_uri(input: &str) -> OtpauthFields {
    let input = input.trim();
    if !input.to_ascii_lowercase().starts_with("otpauth://") {
        let secret = (!input.is_empty()).then(|| input.to_string());
        return OtpauthFields {
            secret,
            ..OtpauthFields::default()
        };
    }

    let Ok(url) = Url::parse(input) else {
        return OtpauthFields::default();
    };

    let mut fields = OtpauthFields::default();

    let raw_label = url.path().trim_start_matches('/');
    let label = percent_decode_str(raw_label).decode_utf8_lossy();
    let mut label_issuer = None;
    match label.split_once(':') {
        Some((issuer, account)) => {
            label_issuer = non_empty(issuer.trim());
            fields.account = non_empty(account.trim());
        }
        None => fields.account = non_empty(label.trim()),
    }

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "secret" => fields.secret = non_empty(value.trim()),
            "issuer" => fields.issuer = non_empty(value.trim()),
            "algorithm" => fields.algorithm = value.parse().ok(),
            "digits" => fields.digits = value.trim().parse().ok(),
            "period" => fields.period = value.trim().parse().ok(),
            _ => {}
        }
    }

    if fields.issuer.is_none() {
        fields.issuer = label_issuer;
    }
    fields
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
