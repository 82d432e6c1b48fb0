// ── Device provisioning ──
//
// Device records live under different paths and field layouts depending
// on which guest/MPSK modules a deployment runs. Creation and secret
// updates walk (path x payload) tables until the platform answers 2xx.
// Unlike host lists there is no reliable read-back, so a 2xx is the
// success signal here.

use macgate_api::{PlatformClient, RawResponse, Verb};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::endpoint;
use crate::error::CoreError;
use crate::model::{MacAddress, MacStyle};
use crate::secret;

// ── Targets ─────────────────────────────────────────────────────────

/// A device path: either addressed by MAC (written with PUT/PATCH) or a
/// collection (written with POST).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceTarget {
    ByMac(&'static str, MacStyle),
    Collection(&'static str),
}

impl DeviceTarget {
    fn path(self, mac: &MacAddress) -> String {
        match self {
            Self::ByMac(prefix, style) => format!("{prefix}/{}", mac.format(style)),
            Self::Collection(path) => path.to_owned(),
        }
    }

    fn create_verb(self) -> Verb {
        match self {
            Self::ByMac(..) => Verb::Put,
            Self::Collection(_) => Verb::Post,
        }
    }
}

const CREATE_TARGETS: &[DeviceTarget] = &[
    DeviceTarget::ByMac("device/mac", MacStyle::ColonLower),
    DeviceTarget::ByMac("devices", MacStyle::ColonLower),
    DeviceTarget::ByMac("guest/device", MacStyle::ColonLower),
    DeviceTarget::ByMac("guest/devices", MacStyle::ColonLower),
    DeviceTarget::ByMac("identity/device", MacStyle::ColonLower),
    DeviceTarget::ByMac("device/mac", MacStyle::HyphenUpper),
    DeviceTarget::ByMac("devices", MacStyle::HyphenUpper),
    DeviceTarget::ByMac("device/mac", MacStyle::Bare),
    DeviceTarget::ByMac("devices", MacStyle::Bare),
    DeviceTarget::ByMac("network/mpsk/device", MacStyle::ColonLower),
    DeviceTarget::ByMac("network/mpsk/devices", MacStyle::ColonLower),
    DeviceTarget::Collection("device"),
    DeviceTarget::Collection("devices"),
    DeviceTarget::Collection("guest/device"),
    DeviceTarget::Collection("guest/devices"),
];

const SECRET_TARGETS: &[DeviceTarget] = &[
    DeviceTarget::ByMac("device/mac", MacStyle::ColonLower),
    DeviceTarget::ByMac("device/mac", MacStyle::HyphenUpper),
    DeviceTarget::ByMac("device/mac", MacStyle::Bare),
    DeviceTarget::ByMac("devices", MacStyle::ColonLower),
    DeviceTarget::ByMac("guest/device", MacStyle::ColonLower),
    DeviceTarget::ByMac("guest/devices", MacStyle::ColonLower),
    DeviceTarget::ByMac("identity/device", MacStyle::ColonLower),
    DeviceTarget::ByMac("network/mpsk/device", MacStyle::ColonLower),
    DeviceTarget::ByMac("network/mpsk/devices", MacStyle::ColonLower),
    DeviceTarget::ByMac("static-host-list/device", MacStyle::ColonLower),
    DeviceTarget::ByMac("config/device", MacStyle::ColonLower),
];

/// Role assigned by `provision` when none is given.
pub const DEFAULT_ROLE_ID: u32 = 2;

// ── Results ─────────────────────────────────────────────────────────

/// One write that the platform answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceWrite {
    pub path: String,
    pub method: String,
    pub status: u16,
    pub payload: Value,
    pub response: Value,
}

impl DeviceWrite {
    fn new(path: String, verb: Verb, payload: Value, raw: &RawResponse) -> Self {
        Self {
            path,
            method: verb.to_string(),
            status: raw.status,
            payload,
            response: response_json(raw),
        }
    }
}

/// Outcome of a device cascade.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceOutcome {
    Applied(DeviceWrite),
    /// No device path accepted; an endpoint record was created instead.
    Fallback(Value),
    Failed { attempts: usize, detail: String },
}

impl DeviceOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Applied(write) => json!({ "method": "direct", "write": write }),
            Self::Fallback(record) => json!({ "method": "fallback", "endpoint": record }),
            Self::Failed { attempts, detail } => {
                json!({ "attempts": attempts, "detail": detail })
            }
        }
    }
}

/// Result of one provisioning step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub success: bool,
    pub path: String,
    pub method: Option<String>,
    pub status: Option<u16>,
    pub detail: Value,
}

/// Everything `provision` did, including the generated secret.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub mac: MacAddress,
    pub email: String,
    pub device_name: String,
    pub role_id: u32,
    pub secret: SecretString,
    pub creation: StepResult,
    pub secret_step: StepResult,
}

impl ProvisionReport {
    pub fn to_json(&self) -> Value {
        json!({
            "mac_address": self.mac,
            "email": self.email,
            "device_name": self.device_name,
            "role_id": self.role_id,
            "secret": self.secret.expose_secret(),
            "device_creation": self.creation,
            "secret_setting": self.secret_step,
        })
    }
}

// ── Payloads ────────────────────────────────────────────────────────

fn default_name(mac: &MacAddress) -> String {
    format!("Device-{}", mac.suffix())
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Attribute form, guest form, simple form.
fn create_payloads(mac: &MacAddress, email: &str, name: &str) -> [Value; 3] {
    let colon = mac.format(MacStyle::ColonLower);
    let now = timestamp();
    [
        json!({
            "mac_address": colon,
            "status": "Known",
            "attributes": {
                "email": email,
                "device_name": name,
                "registration_time": now,
                "mpsk_enabled": true,
            },
        }),
        json!({
            "mac": colon,
            "mac_address": colon,
            "username": email,
            "email": email,
            "display_name": name,
            "enabled": true,
            "notes": format!("Created via macgate on {now}"),
            "mpsk_enabled": true,
        }),
        json!({
            "mac": colon,
            "email": email,
            "name": name,
            "status": "Known",
            "mpsk_enabled": true,
        }),
    ]
}

fn secret_payloads(mac: &MacAddress, secret: &str) -> [Value; 6] {
    [
        json!({ "attributes": { "mpsk": secret } }),
        json!({ "mpsk": secret }),
        json!({ "mpsk_password": secret }),
        json!({
            "mac_address": mac.format(MacStyle::ColonLower),
            "attributes": { "mpsk": secret, "mpsk_enabled": true },
        }),
        json!({ "network": { "mpsk": secret } }),
        json!({ "wlan": { "mpsk": secret } }),
    ]
}

/// PUT bodies must identify the device; add `mac_address` and `status`
/// when the PATCH body did not carry them.
fn put_variant(payload: &Value, mac: &MacAddress) -> Value {
    let mut body = payload.clone();
    if let Value::Object(map) = &mut body {
        if !map.contains_key("mac_address") {
            map.insert(
                "mac_address".into(),
                Value::String(mac.format(MacStyle::ColonLower)),
            );
            map.insert("status".into(), Value::String("Known".into()));
        }
    }
    body
}

fn response_json(raw: &RawResponse) -> Value {
    if raw.body.trim().is_empty() {
        json!({ "status": "no content returned" })
    } else {
        raw.json().unwrap_or_else(|| Value::String(raw.preview()))
    }
}

// ── Operations ──────────────────────────────────────────────────────

/// Create a device record, trying every known path and payload layout.
///
/// Falls back to an endpoint record when no device path accepts.
pub async fn create_device(
    client: &PlatformClient,
    mac: &MacAddress,
    email: &str,
    name: Option<&str>,
) -> Result<DeviceOutcome, CoreError> {
    let name = name.map_or_else(|| default_name(mac), str::to_owned);
    let payloads = create_payloads(mac, email, &name);

    let mut attempts = 0;
    let mut detail = String::new();
    for target in CREATE_TARGETS {
        let path = target.path(mac);
        let verb = target.create_verb();
        for payload in &payloads {
            attempts += 1;
            match send(client, verb, &path, payload).await {
                Ok(raw) if raw.is_success() => {
                    info!(%mac, path = %path, %verb, "device created");
                    return Ok(DeviceOutcome::Applied(DeviceWrite::new(
                        path,
                        verb,
                        payload.clone(),
                        &raw,
                    )));
                }
                Ok(raw) => detail = format!("{verb} {path}: HTTP {}: {}", raw.status, raw.preview()),
                Err(e) => detail = format!("{verb} {path}: {e}"),
            }
        }
    }

    warn!(%mac, attempts, "no device path accepted, creating endpoint record");
    match endpoint::add_endpoint(client, mac, None).await {
        Ok(record) => Ok(DeviceOutcome::Fallback(record)),
        Err(e) => Ok(DeviceOutcome::Failed {
            attempts: attempts + 1,
            detail: format!("{detail}; endpoint fallback: {e}"),
        }),
    }
}

/// Set a device's secret, PATCH first and PUT when PATCH is refused.
pub async fn set_device_secret(
    client: &PlatformClient,
    mac: &MacAddress,
    secret: &SecretString,
) -> Result<DeviceOutcome, CoreError> {
    let payloads = secret_payloads(mac, secret.expose_secret());

    let mut attempts = 0;
    let mut detail = String::new();
    for target in SECRET_TARGETS {
        let path = target.path(mac);
        for payload in &payloads {
            attempts += 1;
            if let Some(write) = patch_then_put(client, &path, payload, mac, &mut detail).await {
                info!(%mac, path = %write.path, method = %write.method, "device secret set");
                return Ok(DeviceOutcome::Applied(write));
            }
        }
    }

    warn!(%mac, attempts, "no device path accepted the secret");
    Ok(DeviceOutcome::Failed { attempts, detail })
}

/// Create a device with a generated secret, then set the secret.
///
/// Both steps always run. The report carries the secret whatever happened
/// so the operator can apply it by hand.
pub async fn provision(
    client: &PlatformClient,
    mac: &MacAddress,
    email: &str,
    name: Option<&str>,
    role_id: u32,
) -> Result<ProvisionReport, CoreError> {
    let secret = SecretString::from(secret::generate(secret::DEFAULT_LENGTH)?);
    let device_name = name.map_or_else(|| default_name(mac), str::to_owned);
    let colon = mac.format(MacStyle::ColonLower);

    let device = json!({
        "mac": colon,
        "mac_address": colon,
        "status": "Known",
        "role_id": role_id,
        "enabled": true,
        "mpsk_enable": 1,
        "no_password": 1,
        "attributes": {
            "email": email,
            "device_name": device_name,
            "created_at": timestamp(),
            "state": "Active",
        },
    });

    debug!(%mac, "provision step 1: create device");
    let creation = post_then_put(client, "device", &device).await;

    debug!(%mac, "provision step 2: set secret");
    let secret_path = format!("device/mac/{colon}");
    let body = json!({ "mpsk": secret.expose_secret(), "mpsk_enable": 1 });
    let mut detail = String::new();
    let secret_step = match patch_then_put(client, &secret_path, &body, mac, &mut detail).await {
        Some(write) => StepResult {
            success: true,
            path: write.path,
            method: Some(write.method),
            status: Some(write.status),
            detail: write.response,
        },
        None => StepResult {
            success: false,
            path: secret_path,
            method: None,
            status: None,
            detail: Value::String(detail),
        },
    };

    Ok(ProvisionReport {
        mac: mac.clone(),
        email: email.to_owned(),
        device_name,
        role_id,
        secret,
        creation,
        secret_step,
    })
}

// ── Helpers ─────────────────────────────────────────────────────────

async fn send(
    client: &PlatformClient,
    verb: Verb,
    path: &str,
    payload: &Value,
) -> Result<RawResponse, CoreError> {
    let url = client.api_url(path)?;
    Ok(client.send(verb, url, Some(payload)).await?)
}

async fn patch_then_put(
    client: &PlatformClient,
    path: &str,
    payload: &Value,
    mac: &MacAddress,
    detail: &mut String,
) -> Option<DeviceWrite> {
    for (verb, body) in [
        (Verb::Patch, payload.clone()),
        (Verb::Put, put_variant(payload, mac)),
    ] {
        match send(client, verb, path, &body).await {
            Ok(raw) if raw.is_success() => {
                return Some(DeviceWrite::new(path.to_owned(), verb, body, &raw));
            }
            Ok(raw) => *detail = format!("{verb} {path}: HTTP {}: {}", raw.status, raw.preview()),
            Err(e) => *detail = format!("{verb} {path}: {e}"),
        }
    }
    None
}

async fn post_then_put(client: &PlatformClient, path: &str, payload: &Value) -> StepResult {
    let mut last = StepResult {
        success: false,
        path: path.to_owned(),
        method: None,
        status: None,
        detail: Value::Null,
    };
    for verb in [Verb::Post, Verb::Put] {
        match send(client, verb, path, payload).await {
            Ok(raw) => {
                last.method = Some(verb.to_string());
                last.status = Some(raw.status);
                last.detail = response_json(&raw);
                if raw.is_success() {
                    last.success = true;
                    return last;
                }
            }
            Err(e) => {
                last.method = Some(verb.to_string());
                last.status = None;
                last.detail = Value::String(e.to_string());
            }
        }
    }
    last
}
