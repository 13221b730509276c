//! Remote command surface over kernel selection.
//!
//! Every single-selection role exposes two methods:
//!
//! | Method              | Kind    | Effect                                   |
//! |---------------------|---------|------------------------------------------|
//! | `select<Role>`      | command | `Kernel::select(role, name)`; completes  |
//! |                     |         | once `is_selected(role, name)` holds     |
//! | `using<Role>`       | query   | `Kernel::is_selected(role, name)`        |
//!
//! Requests and responses are serde types, so any transport can carry them.
//! [`dispatch_json`] is the JSON-line entry point.

use crate::error::{TransportError, TransportResult};
use cascade_common::role::RoleKind;
use cascade_kernel::data_object::KernelTypes;
use cascade_kernel::extension::Extension;
use cascade_kernel::kernel::Kernel;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Whether a method changes kernel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    /// Mutates the kernel; carries a completion condition.
    Command,
    /// Read-only.
    Query,
}

/// Introspection record of one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MethodInfo {
    pub name: &'static str,
    pub kind: MethodKind,
    pub role: RoleKind,
    pub description: &'static str,
    pub arg_name: &'static str,
    pub arg_description: &'static str,
}

macro_rules! role_methods {
    ($role:ident, $select:literal, $using:literal, $noun:literal) => {
        [
            MethodInfo {
                name: $select,
                kind: MethodKind::Command,
                role: RoleKind::$role,
                description: concat!("Select a ", stringify!($role), " component"),
                arg_name: "Name",
                arg_description: concat!("The name of the ", stringify!($role)),
            },
            MethodInfo {
                name: $using,
                kind: MethodKind::Query,
                role: RoleKind::$role,
                description: concat!("Check if this ", $noun, " is used"),
                arg_name: "Name",
                arg_description: concat!("The name of the ", stringify!($role)),
            },
        ]
    };
}

const SENSOR: [MethodInfo; 2] = role_methods!(Sensor, "selectSensor", "usingSensor", "sensor");
const ESTIMATOR: [MethodInfo; 2] =
    role_methods!(Estimator, "selectEstimator", "usingEstimator", "estimator");
const GENERATOR: [MethodInfo; 2] =
    role_methods!(Generator, "selectGenerator", "usingGenerator", "generator");
const CONTROLLER: [MethodInfo; 2] =
    role_methods!(Controller, "selectController", "usingController", "controller");
const EFFECTOR: [MethodInfo; 2] =
    role_methods!(Effector, "selectEffector", "usingEffector", "effector");

/// All methods, commands first within each role, roles in cascade order.
pub const METHODS: [MethodInfo; 10] = [
    SENSOR[0],
    SENSOR[1],
    ESTIMATOR[0],
    ESTIMATOR[1],
    GENERATOR[0],
    GENERATOR[1],
    CONTROLLER[0],
    CONTROLLER[1],
    EFFECTOR[0],
    EFFECTOR[1],
];

pub fn find_method(name: &str) -> Option<&'static MethodInfo> {
    METHODS.iter().find(|m| m.name == name)
}

pub fn commands() -> impl Iterator<Item = &'static MethodInfo> {
    METHODS.iter().filter(|m| m.kind == MethodKind::Command)
}

pub fn queries() -> impl Iterator<Item = &'static MethodInfo> {
    METHODS.iter().filter(|m| m.kind == MethodKind::Query)
}

// ─── Requests ───────────────────────────────────────────────────────

/// Invocation of a method with its single `Name` argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub name: String,
}

impl Request {
    pub fn new(method: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            name: name.into(),
        }
    }
}

/// Outcome of a dispatched request.
///
/// For commands `accepted` reports whether the kernel accepted the call and
/// `done` whether its completion condition holds. For queries both carry
/// the query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub method: String,
    pub accepted: bool,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run `request` against `kernel`.
///
/// Kernel-level refusals (not loaded, not running, startup refused) come
/// back as a non-accepted [`Response`]; only an unknown method is an `Err`.
pub fn dispatch<K, E>(kernel: &mut Kernel<K, E>, request: &Request) -> TransportResult<Response>
where
    K: KernelTypes,
    E: Extension<K>,
{
    let method = find_method(&request.method)
        .ok_or_else(|| TransportError::UnknownMethod(request.method.clone()))?;

    let response = match method.kind {
        MethodKind::Command => match kernel.select(method.role, &request.name) {
            Ok(()) => Response {
                method: request.method.clone(),
                accepted: true,
                done: kernel.is_selected(method.role, &request.name),
                error: None,
            },
            Err(e) => {
                warn!(
                    method = method.name,
                    name = %request.name,
                    error = %e,
                    "remote command refused"
                );
                Response {
                    method: request.method.clone(),
                    accepted: false,
                    done: kernel.is_selected(method.role, &request.name),
                    error: Some(e.to_string()),
                }
            }
        },
        MethodKind::Query => {
            let used = kernel.is_selected(method.role, &request.name);
            Response {
                method: request.method.clone(),
                accepted: used,
                done: used,
                error: None,
            }
        }
    };
    debug!(method = method.name, name = %request.name, accepted = response.accepted, "dispatched");
    Ok(response)
}

/// Decode a JSON request, dispatch it and encode the response.
pub fn dispatch_json<K, E>(kernel: &mut Kernel<K, E>, line: &str) -> TransportResult<String>
where
    K: KernelTypes,
    E: Extension<K>,
{
    let request: Request = serde_json::from_str(line)?;
    let response = dispatch(kernel, &request)?;
    Ok(serde_json::to_string(&response)?)
}

/// The method table as JSON, for clients that discover methods at runtime.
pub fn describe_json() -> TransportResult<String> {
    Ok(serde_json::to_string(&METHODS)?)
}
