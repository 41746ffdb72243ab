use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Rejected credentials or tokens by reason.
    pub static ref AUTH_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "auth_failures_total",
        "Authentication failures segmented by reason",
        &["reason"]
    )
    .expect("failed to register auth_failures_total");

    /// Authenticated requests refused by the permission checks.
    pub static ref AUTHORIZATION_DENIALS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "authorization_denials_total",
        "Authorization denials segmented by resource and action",
        &["resource", "action"]
    )
    .expect("failed to register authorization_denials_total");
}

pub fn record_auth_failure(reason: &str) {
    AUTH_FAILURES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn record_authorization_denial(resource: &str, action: &str) {
    AUTHORIZATION_DENIALS_TOTAL
        .with_label_values(&[resource, action])
        .inc();
}
