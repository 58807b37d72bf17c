//! Alert message formatting.

use crate::alert::{Alert, Severity};
use crate::monitor::types::{AlertKind, Observation, Target, Verdict};

fn severity_for(kind: AlertKind) -> Severity {
    match kind {
        AlertKind::Down => Severity::Down,
        AlertKind::Slow => Severity::Slow,
    }
}

fn alert_color(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Down => "#dc3545",
        AlertKind::Slow => "#ffc107",
    }
}

/// Plain-text summary line of a failing probe.
pub fn failure_text(target: &Target, kind: AlertKind, verdict: &Verdict, obs: &Observation) -> String {
    format!(
        "{} | {} | reason={} status={} latency={}ms",
        target.url,
        kind,
        verdict.reason,
        obs.status_label(),
        obs.latency_label()
    )
}

/// Alert for a DOWN or SLOW verdict.
pub fn failure_alert(target: &Target, kind: AlertKind, verdict: &Verdict, obs: &Observation) -> Alert {
    let icon = kind.icon();
    let text = failure_text(target, kind, verdict, obs);
    let html = format!(
        "<h3>{icon} {url} - {kind}</h3>\
         <p style=\"color: {color}; font-weight: bold;\">Your website is not accessible!</p>\
         <p><strong>URL:</strong> {url}<br/>\
         <strong>Issue:</strong> {reason}<br/>\
         <strong>Status Code:</strong> {status}<br/>\
         <strong>Response Time:</strong> {latency} ms</p>\
         <p><em>Please check your website and resolve the issue.</em></p>",
        icon = icon,
        url = target.url,
        kind = kind,
        color = alert_color(kind),
        reason = verdict.reason,
        status = obs.status_label(),
        latency = obs.latency_label(),
    );

    Alert {
        target_url: target.url.clone(),
        severity: severity_for(kind),
        subject: format!("{} [{}] {} - {}", icon, kind, target.url, verdict.reason),
        chat: format!("{} {}", icon, text),
        text,
        html,
    }
}

/// Recovery signalled while the verdict itself is still failing.
pub fn interim_recovery_alert(target: &Target, kind: AlertKind, verdict: &Verdict, obs: &Observation) -> Alert {
    let text = format!("{} | RECOVERED", failure_text(target, kind, verdict, obs));
    Alert {
        target_url: target.url.clone(),
        severity: Severity::Recovered,
        subject: format!("[RECOVERED] {}", target.url),
        html: "<p>Recovered</p>".to_string(),
        chat: text.clone(),
        text,
    }
}

/// Alert for a target back to OK after `recovered` was active.
pub fn recovery_alert(target: &Target, recovered: AlertKind, obs: &Observation) -> Alert {
    let status = obs.status_label();
    let latency = obs.latency_label();
    let text = format!(
        "{} | RECOVERED from {} | status={} latency={}ms",
        target.url, recovered, status, latency
    );
    let html = format!(
        "<h3>✅ {} - RECOVERED</h3><p>Your website is now accessible!</p>\
         <p>Previous status: {}<br/>Current status: {}<br/>Response time: {} ms</p>",
        target.url, recovered, status, latency
    );

    Alert {
        target_url: target.url.clone(),
        severity: Severity::Recovered,
        subject: format!("✅ [RECOVERED] {} - Your website is back online", target.url),
        chat: format!("🟢 {}", text),
        text,
        html,
    }
}
