//! Plain-text rendering for terminal output.

use chrono::{DateTime, Utc};
use models::audit_log::AuditLog;
use models::dashboard::DashboardStats;
use models::payment::Payment;
use models::reference::short_id;
use models::ride::Ride;
use models::settings::FareSettings;
use models::user::AdminUser;
use models::{CollectionPage, Identity};
use service::live_map::LiveMapState;

const MAX_CELL: usize = 40;

fn truncate(text: &str) -> String {
    if text.chars().count() > MAX_CELL {
        let cut: String = text.chars().take(MAX_CELL - 3).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

fn date(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".into())
}

fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".into()
    } else {
        value.to_string()
    }
}

fn money(amount: Option<f64>) -> String {
    amount.map(|a| format!("{a:.0}")).unwrap_or_else(|| "-".into())
}

fn line(cells: &[&str], widths: &[usize]) -> String {
    let padded: Vec<String> = cells.iter().zip(widths).map(|(c, w)| format!("{c:<w$}", w = *w)).collect();
    padded.join("  ").trim_end().to_string()
}

/// Left-aligned columns sized to their widest cell.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    let mut out = String::new();
    out.push_str(&line(headers, &widths));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&line(&cells, &widths));
        out.push('\n');
    }
    out
}

fn paged<R>(page: &CollectionPage<R>, what: &str, headers: &[&str], row: impl Fn(&R) -> Vec<String>) -> String {
    if page.rows.is_empty() {
        return format!("No {what} found.\n");
    }
    let rows: Vec<Vec<String>> = page.rows.iter().map(row).collect();
    let mut out = table(headers, &rows);
    out.push_str(&footer(page));
    out
}

fn footer<R>(page: &CollectionPage<R>) -> String {
    let mut hints = Vec::new();
    if page.has_previous() {
        hints.push(format!("previous: --page {}", page.current_page - 1));
    }
    if page.has_next() {
        hints.push(format!("next: --page {}", page.current_page + 1));
    }
    let summary = format!("Page {} of {}", page.current_page, page.total_pages.max(1));
    if hints.is_empty() {
        format!("{summary}\n")
    } else {
        format!("{summary} ({})\n", hints.join(", "))
    }
}

pub fn users(page: &CollectionPage<AdminUser>) -> String {
    paged(page, "users", &["ID", "NAME", "EMAIL", "ROLE", "STATUS", "APPROVAL", "JOINED"], |u| {
        vec![
            short_id(&u.id),
            truncate(&u.full_name),
            truncate(&u.email),
            u.role.clone(),
            if u.is_suspended() { "suspended" } else { "active" }.to_string(),
            u.approval().unwrap_or("-").to_string(),
            date(u.created_at),
        ]
    })
}

pub fn rides(page: &CollectionPage<Ride>) -> String {
    paged(page, "rides", &["ID", "PASSENGER", "RIDER", "STATUS", "FARE", "DATE"], |r| {
        vec![
            short_id(&r.id),
            r.passenger().map(|p| truncate(&p.full_name)).unwrap_or_else(|| "-".into()),
            r.rider().map(|p| truncate(&p.full_name)).unwrap_or_else(|| "unassigned".into()),
            r.status_label(),
            money(r.estimated_fare),
            date(r.created_at),
        ]
    })
}

pub fn payments(page: &CollectionPage<Payment>) -> String {
    paged(page, "payments", &["REFERENCE", "RIDE", "PROVIDER", "AMOUNT", "STATUS", "DATE"], |p| {
        vec![
            p.transaction_reference.clone().unwrap_or_else(|| short_id(&p.id)),
            p.ride_id().map(short_id).unwrap_or_else(|| "-".into()),
            or_dash(&p.provider),
            money(p.amount),
            or_dash(&p.status),
            date(p.created_at),
        ]
    })
}

pub fn logs(page: &CollectionPage<AuditLog>) -> String {
    paged(page, "logs", &["DATE", "TYPE", "TITLE", "USER", "MESSAGE"], |l| {
        vec![
            date(l.created_at),
            or_dash(&l.kind),
            truncate(&l.title),
            l.subject().map(truncate).unwrap_or_else(|| "-".into()),
            truncate(&l.message),
        ]
    })
}

pub fn user_detail(u: &AdminUser) -> String {
    let rows = vec![
        vec!["id".to_string(), u.id.clone()],
        vec!["name".into(), or_dash(&u.full_name)],
        vec!["email".into(), or_dash(&u.email)],
        vec!["phone".into(), or_dash(&u.phone)],
        vec!["role".into(), or_dash(&u.role)],
        vec!["suspended".into(), u.is_suspended().to_string()],
        vec!["approval".into(), u.approval().unwrap_or("-").to_string()],
        vec!["joined".into(), date(u.created_at)],
    ];
    table(&["FIELD", "VALUE"], &rows)
}

pub fn identity(user: &Identity) -> String {
    format!("{} <{}> role={} id={}\n", or_dash(&user.full_name), user.email, user.role, user.id)
}

pub fn dashboard(stats: &DashboardStats) -> String {
    let rows = vec![
        vec!["Total users".to_string(), stats.total_users().to_string()],
        vec!["Passengers".into(), stats.users.total_passengers.to_string()],
        vec!["Riders".into(), stats.users.total_riders.to_string()],
        vec!["Active riders".into(), stats.users.active_riders.to_string()],
        vec!["Rides today".into(), stats.rides.today.to_string()],
        vec!["Rides total".into(), stats.rides.total.to_string()],
        vec!["Earnings".into(), format!("{:.0}", stats.earnings.total)],
        vec!["Admin revenue".into(), format!("{:.0}", stats.earnings.admin_revenue)],
    ];
    table(&["METRIC", "VALUE"], &rows)
}

pub fn settings(s: &FareSettings) -> String {
    let rows = vec![
        vec!["base_fare".to_string(), format!("{} {}", s.base_fare, s.currency)],
        vec!["per_km_rate".into(), format!("{} {}", s.per_km_rate, s.currency)],
        vec!["service_fee_percent".into(), format!("{}%", s.service_fee_percent)],
        vec!["cancellation_fee".into(), format!("{} {}", s.cancellation_fee, s.currency)],
        vec!["currency".into(), s.currency.clone()],
    ];
    table(&["SETTING", "VALUE"], &rows)
}

/// One block per refresh: a summary line, the markers, and the last error if any.
pub fn live_map(state: &LiveMapState) -> String {
    let updated = state
        .updated_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".into());
    let mut out = match &state.snapshot {
        Some(map) => {
            let mut out = format!(
                "[{updated}] {} riders online, {} active rides\n",
                map.riders.len(),
                map.active_rides.len()
            );
            for marker in map.markers() {
                match marker {
                    models::live_map::Marker::AvailableRider { name, lat, lng, .. } => {
                        out.push_str(&format!("  rider  {:<24} {lat:.5},{lng:.5}\n", truncate(&name)));
                    }
                    models::live_map::Marker::ActiveRide { id, lat, lng } => {
                        out.push_str(&format!("  ride   {:<24} {lat:.5},{lng:.5}\n", short_id(&id)));
                    }
                }
            }
            out
        }
        None => format!("[{updated}] no data yet\n"),
    };
    if let Some(err) = &state.last_error {
        out.push_str(&format!("  last refresh failed: {err}\n"));
    }
    out
}
