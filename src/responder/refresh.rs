//! Scheduled refresh of the horoscope cache.

use chrono::{DateTime, Local, TimeZone};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::responder::database::Database;
use crate::responder::horoscope::Sign;
use crate::responder::horoscope_api::HoroscopeClient;

/// Next time `expr` fires after `after`.
pub fn next_refresh<Tz: TimeZone>(expr: &str, after: &DateTime<Tz>) -> Result<DateTime<Tz>, String> {
    let schedule = Schedule::from_str(expr).map_err(|e| format!("Invalid cron: {}", e))?;
    schedule
        .after(after)
        .next()
        .ok_or_else(|| "No future occurrence for cron".to_string())
}

/// Fetch every sign and store the results. Returns how many were updated.
pub async fn refresh_all(db: &Database, client: &HoroscopeClient) -> usize {
    let mut updated = 0;
    for sign in Sign::ALL {
        let data = match client.fetch(sign).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to get new horoscope for {sign}, database not updated: {e}");
                continue;
            }
        };
        match db.upsert_horoscope(&data) {
            Ok(()) => updated += 1,
            Err(e) => warn!("Failed to store horoscope for {sign}: {e}"),
        }
    }
    info!("Updated {updated}/{} horoscopes", Sign::ALL.len());
    updated
}

/// Spawn the refresh loop. The first refresh happens at the schedule's next
/// occurrence, not immediately.
pub fn spawn(db: Arc<Database>, client: Arc<HoroscopeClient>, expr: &str) -> Result<JoinHandle<()>, String> {
    let expr = expr.to_string();
    // Validate up front so a bad expression fails at startup.
    next_refresh(&expr, &Local::now())?;

    Ok(tokio::spawn(async move {
        loop {
            let now = Local::now();
            let next = match next_refresh(&expr, &now) {
                Ok(next) => next,
                Err(e) => {
                    warn!("Horoscope refresh stopped: {e}");
                    return;
                }
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!("Next horoscope refresh at {}", next.format("%Y-%m-%d %H:%M"));
            tokio::time::sleep(wait).await;

            info!("Attempting to fetch new horoscopes...");
            refresh_all(&db, &client).await;
        }
    }))
}
