//! Demo data set for a fresh local warehouse
//!
//! Deterministic: the same seed always produces the same CDRs, so demo
//! dashboards look the same on every machine.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::{CdrRecord, Country, Warehouse};

const DEMO_SEED: u64 = 0x5eed_cd25;

/// 2023-10-10T00:00:00Z
const DEMO_EPOCH_SECS: i64 = 1_696_896_000;

const VOICE_CALLS: usize = 2_000;
const BACKGROUND_SMS: usize = 600;

fn demo_countries() -> Vec<Country> {
    vec![
        Country::new("Cuba", "53", 6),
        Country::new("Somalia", "252", 6),
        Country::new("Latvia", "371", 5),
        Country::new("Sierra Leone", "232", 5),
        Country::new("Tunisia", "216", 4),
        Country::new("Guinea", "224", 4),
        Country::new("Italy", "39", 1),
        Country::new("France", "33", 1),
        Country::new("Spain", "34", 2),
        Country::new("Brazil", "55", 3),
        Country::new("India", "91", 3),
    ]
}

/// Seed the demo data set unless CDRs already exist. Returns the number of
/// records inserted.
pub async fn seed_demo(warehouse: &Warehouse) -> Result<u64> {
    let existing = warehouse.cdr_count().await?;
    if existing > 0 {
        info!("Skipping demo seed, warehouse already holds {} CDRs", existing);
        return Ok(0);
    }

    let countries = demo_countries();
    warehouse.insert_countries(&countries).await?;

    let records = demo_records(&countries);
    let inserted = warehouse.insert_cdrs(&records).await?;
    info!("Seeded {} demo CDRs across {} countries", inserted, countries.len());
    Ok(inserted)
}

fn demo_records(countries: &[Country]) -> Vec<CdrRecord> {
    let mut rng = StdRng::seed_from_u64(DEMO_SEED);
    let epoch = DateTime::from_timestamp(DEMO_EPOCH_SECS, 0).unwrap_or_default();
    let risky: Vec<&Country> = countries.iter().filter(|c| c.risk_score >= 4).collect();
    let safe: Vec<&Country> = countries.iter().filter(|c| c.risk_score <= 3).collect();
    let mut records = Vec::with_capacity(VOICE_CALLS + BACKGROUND_SMS + 1_000);

    // Outgoing voice: a small pool of premium numbers per country takes most calls
    for _ in 0..VOICE_CALLS {
        let country = if rng.gen_bool(0.6) {
            risky[rng.gen_range(0..risky.len())]
        } else {
            safe[rng.gen_range(0..safe.len())]
        };
        let bnum = format!("{}{:06}", country.dial_code, rng.gen_range(0..40u32).pow(2));
        let rate = if rng.gen_bool(0.9) {
            (rng.gen_range(10..500) as f64) / 100.0
        } else {
            0.0
        };
        let direction = if rng.gen_bool(0.85) { "Outgoing" } else { "Incoming" };
        records.push(
            CdrRecord::voice(&bnum, country)
                .with_direction(direction)
                .with_billing(rate, rng.gen_range(1_000..600_000))
                .with_parties(subscriber(&mut rng), timestamp(&mut rng, epoch)),
        );
    }

    // SMS floods from a few senders in low-risk countries
    for (index, country) in safe.iter().enumerate().take(3) {
        let bnum = format!("{}7{:06}", country.dial_code, 100 + index);
        let volume = rng.gen_range(100..320);
        for _ in 0..volume {
            records.push(
                CdrRecord::sms(&bnum, country)
                    .with_parties(subscriber(&mut rng), timestamp(&mut rng, epoch)),
            );
        }
    }

    // Background SMS, spread thin enough to stay under the spam threshold
    for _ in 0..BACKGROUND_SMS {
        let country = &countries[rng.gen_range(0..countries.len())];
        let bnum = format!("{}6{:06}", country.dial_code, rng.gen_range(0..5_000u32));
        records.push(
            CdrRecord::sms(&bnum, country)
                .with_parties(subscriber(&mut rng), timestamp(&mut rng, epoch)),
        );
    }

    records
}

fn subscriber(rng: &mut StdRng) -> String {
    format!("3934{:07}", rng.gen_range(0..10_000_000u32))
}

fn timestamp(rng: &mut StdRng, epoch: DateTime<Utc>) -> String {
    (epoch + Duration::seconds(rng.gen_range(0..7 * 24 * 3600))).to_rfc3339()
}
