//! Writes a demo CSV exercising every column category: integers, floats with
//! gaps, booleans, a low-cardinality label, free text and ISO dates.
//!
//! Usage: `generate_sample [OUTPUT] [ROWS]` (defaults: `sample_data.csv`, 200).

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
const PRODUCTS: [&str; 6] = ["widget", "gadget", "gizmo", "doohickey", "sprocket", "flange"];
const ADJECTIVES: [&str; 5] = ["late", "urgent", "bulk", "returned", "repeat"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output = args.next().unwrap_or_else(|| "sample_data.csv".to_string());
    let rows: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid row count '{n}'"))?,
        None => 200,
    };

    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid start date")?;

    let mut writer = csv::Writer::from_path(&output).with_context(|| format!("creating {output}"))?;
    writer.write_record([
        "order_id", "region", "units", "unit_price", "discounted", "order_date", "notes",
    ])?;

    for i in 0..rows {
        let region = REGIONS[rng.below(REGIONS.len())];
        let units = 1 + rng.below(50);
        // roughly one price in twenty is missing
        let price = if rng.next_f64() < 0.05 {
            String::new()
        } else {
            format!("{:.2}", rng.gauss(25.0, 6.0).max(0.5))
        };
        let discounted = rng.next_f64() < 0.3;
        let date = start + Duration::days(rng.below(365) as i64);
        let notes = format!(
            "{} {} order #{}",
            ADJECTIVES[rng.below(ADJECTIVES.len())],
            PRODUCTS[rng.below(PRODUCTS.len())],
            1000 + i
        );

        writer.write_record([
            (i + 1).to_string(),
            region.to_string(),
            units.to_string(),
            price,
            discounted.to_string(),
            date.format("%Y-%m-%d").to_string(),
            notes,
        ])?;
    }
    writer.flush().with_context(|| format!("writing {output}"))?;

    log::info!("Wrote {rows} rows to {output}");
    println!("Wrote {rows} rows to {output}");
    Ok(())
}
