use anyhow::{Context, Result};

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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
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

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// (abbreviation, city, longitude, latitude) anchors to scatter institutions around.
const ANCHORS: [(&str, &str, f64, f64); 12] = [
    ("CA", "Los Angeles", -118.24, 34.05),
    ("TX", "Austin", -97.74, 30.27),
    ("NY", "Albany", -73.76, 42.65),
    ("IL", "Chicago", -87.63, 41.88),
    ("GA", "Atlanta", -84.39, 33.75),
    ("WA", "Seattle", -122.33, 47.61),
    ("CO", "Denver", -104.99, 39.74),
    ("MA", "Boston", -71.06, 42.36),
    ("DC", "Washington", -77.04, 38.91),
    ("AK", "Anchorage", -149.90, 61.22),
    ("PR", "San Juan", -66.11, 18.47),
    ("GU", "Hagatna", 144.75, 13.48),
];

const KINDS: [&str; 4] = ["University", "Community College", "Institute of Technology", "Beauty Academy"];

/// Blank or privacy-suppressed some of the time, as the real extracts are.
fn maybe(rng: &mut SimpleRng, value: String, missing: f64) -> String {
    if rng.chance(missing) {
        if rng.chance(0.5) {
            String::new()
        } else {
            "PrivacySuppressed".to_string()
        }
    } else {
        value
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let output_path = "sample_colleges.csv";

    let mut writer = csv::Writer::from_path(output_path).context("creating output file")?;
    writer.write_record([
        "INSTNM",
        "STABBR",
        "LONGITUDE",
        "LATITUDE",
        "UG",
        "UGDS",
        "COSTT4_A",
        "COSTT4_P",
        "MN_EARN_WNE_P10",
        "UNEMP_RATE",
    ])?;

    let mut rows = 0;
    for (abbr, city, lon, lat) in ANCHORS {
        for (k, kind) in KINDS.iter().enumerate() {
            for n in 0..5 {
                let name = format!("{city} {kind} {}", n + 1);
                let longitude = format!("{:.6}", lon + rng.range(-2.0, 2.0));
                let latitude = if rng.chance(0.03) {
                    String::new()
                } else {
                    format!("{:.6}", lat + rng.range(-1.5, 1.5))
                };

                // Population shrinks with institution kind; the UG/UGDS and
                // COSTT4_A/COSTT4_P pairs split the way the two schemas do.
                let population = (rng.range(200.0, 25_000.0) / (k as f64 + 1.0)) as u64;
                let (ug, ugds) = if rng.chance(0.5) {
                    (population.to_string(), String::new())
                } else {
                    (String::new(), population.to_string())
                };
                let cost = format!("{:.1}", rng.range(6_000.0, 70_000.0));
                let (cost_a, cost_p) = if k == 3 {
                    (String::new(), cost)
                } else {
                    (cost, String::new())
                };
                let earnings = format!("{:.0}", rng.range(18_000.0, 95_000.0));
                let unemployment = format!("{:.1}", rng.range(1.0, 12.0));

                let earnings = maybe(&mut rng, earnings, 0.15);
                let unemployment = maybe(&mut rng, unemployment, 0.2);

                writer.write_record([
                    name.as_str(),
                    abbr,
                    longitude.as_str(),
                    latitude.as_str(),
                    ug.as_str(),
                    ugds.as_str(),
                    cost_a.as_str(),
                    cost_p.as_str(),
                    earnings.as_str(),
                    unemployment.as_str(),
                ])?;
                rows += 1;
            }
        }
    }

    writer.flush().context("writing output file")?;
    println!("Wrote {rows} institutions to {output_path}");
    Ok(())
}
